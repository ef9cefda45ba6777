use statcast_career::config::cli::{execute, CommonArgs};
use statcast_career::Stage;
use std::io::Write;
use tempfile::NamedTempFile;

fn args(config: &str, dry_run: bool) -> CommonArgs {
    CommonArgs {
        config: config.to_string(),
        verbose: false,
        monitor: false,
        json_logs: false,
        dry_run,
    }
}

fn config_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_dry_run_succeeds_without_network() {
    let file = config_file(
        r#"
[collection]
n_pa = 250
max_players = 5

[paths]
data_dir = "./never-created"
"#,
    );

    let code = tokio_test::block_on(execute(Stage::All, &args(file.path().to_str().unwrap(), true)));

    assert_eq!(code, 0);
    assert!(!std::path::Path::new("./never-created").exists());
}

#[test]
fn test_invalid_config_exits_with_one() {
    let file = config_file(
        r#"
[collection]
n_pa = 2000
min_career_pa = 1000
"#,
    );

    let code = tokio_test::block_on(execute(Stage::Download, &args(file.path().to_str().unwrap(), true)));

    assert_eq!(code, 1);
}

#[test]
fn test_unparseable_config_exits_with_one() {
    let file = config_file("[collection\nn_pa = ");

    let code = tokio_test::block_on(execute(Stage::Train, &args(file.path().to_str().unwrap(), false)));

    assert_eq!(code, 1);
}

#[tokio::test]
async fn test_training_without_features_exits_with_data_error() {
    let data_dir = tempfile::TempDir::new().unwrap();
    let file = config_file(&format!(
        "[paths]\ndata_dir = \"{}\"\n",
        data_dir.path().display()
    ));

    let code = execute(Stage::Train, &args(file.path().to_str().unwrap(), false)).await;

    assert_eq!(code, 1);
}
