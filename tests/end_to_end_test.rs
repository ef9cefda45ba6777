use httpmock::prelude::*;
use statcast_career::config::toml_config::layout;
use statcast_career::domain::model::{FetchLogEntry, TimelineEntry};
use statcast_career::model::CareerModel;
use statcast_career::{run_stage, AppConfig, Stage};
use std::path::Path;
use tempfile::TempDir;

const SAVANT_HEADER: &str = "pitch_type,game_date,release_speed,batter,player_name,events,description,zone,stand,game_type,bb_type,hc_x,game_pk,launch_speed,launch_angle,estimated_woba_using_speedangle,woba_value,woba_denom,launch_speed_angle,at_bat_number,pitch_number,inning";

/// One two-pitch PA per day from 2018-04-01, newest first like the live export,
/// plus a spring-training game that must be ignored.
fn savant_csv(batter: u32, name: &str, days: u32, power: f64) -> String {
    let mut lines = vec![SAVANT_HEADER.to_string()];
    for day in (0..days).rev() {
        let date = chrono::NaiveDate::from_ymd_opt(2018, 4, 1).unwrap() + chrono::Duration::days(day as i64);
        let (event, bb_type, speed, xwoba) = match day % 4 {
            0 => ("home_run", "fly_ball", 100.0 + power, "1.6"),
            1 => ("strikeout", "", 0.0, ""),
            2 => ("single", "line_drive", 92.0 + power, "0.7"),
            _ => ("field_out", "ground_ball", 80.0 + power, "0.1"),
        };
        let speed_field = if bb_type.is_empty() { String::new() } else { speed.to_string() };
        let description = if bb_type.is_empty() { "swinging_strike" } else { "hit_into_play" };
        lines.push(format!(
            "FF,{date},95.1,{batter},\"{name}\",{event},{description},5,R,R,{bb_type},120.5,{pk},{speed_field},15,{xwoba},,,,1,2,1",
            pk = 500000 + day
        ));
        lines.push(format!(
            "FF,{date},94.0,{batter},\"{name}\",,ball,12,R,R,,,{pk},,,,,,,1,1,1",
            pk = 500000 + day
        ));
    }
    lines.push(format!(
        "FF,2018-03-01,90.0,{batter},\"{name}\",single,hit_into_play,5,R,S,line_drive,120.0,400000,95,10,0.8,,,,1,1,1"
    ));
    lines.join("\n")
}

fn write_config(dir: &Path, server: &MockServer) -> AppConfig {
    let toml = format!(
        r#"
[project]
name = "e2e"
version = "0.0.1"

[collection]
n_pa = 8
min_career_pa = 1000
debut_year_start = 2018
debut_year_end = 2018
data_end_date = "2018-12-31"
timeline_delay_ms = 0
fetch_delay_ms = 0

[sources]
savant_endpoint = "{savant}"
fangraphs_endpoint = "{fangraphs}"
register_endpoint = "{register}"
timeout_seconds = 5
retry_attempts = 1
retry_delay_seconds = 0

[paths]
data_dir = "{data_dir}"

[model]
target = "career_war"
alpha = 1.0
test_fraction = 0.0
features = ["AVG", "OPS", "K%", "EV"]
"#,
        savant = server.url("/statcast_search/csv"),
        fangraphs = server.url("/api/leaders"),
        register = server.url("/register/people.csv"),
        data_dir = dir.join("data").display(),
    );
    let path = dir.join("config.toml");
    std::fs::write(&path, toml).unwrap();
    AppConfig::from_file(&path).unwrap()
}

#[tokio::test]
async fn test_download_pipeline_and_train_end_to_end() {
    let temp_dir = TempDir::new().unwrap();
    let server = MockServer::start();

    let leaderboard = server.mock(|when, then| {
        when.method(GET).path("/api/leaders").query_param("season1", "2015");
        then.status(200).json_body(serde_json::json!({
            "data": [
                {"PlayerName": "Ava Power", "playerid": 1, "Season": 2018, "PA": 600, "WAR": 4.0},
                {"PlayerName": "Ava Power", "playerid": 1, "Season": 2019, "PA": 650, "WAR": 5.5},
                {"PlayerName": "Ben Contact", "playerid": 2, "Season": 2018, "PA": 1100, "WAR": 2.0},
                {"PlayerName": "Cal Short", "playerid": 3, "Season": 2018, "PA": 1050, "WAR": 0.5},
                {"PlayerName": "Dee Veteran", "playerid": 4, "Season": 2015, "PA": 3000, "WAR": 12.0},
                {"PlayerName": "Eli Bench", "playerid": 5, "Season": 2018, "PA": 200, "WAR": 0.1}
            ]
        }));
    });

    let register = server.mock(|when, then| {
        when.method(GET).path("/register/people.csv");
        then.status(200).body(
            "key_mlbam,key_fangraphs,name_last,name_first\n\
             101,1,Power,Ava\n102,2,Contact,Ben\n103,3,Short,Cal\n104,4,Veteran,Dee\n",
        );
    });

    let savant_mocks: Vec<_> = [(101, "Power, Ava", 12, 8.0), (102, "Contact, Ben", 10, 0.0), (103, "Short, Cal", 5, -4.0)]
        .into_iter()
        .map(|(id, name, days, power)| {
            let body = savant_csv(id, name, days, power);
            server.mock(move |when, then| {
                when.method(GET)
                    .path("/statcast_search/csv")
                    .query_param("batters_lookup[]", id.to_string());
                then.status(200).body(body);
            })
        })
        .collect();

    let config = write_config(temp_dir.path(), &server);
    let data_dir = temp_dir.path().join("data");

    run_stage(Stage::Download, &config, false).await.unwrap();

    leaderboard.assert();
    register.assert();
    let timeline: Vec<TimelineEntry> = csv::Reader::from_path(data_dir.join(layout::PLAYER_TIMELINE))
        .unwrap()
        .deserialize()
        .map(|r| r.unwrap())
        .collect();
    assert_eq!(timeline.len(), 3);
    let ava = timeline.iter().find(|t| t.player_id == 101).unwrap();
    assert!(ava.success);
    assert_eq!(ava.debut_date, chrono::NaiveDate::from_ymd_opt(2018, 4, 1));
    assert_eq!(ava.date_reached, chrono::NaiveDate::from_ymd_opt(2018, 4, 8));
    let cal = timeline.iter().find(|t| t.player_id == 103).unwrap();
    assert!(!cal.success);
    assert_eq!(cal.error.as_deref(), Some("Only reached 5 PAs in regular season"));

    // 時間軸一次、下載一次；未達門檻的球員不下載
    savant_mocks[0].assert_hits(2);
    savant_mocks[1].assert_hits(2);
    savant_mocks[2].assert_hits(1);

    let fetch_log: Vec<FetchLogEntry> = csv::Reader::from_path(data_dir.join(layout::FETCH_LOG))
        .unwrap()
        .deserialize()
        .map(|r| r.unwrap())
        .collect();
    assert_eq!(fetch_log.len(), 2);
    assert!(fetch_log.iter().all(|l| l.success));
    // 八個打席、每個兩球
    assert_eq!(fetch_log[0].num_pitches, Some(16));
    assert!(data_dir.join(layout::player_statcast(101)).exists());
    assert!(!data_dir.join(layout::player_statcast(103)).exists());

    run_stage(Stage::Features, &config, false).await.unwrap();
    let stats = std::fs::read_to_string(data_dir.join(layout::EARLY_CAREER_STATS)).unwrap();
    assert_eq!(stats.lines().count(), 3);
    assert!(stats.lines().next().unwrap().ends_with("Pull%,Cent%,Oppo%"));

    let model_path = run_stage(Stage::Train, &config, false).await.unwrap();
    assert!(model_path.ends_with("career_model.json"));
    let model: CareerModel =
        serde_json::from_slice(&std::fs::read(data_dir.join(layout::MODEL)).unwrap()).unwrap();
    assert_eq!(model.target, "career_war");
    assert_eq!(model.feature_names, vec!["AVG", "OPS", "K%", "EV"]);
    assert!(model.test_metrics.is_none());
    assert!(data_dir.join(layout::PREDICTIONS).exists());

    // 重跑下載時已存在的檔案不再請求
    run_stage(Stage::Download, &config, false).await.unwrap();
    savant_mocks[0].assert_hits(3);
}

#[tokio::test]
async fn test_pipeline_before_download_reports_missing_timeline() {
    let temp_dir = TempDir::new().unwrap();
    let server = MockServer::start();
    let config = write_config(temp_dir.path(), &server);

    let err = run_stage(Stage::Features, &config, false).await.unwrap_err();

    assert_eq!(err.exit_code(), 1);
    assert!(err.to_string().contains("player_timeline.csv"));
}

#[tokio::test]
async fn test_summary_of_empty_data_dir() {
    let temp_dir = TempDir::new().unwrap();
    let server = MockServer::start();
    let config = write_config(temp_dir.path(), &server);

    assert!(run_stage(Stage::Summary, &config, false).await.is_ok());
}
