use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn build_filter(verbose: bool, log_level: Option<&str>) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| match (verbose, log_level) {
        (true, _) => EnvFilter::new("statcast_career=debug,info"),
        (false, Some(level)) => EnvFilter::new(format!("statcast_career={},warn", level)),
        (false, None) => EnvFilter::new("statcast_career=info,warn"),
    })
}

pub fn init_cli_logger(verbose: bool, log_level: Option<&str>) {
    let _ = tracing_subscriber::registry()
        .with(build_filter(verbose, log_level))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .try_init();
}

/// JSON 格式，便於批次執行時收集日誌
pub fn init_json_logger(verbose: bool, log_level: Option<&str>) {
    let _ = tracing_subscriber::registry()
        .with(build_filter(verbose, log_level))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .json(),
        )
        .try_init();
}
