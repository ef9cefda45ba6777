use crate::app::{run_stage, Stage};
use crate::config::toml_config::AppConfig;
use crate::utils::logger;
use crate::utils::validation::Validate;
use clap::{Args, Parser, Subcommand};

/// Flags shared by every entry point.
#[derive(Debug, Clone, Args)]
pub struct CommonArgs {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "config.toml", global = true)]
    pub config: String,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log CPU and memory usage after every phase
    #[arg(long, global = true)]
    pub monitor: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Show the resolved configuration and stage plan without running anything
    #[arg(long, global = true)]
    pub dry_run: bool,
}

#[derive(Debug, Parser)]
#[command(name = "statcast-career")]
#[command(about = "Predict career outcomes from early-career Statcast data")]
pub struct Cli {
    #[command(flatten)]
    pub common: CommonArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, Subcommand)]
pub enum Command {
    /// Find qualifying players, their Nth-PA dates, and download their pitches
    Download,
    /// Calculate early-career features
    Pipeline,
    /// Train the career-outcome model
    Train,
    /// Run download, pipeline and train in order
    All,
    /// Summarize downloaded Statcast files
    Summary,
}

impl From<Command> for Stage {
    fn from(command: Command) -> Self {
        match command {
            Command::Download => Stage::Download,
            Command::Pipeline => Stage::Features,
            Command::Train => Stage::Train,
            Command::All => Stage::All,
            Command::Summary => Stage::Summary,
        }
    }
}

/// Single-stage binaries take only the common flags.
#[derive(Debug, Parser)]
pub struct StageCli {
    #[command(flatten)]
    pub common: CommonArgs,
}

/// Loads configuration, runs `stage` and returns the process exit code.
pub async fn execute(stage: Stage, args: &CommonArgs) -> i32 {
    let config = match AppConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            return 1;
        }
    };

    if args.json_logs {
        logger::init_json_logger(args.verbose, config.log_level());
    } else {
        logger::init_cli_logger(args.verbose, config.log_level());
    }
    tracing::info!("🚀 {} v{}: {:?}", config.project.name, config.project.version, stage);
    tracing::info!("📁 Configuration loaded from: {}", args.config);

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        return 1;
    }

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No actual processing will occur");
        display_dry_run(stage, &config);
        return 0;
    }

    let monitor_enabled = args.monitor || config.monitoring_enabled();
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    match run_stage(stage, &config, monitor_enabled).await {
        Ok(output_path) => {
            tracing::info!("✅ {:?} completed successfully!", stage);
            println!("✅ {:?} completed successfully!", stage);
            println!("📁 Output: {}", output_path);
            0
        }
        Err(e) => {
            tracing::error!(
                "❌ {:?} failed: {} (Category: {:?}, Severity: {:?})",
                stage,
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());
            e.exit_code()
        }
    }
}

fn display_dry_run(stage: Stage, config: &AppConfig) {
    let collection = &config.collection;
    println!("📋 Configuration Summary:");
    println!("  Project: {} v{}", config.project.name, config.project.version);
    println!("  Data directory: {}", config.data_dir().display());
    println!(
        "  Debut years: {}-{} (leaderboard from {})",
        collection.debut_year_start,
        collection.debut_year_end,
        collection.leaderboard_start_year()
    );
    println!("  Early career: first {} PA", collection.n_pa);
    println!("  Minimum career PA: {}", collection.min_career_pa);
    println!("  Data end date: {}", collection.data_end_date);
    println!("  Game types: {}", collection.game_types.join(", "));
    println!("  Download game types: {}", collection.fetch_game_types.join(", "));
    if let Some(max) = collection.max_players {
        println!("  Max players: {}", max);
    }
    println!(
        "  Model: target {}, alpha {}, test fraction {}, {} features",
        config.model.target.as_str(),
        config.model.alpha,
        config.model.test_fraction,
        config.model.feature_names().len()
    );
    println!();
    println!("🛠️ Stage plan:");
    for (i, step) in stage.plan().iter().enumerate() {
        println!("  {}. {}", i + 1, step);
    }
    println!();
    println!("✅ Dry run complete. Use --verbose for more details during actual run.");
}
