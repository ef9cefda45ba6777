use clap::Parser;
use statcast_career::config::cli::{execute, StageCli};
use statcast_career::Stage;

#[tokio::main]
async fn main() {
    let cli = StageCli::parse();
    std::process::exit(execute(Stage::Features, &cli.common).await);
}
