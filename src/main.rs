use clap::Parser;
use statcast_career::config::cli::{execute, Cli};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let exit_code = execute(cli.command.into(), &cli.common).await;
    std::process::exit(exit_code);
}
