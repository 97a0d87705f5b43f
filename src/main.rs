use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use mdp::app;
use mdp::cli::Cli;

/// Log filter variable, e.g. `MDP_LOG=mdp=debug`.
const LOG_ENV: &str = "MDP_LOG";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    app::run(cli).await
}
