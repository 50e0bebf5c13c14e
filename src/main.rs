use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use asmoun::cli::{run_command, Cli};
use asmoun::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // An unreadable config is reported by the command itself; logging still
    // needs a level.
    let log_level = match &cli.log_level {
        Some(level) => level.clone(),
        None => Config::load(&cli.config)
            .map(|config| config.logging.level)
            .unwrap_or_else(|_| "info".to_string()),
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::debug!("Starting asmoun v{}", env!("CARGO_PKG_VERSION"));

    run_command(&cli).await
}
