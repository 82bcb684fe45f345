#![warn(clippy::all, clippy::pedantic)]

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use wallet_inputs_cli::commands::Command;
use wallet_inputs_cli::config::CliConfig;

/// Command-line entrypoint for wallet input selection.
#[derive(Parser, Debug)]
#[command(
    name = "wallet-inputs-cli",
    version,
    about = "Select transfer inputs and check node sync"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
    /// Node command API endpoint
    #[arg(long = "node-url", global = true, env = "WALLET_INPUTS_NODE_URL")]
    node_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    logging_init();

    let parsed = Cli::parse();

    let mut config = CliConfig::from_env()?;
    if let Some(node_url) = parsed.node_url {
        config.node_url = node_url;
    }
    config.validate()?;

    parsed.command.handle(&config).await
}

fn logging_init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .init();
}
