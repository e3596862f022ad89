//! Docker-to-etcd service-discovery bridge.
//!
//! Watches the local Docker event stream and projects each running
//! container's identity, network placement, and exposed ports into etcd,
//! keeping every key alive with a periodically-refreshed TTL lease.

use anyhow::Result;
use clap::Parser;
use tracing::error;

mod cmd;

#[derive(Parser)]
#[command(name = "stellar-registrator")]
#[command(about = "Docker container service-discovery bridge for etcd")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<cmd::Commands>,

    /// Enable debug logging (equivalent to REGISTRATOR_DEBUG=1).
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.debug || std::env::var("REGISTRATOR_DEBUG").is_ok() {
        "debug"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("stellar_registrator={log_level}").into()),
        )
        .init();

    match cli.command {
        Some(cmd::Commands::Diagnostics) => cmd::diagnostics::run().await,
        None => {
            if let Err(e) = cmd::run::run().await {
                error!(error = %e, "registrator bridge failed");
                std::process::exit(1);
            }
            Ok(())
        }
    }
}
