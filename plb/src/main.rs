//! PLB — Proxmox cluster rebalancer
//!
//! Computes and (unless `--dry-run`) executes VM migrations that bring a
//! Proxmox cluster back within its configured balanciness tolerance.

mod client_http;
mod config;
mod daemon;
mod logging;
mod output;

use anyhow::Result;
use clap::Parser;
use config::PlbConfig;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long)]
    config: PathBuf,

    /// Compute and print the plan; do not migrate
    #[arg(long)]
    dry_run: bool,

    /// Additionally emit the plan as a JSON object keyed by VM name
    #[arg(long)]
    json: bool,

    /// Run a single cycle and exit, overriding `[service] daemon`
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match PlbConfig::load(&cli.config) {
        Ok(config) => config,
        Err(err) => {
            output::print_error(&format!("fatal: {err}"));
            return ExitCode::from(2);
        }
    };

    logging::init(&config.service.log_verbosity);

    match run(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "fatal error");
            output::print_error(&format!("fatal: {err}"));
            ExitCode::from(2)
        }
    }
}

async fn run(cli: Cli, config: PlbConfig) -> Result<()> {
    let client = client_http::ProxmoxClient::new(&config.proxmox)?;

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal_cancel.cancel();
        }
    });

    daemon::run(client, config, cli.dry_run, cli.json, cli.once, cancel).await?;
    Ok(())
}
