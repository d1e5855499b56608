//! lpflow command-line application library

pub mod commands;
pub mod watcher;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use lpflow_core::Error;
use tokio::sync::mpsc;
use tracing_subscriber::filter::Directive;

pub const DEFAULT_CONFIG: &str = "lpflow.json";

/// Default log levels; every crate of the workspace logs at debug
const LOG_DIRECTIVES: &[&str] = &["lpflow=debug", "amm=debug", "ledger_client=debug", "info"];

#[derive(Parser)]
#[command(name = "lpflow")]
#[command(about = "Provision, fund, trade and withdraw from a constant-product pool", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Configuration file (defaults to lpflow.json when present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// RPC URL (overrides the configuration)
    #[arg(short, long, env = "LPFLOW_RPC_URL")]
    pub url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// Find or create the pool for the configured asset pair
    Provision,
    /// Approve both assets and deposit liquidity
    Settle,
    /// Swap, then withdraw the whole position
    Trade,
    /// Every stage in order
    Run,
}

/// Install the tracing subscriber
pub fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::from_default_env();
    let filter = LOG_DIRECTIVES
        .iter()
        .filter_map(|directive| directive.parse::<Directive>().ok())
        .fold(filter, |filter, directive| filter.add_directive(directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn execute(cli: Cli) -> anyhow::Result<()> {
    let config = commands::load_config(cli.config.as_deref(), cli.url)?;

    let (events, receiver) = mpsc::unbounded_channel();
    let watcher = watcher::spawn(receiver);

    let result = async {
        let mut workflow = commands::connect(&config, events).await?;
        match cli.command {
            Command::Provision => commands::provision(&mut workflow).await,
            Command::Settle => commands::settle(&mut workflow).await,
            Command::Trade => commands::trade(&mut workflow).await,
            Command::Run => commands::run(&mut workflow).await,
        }
    }
    .await;

    // The workflow (and with it the last sender) is gone; flush pending notifications.
    let _ = watcher.await;
    result
}

/// Run the CLI and map the outcome to a process exit code
pub async fn run(cli: Cli) -> ExitCode {
    tracing::info!(command = ?cli.command, "Starting lpflow");

    match execute(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let classified = err.downcast_ref::<Error>();
            let code = classified.map(Error::exit_code).unwrap_or(1);
            eprintln!("error: {:#}", err);
            if classified.is_some_and(Error::is_slippage_guard) {
                eprintln!("hint: the pool moved past the quoted bounds; re-run the stage to quote from fresh state");
            }
            tracing::error!(
                code = classified.map(Error::error_code).unwrap_or("startup"),
                exit_code = code,
                "lpflow failed"
            );
            ExitCode::from(code)
        }
    }
}
