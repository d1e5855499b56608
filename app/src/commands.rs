//! Stage commands
//!
//! Each command builds the workflow from configuration, runs its stage(s)
//! and prints the resulting report as JSON.

use std::path::Path;
use std::sync::Arc;

use amm::{Contracts, StageEvent, Workflow, WorkflowParams};
use anyhow::Context;
use ledger_client::{ConfirmationPolicy, RpcLedger, TxOrchestrator};
use lpflow_core::{AppConfig, Error};
use serde::Serialize;
use tokio::sync::mpsc;

/// Resolve configuration: an explicit file, else `lpflow.json` when present,
/// else defaults. The URL override wins over both.
pub fn load_config(path: Option<&Path>, url: Option<String>) -> anyhow::Result<AppConfig> {
    let mut config = match path {
        Some(path) => AppConfig::load(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => {
            let default = Path::new(crate::DEFAULT_CONFIG);
            if default.exists() {
                AppConfig::load(default)?
            } else {
                tracing::info!("No {} found, using defaults", crate::DEFAULT_CONFIG);
                AppConfig::default()
            }
        }
    };
    if let Some(url) = url {
        config.ledger.url = url;
    }
    Ok(config)
}

/// Connect to the ledger and assemble the workflow.
pub async fn connect(
    config: &AppConfig,
    events: mpsc::UnboundedSender<StageEvent>,
) -> anyhow::Result<Workflow<RpcLedger>> {
    let params = WorkflowParams::from_config(&config.workflow)?;
    let contracts = Contracts::load(config)?;

    let key_env = &config.ledger.key_env;
    let signing_key = std::env::var(key_env)
        .map_err(|_| Error::Config(format!("{} is not set", key_env)))?;
    let ledger = RpcLedger::connect(&config.ledger, &signing_key)
        .await
        .map_err(Error::from)?;

    let orchestrator = TxOrchestrator::new(
        Arc::new(ledger),
        ConfirmationPolicy::from(&config.confirmation),
    );
    tracing::info!(
        slippage = %params.slippage,
        deposit_side = %params.deposit_side,
        "Workflow ready"
    );
    Ok(Workflow::new(orchestrator, contracts, params).with_events(events))
}

fn print_report<T: Serialize>(report: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(report).map_err(|e| Error::Serialization(e.to_string()))?;
    println!("{}", json);
    Ok(())
}

pub async fn provision(workflow: &mut Workflow<RpcLedger>) -> anyhow::Result<()> {
    let report = workflow.provision().await?;
    print_report(&report)
}

pub async fn settle(workflow: &mut Workflow<RpcLedger>) -> anyhow::Result<()> {
    let report = workflow.settle().await?;
    print_report(&report)
}

pub async fn trade(workflow: &mut Workflow<RpcLedger>) -> anyhow::Result<()> {
    let report = workflow.trade().await?;
    print_report(&report)
}

pub async fn run(workflow: &mut Workflow<RpcLedger>) -> anyhow::Result<()> {
    let report = workflow.run().await?;
    print_report(&report)
}
