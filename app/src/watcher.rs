//! Stage watcher
//!
//! Consumes the workflow's stage signals and turns them into notifications:
//! one JSON line per signal on stdout, plus a log line. The workflow never
//! prints; this is its only presentation layer.

use std::time::{SystemTime, UNIX_EPOCH};

use amm::{AllowanceOutcome, StageEvent};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

#[derive(Serialize, Clone)]
pub struct StageNotification {
    /// "started" | "quoted" | "allowance" | "confirmed" | "state" | "completed" | "failed"
    pub kind: &'static str,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_id: Option<String>,
    pub timestamp: u64,
    pub event: StageEvent,
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn describe(event: &StageEvent) -> (&'static str, String, Option<String>) {
    match event {
        StageEvent::StageStarted { stage } => ("started", format!("{:?} started", stage), None),
        StageEvent::IntentComputed { stage, .. } => {
            ("quoted", format!("{:?} quote computed", stage), None)
        }
        StageEvent::AllowanceChecked { token, outcome, .. } => match outcome {
            AllowanceOutcome::Sufficient { .. } => {
                ("allowance", format!("{} allowance sufficient", token), None)
            }
            AllowanceOutcome::Approved { tx_hash, .. } => (
                "allowance",
                format!("{} approved", token),
                Some(tx_hash.to_string()),
            ),
        },
        StageEvent::CallConfirmed {
            call,
            tx_hash,
            block_number,
            ..
        } => (
            "confirmed",
            format!("{} confirmed in block {}", call, block_number),
            Some(tx_hash.to_string()),
        ),
        StageEvent::StateChanged { from, to } => {
            ("state", format!("{:?} -> {:?}", from, to), None)
        }
        StageEvent::StageCompleted { stage, state } => (
            "completed",
            format!("{:?} completed, workflow at {:?}", stage, state),
            None,
        ),
        StageEvent::StageFailed {
            stage,
            code,
            message,
            rerun,
        } => {
            let hint = if *rerun {
                "; re-run the stage to quote from fresh pool state"
            } else {
                ""
            };
            (
                "failed",
                format!("{:?} failed ({}): {}{}", stage, code, message, hint),
                None,
            )
        }
    }
}

/// Drain `events` until every sender is dropped.
pub fn spawn(mut events: mpsc::UnboundedReceiver<StageEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            let (kind, description, tx_id) = describe(&event);
            tracing::debug!(kind, "{}", description);

            let notification = StageNotification {
                kind,
                description,
                tx_id,
                timestamp: now_secs(),
                event,
            };
            match serde_json::to_string(&notification) {
                Ok(line) => println!("{}", line),
                Err(e) => tracing::warn!("Failed to serialize notification: {}", e),
            }
        }
    })
}
