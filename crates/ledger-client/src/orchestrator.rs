//! Transaction orchestration
//!
//! Submits one state-changing call at a time and blocks until it is included
//! to the configured depth. The signing identity's nonce is only ever touched
//! here, under a lock held for the whole submit-and-confirm cycle, so calls
//! leave in program order and never share an ordinal.

use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::TxHash;
use lpflow_core::{ConfirmationConfig, LedgerError, TxError};
use tokio::sync::Mutex;

use crate::{ContractCall, Ledger, Receipt};

/// How deep and how long to wait for each call
#[derive(Debug, Clone, Copy)]
pub struct ConfirmationPolicy {
    /// Minimum 1 (the inclusion block itself)
    pub confirmations: u64,
    pub poll_interval: Duration,
    pub timeout: Duration,
}

impl Default for ConfirmationPolicy {
    fn default() -> Self {
        Self::from(&ConfirmationConfig::default())
    }
}

impl From<&ConfirmationConfig> for ConfirmationPolicy {
    fn from(config: &ConfirmationConfig) -> Self {
        Self {
            confirmations: config.confirmations.max(1),
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

pub struct TxOrchestrator<L> {
    ledger: Arc<L>,
    policy: ConfirmationPolicy,
    next_nonce: Mutex<Option<u64>>,
}

impl<L: Ledger> TxOrchestrator<L> {
    pub fn new(ledger: Arc<L>, policy: ConfirmationPolicy) -> Self {
        Self {
            ledger,
            policy,
            next_nonce: Mutex::new(None),
        }
    }

    pub fn ledger(&self) -> &Arc<L> {
        &self.ledger
    }

    pub fn policy(&self) -> &ConfirmationPolicy {
        &self.policy
    }

    /// Submit `call` exactly once and wait for its confirmation.
    pub async fn submit_and_confirm(&self, call: &ContractCall) -> Result<Receipt, TxError> {
        let mut nonce_slot = self.next_nonce.lock().await;

        let nonce = match *nonce_slot {
            Some(nonce) => nonce,
            None => self
                .ledger
                .next_nonce()
                .await
                .map_err(|e| rejected(call, e))?,
        };

        let tx_hash = match self.ledger.submit(call, nonce).await {
            Ok(hash) => hash,
            Err(e) => {
                // The ordinal may or may not have been consumed; re-read it next time.
                *nonce_slot = None;
                tracing::warn!(call = %call, nonce, "Submission rejected: {}", e);
                return Err(rejected(call, e));
            }
        };
        *nonce_slot = Some(nonce + 1);

        tracing::info!(call = %call, nonce, tx_hash = %tx_hash, "Submitted, awaiting confirmation");

        let receipt = self.await_confirmation(tx_hash).await?;

        if !receipt.success {
            let reason = self.ledger.revert_reason(call, receipt.block_number).await;
            tracing::warn!(
                call = %call,
                tx_hash = %tx_hash,
                block = receipt.block_number,
                reason = reason.as_deref().unwrap_or("-"),
                "Call reverted"
            );
            return Err(TxError::Reverted {
                function: call.to_string(),
                tx_hash,
                reason,
            });
        }

        tracing::info!(call = %call, tx_hash = %tx_hash, block = receipt.block_number, "Confirmed");
        Ok(receipt)
    }

    async fn await_confirmation(&self, tx_hash: TxHash) -> Result<Receipt, TxError> {
        let wait = async {
            loop {
                match self.ledger.receipt(tx_hash).await {
                    Ok(Some(receipt)) => {
                        let head = self
                            .ledger
                            .block_number()
                            .await
                            .map_err(|source| TxError::Tracking { tx_hash, source })?;
                        let depth = head.saturating_sub(receipt.block_number) + 1;
                        if depth >= self.policy.confirmations {
                            return Ok(receipt);
                        }
                        tracing::debug!(
                            tx_hash = %tx_hash,
                            depth,
                            required = self.policy.confirmations,
                            "Included, waiting for depth"
                        );
                    }
                    Ok(None) => {
                        tracing::debug!(tx_hash = %tx_hash, "Pending");
                    }
                    Err(LedgerError::Timeout { operation, secs }) => {
                        tracing::warn!(tx_hash = %tx_hash, "{} timed out after {}s, polling again", operation, secs);
                    }
                    Err(source) => return Err(TxError::Tracking { tx_hash, source }),
                }
                tokio::time::sleep(self.policy.poll_interval).await;
            }
        };

        tokio::time::timeout(self.policy.timeout, wait)
            .await
            .map_err(|_| TxError::ConfirmationTimeout {
                tx_hash,
                waited_secs: self.policy.timeout.as_secs(),
            })?
    }
}

fn rejected(call: &ContractCall, err: LedgerError) -> TxError {
    let reason = match err {
        LedgerError::Rejected { reason } => reason,
        other => other.to_string(),
    };
    TxError::Rejected {
        function: call.to_string(),
        reason,
    }
}
