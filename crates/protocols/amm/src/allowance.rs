//! Allowance Manager
//!
//! Makes sure a spender may move `required` of an asset before a call that
//! transfers it. Approvals go through the orchestrator like every other
//! state-changing call, so they are confirmed before this returns.

use alloy::primitives::{Address, TxHash};
use ledger_client::{Ledger, TxOrchestrator};
use lpflow_core::{Amount, ProtocolError, Result};
use serde::Serialize;

use crate::contracts::Erc20;

/// What `ensure_allowance` had to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AllowanceOutcome {
    /// Current allowance already covers the requirement
    Sufficient { current: Amount },
    /// An approval was submitted and confirmed
    Approved {
        previous: Amount,
        approved: Amount,
        tx_hash: TxHash,
    },
}

impl AllowanceOutcome {
    pub fn submitted(&self) -> bool {
        matches!(self, Self::Approved { .. })
    }
}

/// Ensure `spender` can transfer at least `required` of `token` from `owner`.
///
/// When the allowance falls short, approves `max(ceiling, required)` and
/// re-reads the allowance to confirm the approval took effect. The read and the
/// approval are not atomic; the workflow is the only spender of this pair.
pub async fn ensure_allowance<L: Ledger>(
    orchestrator: &TxOrchestrator<L>,
    token: &Erc20,
    owner: Address,
    spender: Address,
    required: Amount,
    ceiling: Amount,
) -> Result<AllowanceOutcome> {
    let ledger = orchestrator.ledger().as_ref();
    let current = token.allowance(ledger, owner, spender).await?;

    if current >= required {
        tracing::debug!(
            token = token.name(),
            spender = %spender,
            current,
            required,
            "Allowance sufficient"
        );
        return Ok(AllowanceOutcome::Sufficient { current });
    }

    let approved = ceiling.max(required);
    tracing::info!(
        token = token.name(),
        spender = %spender,
        current,
        required,
        approved,
        "Approving"
    );

    let receipt = orchestrator
        .submit_and_confirm(&token.approve_call(spender, approved))
        .await?;

    let after = token.allowance(ledger, owner, spender).await?;
    if after < required {
        return Err(ProtocolError::VerificationFailed {
            stage: format!("approve {}", token.name()),
            message: format!("allowance is {} after approving {}", after, approved),
        }
        .into());
    }

    Ok(AllowanceOutcome::Approved {
        previous: current,
        approved,
        tx_hash: receipt.tx_hash,
    })
}
