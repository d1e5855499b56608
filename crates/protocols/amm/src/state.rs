//! AMM State Types
//!
//! Quotes, positions, and the trade intents derived from them.

use alloy::primitives::Address;
use lpflow_core::{Amount, Slippage};
use serde::Serialize;

/// How a deposit's amounts were derived
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DepositBasis {
    /// Empty pool: the depositor sets the initial price
    InitialPrice,
    /// Asset A held at its desired amount, B derived from reserves
    FixedA,
    /// Asset B held at its desired amount, A derived from reserves
    FixedB,
}

/// Bounded deposit of both pool assets
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DepositQuote {
    pub amount_a: Amount,
    pub amount_b: Amount,
    pub min_a: Amount,
    pub min_b: Amount,
    pub basis: DepositBasis,
    /// Shares the pair should mint for these amounts
    pub expected_shares: Amount,
    pub slippage: Slippage,
}

/// Exact-input swap along a router path
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SwapQuote {
    pub amount_in: Amount,
    pub path: Vec<Address>,
    /// Router-predicted amounts per hop, starting with `amount_in`
    pub hop_amounts: Vec<Amount>,
    pub expected_out: Amount,
    pub min_out: Amount,
    pub slippage: Slippage,
    /// Percent, when a direct reserve snapshot was available
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_impact: Option<f64>,
}

/// Proportional withdrawal of a liquidity position
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WithdrawalQuote {
    pub shares: Amount,
    pub total_supply: Amount,
    pub expected_a: Amount,
    pub expected_b: Amount,
    pub min_a: Amount,
    pub min_b: Amount,
    pub slippage: Slippage,
}

/// Quote computed immediately before the call that depends on it.
///
/// Never reused across stages: a re-run recomputes it from fresh state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TradeIntent {
    Deposit(DepositQuote),
    Swap(SwapQuote),
    Withdrawal(WithdrawalQuote),
}

/// Caller's pool-share balance at a point in time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LiquidityPosition {
    pub shares: Amount,
    pub total_supply: Amount,
}

impl LiquidityPosition {
    pub fn is_empty(&self) -> bool {
        self.shares == 0 || self.total_supply == 0
    }

    /// Share of the pool in percent, for display
    pub fn pool_share(&self) -> f64 {
        if self.total_supply == 0 {
            return 0.0;
        }
        (self.shares as f64 / self.total_supply as f64) * 100.0
    }
}

/// Owner balances read around a state-changing call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Balances {
    pub token_a: Amount,
    pub token_b: Amount,
    pub shares: Amount,
}
