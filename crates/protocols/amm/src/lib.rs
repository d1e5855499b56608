//! Constant-product AMM orchestration
//!
//! This crate quotes and sequences the calls that provision a two-asset pool,
//! deposit liquidity into it, swap through it and withdraw from it, with every
//! call bounded by a slippage tolerance computed from live reserves.

pub mod allowance;
pub mod calculator;
pub mod contracts;
pub mod oracle;
pub mod state;
pub mod workflow;

// Re-exports
pub use allowance::{ensure_allowance, AllowanceOutcome};
pub use calculator::{
    apply_slippage, calculate_output, calculate_price_impact, expected_shares, plan_deposit,
    quote_deposit, quote_swap, quote_withdrawal,
};
pub use contracts::{Erc20, Factory, Pair, Reserves, Router};
pub use oracle::{get_pool, ordering_of, OrientedReserves, PoolSnapshot};
pub use state::{
    Balances, DepositBasis, DepositQuote, LiquidityPosition, SwapQuote, TradeIntent,
    WithdrawalQuote,
};
pub use workflow::{
    Contracts, ProvisionReport, RunReport, SettlementReport, Stage, StageEvent, SwapReport,
    TradeReport, Workflow, WorkflowParams, WorkflowState, WithdrawalReport,
};
