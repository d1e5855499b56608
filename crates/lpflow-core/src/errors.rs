//! Error types for lpflow

use alloy::primitives::{Address, TxHash};
use thiserror::Error;

/// Revert reasons emitted by the router's slippage guards.
const SLIPPAGE_GUARD_REASONS: &[&str] = &[
    "INSUFFICIENT_OUTPUT_AMOUNT",
    "INSUFFICIENT_A_AMOUNT",
    "INSUFFICIENT_B_AMOUNT",
];

/// Core errors that can occur in lpflow
#[derive(Debug, Error)]
pub enum Error {
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] TxError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Remote ledger connection and query errors
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Ledger unreachable at {url}")]
    Unreachable { url: String },

    #[error("Ledger returned error: {message}")]
    ApiError { message: String },

    #[error("{operation} timed out after {secs}s")]
    Timeout { operation: String, secs: u64 },

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("{contract} has no function {function}")]
    UnknownFunction { contract: String, function: String },

    #[error("Invalid arguments for {function}: {message}")]
    InvalidArguments { function: String, message: String },

    #[error("Call rejected: {reason}")]
    Rejected { reason: String },
}

/// Errors raised while submitting and confirming a state-changing call
#[derive(Debug, Error)]
pub enum TxError {
    #[error("{function} rejected before submission: {reason}")]
    Rejected { function: String, reason: String },

    #[error("{function} ({tx_hash}) reverted: {}", reason.as_deref().unwrap_or("no reason given"))]
    Reverted {
        function: String,
        tx_hash: TxHash,
        reason: Option<String>,
    },

    #[error("Confirmation of {tx_hash} timed out after {waited_secs}s")]
    ConfirmationTimeout { tx_hash: TxHash, waited_secs: u64 },

    #[error("Lost track of {tx_hash}: {source}")]
    Tracking {
        tx_hash: TxHash,
        #[source]
        source: LedgerError,
    },
}

/// Protocol-level (quoting and workflow) errors
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Invalid amount: {message}")]
    InvalidAmount { message: String },

    #[error("Slippage tolerance of {bps} bps is out of range")]
    SlippageOutOfRange { bps: i32 },

    #[error("Amount {value} does not fit in 128 bits")]
    AmountOverflow { value: String },

    #[error("No position to withdraw: share balance {balance}, total supply {total_supply}")]
    EmptyPosition { balance: u128, total_supply: u128 },

    #[error("No pool exists for {token_a} / {token_b}")]
    PoolNotFound { token_a: Address, token_b: Address },

    #[error("Pool {pair} does not hold {token}")]
    OrderingMismatch { pair: Address, token: Address },

    #[error("Event {event} not found in receipt of {tx_hash}")]
    EventNotFound { event: String, tx_hash: TxHash },

    #[error("Minimum output {min_output} exceeds the pool's constant-product output {pool_output}")]
    QuoteExceedsPool { min_output: u128, pool_output: u128 },

    #[error("Quote unavailable: {reason}")]
    QuoteUnavailable { reason: String },

    #[error("{stage} verification failed: {message}")]
    VerificationFailed { stage: String, message: String },
}

/// Result type alias for lpflow operations
pub type Result<T> = std::result::Result<T, Error>;

impl TxError {
    /// True when the remote contract refused the call because live reserves
    /// moved past the quoted minimum.
    pub fn is_slippage_guard(&self) -> bool {
        let reason = match self {
            Self::Rejected { reason, .. } => Some(reason.as_str()),
            Self::Reverted { reason, .. } => reason.as_deref(),
            _ => None,
        };
        reason.is_some_and(|r| SLIPPAGE_GUARD_REASONS.iter().any(|guard| r.contains(guard)))
    }

    pub fn tx_hash(&self) -> Option<TxHash> {
        match self {
            Self::Rejected { .. } => None,
            Self::Reverted { tx_hash, .. }
            | Self::ConfirmationTimeout { tx_hash, .. }
            | Self::Tracking { tx_hash, .. } => Some(*tx_hash),
        }
    }

    /// A slippage-guard refusal at gas estimation is the same failure as a
    /// mined revert and is classified with it.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Rejected { .. } if self.is_slippage_guard() => "reverted",
            Self::Rejected { .. } => "rejected",
            Self::Reverted { .. } => "reverted",
            Self::ConfirmationTimeout { .. } => "confirmation_timeout",
            Self::Tracking { .. } => "tracking_failed",
        }
    }
}

impl LedgerError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Unreachable { .. } => "ledger_unreachable",
            Self::ApiError { .. } => "ledger_api_error",
            Self::Timeout { .. } => "ledger_timeout",
            Self::ParseError(_) => "ledger_parse_error",
            Self::UnknownFunction { .. } => "unknown_function",
            Self::InvalidArguments { .. } => "invalid_arguments",
            Self::Rejected { .. } => "ledger_rejected",
        }
    }
}

impl ProtocolError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidAmount { .. } => "invalid_amount",
            Self::SlippageOutOfRange { .. } => "slippage_out_of_range",
            Self::AmountOverflow { .. } => "amount_overflow",
            Self::EmptyPosition { .. } => "empty_position",
            Self::PoolNotFound { .. } => "pool_not_found",
            Self::OrderingMismatch { .. } => "ordering_mismatch",
            Self::EventNotFound { .. } => "event_not_found",
            Self::QuoteExceedsPool { .. } => "quote_exceeds_pool",
            Self::QuoteUnavailable { .. } => "quote_unavailable",
            Self::VerificationFailed { .. } => "verification_failed",
        }
    }
}

impl Error {
    /// Stable machine-readable classification
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Ledger(e) => e.error_code(),
            Self::Protocol(e) => e.error_code(),
            Self::Transaction(e) => e.error_code(),
            Self::Config(_) => "config",
            Self::Serialization(_) => "serialization",
        }
    }

    /// Process exit code for the invoking environment
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) | Self::Serialization(_) => 2,
            Self::Ledger(_) => 3,
            Self::Transaction(e @ TxError::Rejected { .. }) if e.is_slippage_guard() => 5,
            Self::Transaction(TxError::Rejected { .. }) => 4,
            Self::Transaction(TxError::Reverted { .. }) => 5,
            Self::Transaction(TxError::ConfirmationTimeout { .. } | TxError::Tracking { .. }) => 6,
            Self::Protocol(ProtocolError::EventNotFound { .. }) => 7,
            Self::Protocol(_) => 8,
        }
    }

    /// True when re-running the stage with fresh quotes is the expected recovery.
    pub fn is_slippage_guard(&self) -> bool {
        match self {
            Self::Transaction(e) => e.is_slippage_guard(),
            Self::Protocol(ProtocolError::QuoteExceedsPool { .. }) => true,
            _ => false,
        }
    }
}
