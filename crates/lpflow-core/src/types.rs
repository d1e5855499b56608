//! Core type definitions for lpflow

use std::fmt;

use alloy::primitives::utils::{format_units, parse_units};
use alloy::primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::ProtocolError;

/// Raw token quantity in the token's smallest unit.
///
/// Pool reserves are `uint112` on chain, so `u128` holds every reserve and
/// every realistic balance. Intermediate products are widened by the callers.
pub type Amount = u128;

/// Basis points in one whole (100%).
pub const BPS_DENOMINATOR: i32 = 10_000;

/// Slippage tolerance in basis points (100 bps = 1%).
///
/// Negative values are accepted and tighten the bound above the quoted
/// amount. Anything above 100% would produce a negative minimum and is
/// rejected at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Slippage {
    bps: i32,
}

impl Slippage {
    pub const ZERO: Slippage = Slippage { bps: 0 };

    pub fn from_bps(bps: i32) -> Result<Self, ProtocolError> {
        if bps > BPS_DENOMINATOR {
            return Err(ProtocolError::SlippageOutOfRange { bps });
        }
        Ok(Self { bps })
    }

    /// Whole-percent tolerance, e.g. `from_percent(1)` for 1%.
    pub fn from_percent(percent: i32) -> Result<Self, ProtocolError> {
        let bps = percent
            .checked_mul(100)
            .ok_or(ProtocolError::SlippageOutOfRange { bps: i32::MAX })?;
        Self::from_bps(bps)
    }

    pub fn bps(&self) -> i32 {
        self.bps
    }

    /// Multiplier numerator over [`BPS_DENOMINATOR`], always non-negative.
    pub fn retained_bps(&self) -> u64 {
        (i64::from(BPS_DENOMINATOR) - i64::from(self.bps)) as u64
    }
}

impl Default for Slippage {
    fn default() -> Self {
        Self { bps: 100 }
    }
}

impl fmt::Display for Slippage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.bps < 0 { "-" } else { "" };
        let abs = self.bps.unsigned_abs();
        write!(f, "{}{}.{:02}%", sign, abs / 100, abs % 100)
    }
}

/// Which side of a deposit is held fixed when the pool already has a price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DepositSide {
    /// Keep asset A at its desired amount and derive B.
    A,
    /// Keep asset B at its desired amount and derive A.
    B,
    /// Fix A first, fall back to fixing B when the derived B exceeds its desired amount.
    #[default]
    Auto,
}

impl DepositSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::A => "a",
            Self::B => "b",
            Self::Auto => "auto",
        }
    }
}

impl fmt::Display for DepositSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Parse a human-readable token amount ("12.5") into raw units.
pub fn parse_token_amount(value: &str, decimals: u8) -> Result<Amount, ProtocolError> {
    let trimmed = value.trim();
    if trimmed.starts_with('-') {
        return Err(ProtocolError::InvalidAmount {
            message: format!("negative amount: {}", value),
        });
    }

    let parsed = parse_units(trimmed, decimals).map_err(|e| ProtocolError::InvalidAmount {
        message: format!("{}: {}", value, e),
    })?;

    to_amount(parsed.get_absolute())
}

/// Render raw units with the token's decimals, falling back to the raw integer.
pub fn format_token_amount(amount: Amount, decimals: u8) -> String {
    format_units(U256::from(amount), decimals).unwrap_or_else(|_| amount.to_string())
}

/// Narrow an on-chain `uint256` into an [`Amount`].
pub fn to_amount(value: U256) -> Result<Amount, ProtocolError> {
    u128::try_from(value).map_err(|_| ProtocolError::AmountOverflow {
        value: value.to_string(),
    })
}

/// Canonical pair ordering: the numerically smaller address comes first.
pub fn canonical_order(a: Address, b: Address) -> (Address, Address) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Constants
pub mod constants {
    use super::Amount;

    /// Shares permanently locked by the pair on the first mint.
    pub const MINIMUM_LIQUIDITY: Amount = 1_000;

    /// Default swap fee numerator (0.3% fee).
    pub const DEFAULT_FEE_NUM: u32 = 997;

    /// Default swap fee denominator.
    pub const DEFAULT_FEE_DENOM: u32 = 1_000;

    /// Decimals used by the reference tokens.
    pub const DEFAULT_DECIMALS: u8 = 18;
}
