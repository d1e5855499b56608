//! Reserve Oracle
//!
//! Reads a pool's reserves, asset ordering and share supply, and orients the
//! reserves to the caller's (A, B) frame.

use alloy::primitives::Address;
use ledger_client::Ledger;
use lpflow_core::{canonical_order, Amount, ProtocolError, Result};
use serde::Serialize;

use crate::contracts::Pair;

/// One consistent-enough read of a pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PoolSnapshot {
    pub pair: Address,
    pub token0: Address,
    pub token1: Address,
    pub reserve0: Amount,
    pub reserve1: Amount,
    pub total_supply: Amount,
}

/// Reserves in the caller's frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OrientedReserves {
    pub reserve_a: Amount,
    pub reserve_b: Amount,
    /// Whether asset A is the pair's first asset
    pub a_is_first: bool,
}

impl OrientedReserves {
    pub fn is_empty(&self) -> bool {
        self.reserve_a == 0 || self.reserve_b == 0
    }
}

impl PoolSnapshot {
    pub fn is_empty(&self) -> bool {
        self.reserve0 == 0 || self.reserve1 == 0 || self.total_supply == 0
    }

    /// Orient reserves so that `asset_a` comes first.
    pub fn oriented(&self, asset_a: Address) -> Result<OrientedReserves> {
        if asset_a == self.token0 {
            Ok(OrientedReserves {
                reserve_a: self.reserve0,
                reserve_b: self.reserve1,
                a_is_first: true,
            })
        } else if asset_a == self.token1 {
            Ok(OrientedReserves {
                reserve_a: self.reserve1,
                reserve_b: self.reserve0,
                a_is_first: false,
            })
        } else {
            Err(ProtocolError::OrderingMismatch {
                pair: self.pair,
                token: asset_a,
            }
            .into())
        }
    }
}

/// Read reserves, ordering and share supply of `pair`.
///
/// The three reads are separate calls; a trade landing between them can make
/// the snapshot inconsistent, which the caller's slippage bounds absorb.
pub async fn get_pool<L: Ledger>(ledger: &L, pair: &Pair) -> Result<PoolSnapshot> {
    let reserves = pair.get_reserves(ledger).await?;
    let token0 = pair.token0(ledger).await?;
    let token1 = pair.token1(ledger).await?;
    let total_supply = pair.total_supply(ledger).await?;

    let snapshot = PoolSnapshot {
        pair: pair.address(),
        token0,
        token1,
        reserve0: reserves.reserve0,
        reserve1: reserves.reserve1,
        total_supply,
    };

    tracing::debug!(
        pair = %snapshot.pair,
        reserve0 = snapshot.reserve0,
        reserve1 = snapshot.reserve1,
        total_supply = snapshot.total_supply,
        "Pool snapshot"
    );
    Ok(snapshot)
}

/// Whether `asset_a` is the pair's first asset.
///
/// The answer is checked against the canonical (lower address first) order
/// the factory assigns, so a pair reporting anything else is refused.
pub async fn ordering_of<L: Ledger>(ledger: &L, pair: &Pair, asset_a: Address) -> Result<bool> {
    let token0 = pair.token0(ledger).await?;
    let token1 = pair.token1(ledger).await?;

    if asset_a != token0 && asset_a != token1 {
        return Err(ProtocolError::OrderingMismatch {
            pair: pair.address(),
            token: asset_a,
        }
        .into());
    }
    if canonical_order(token0, token1) != (token0, token1) {
        return Err(ProtocolError::OrderingMismatch {
            pair: pair.address(),
            token: token0,
        }
        .into());
    }
    Ok(asset_a == token0)
}
