//! AMM Calculator
//!
//! Client-side quoting using the constant product formula (x * y = k).
//! Every division truncates toward zero, matching the pair's own accounting,
//! and every intermediate product is computed in `BigUint` so it cannot overflow.

use num_bigint::BigUint;
use num_traits::ToPrimitive;

use lpflow_core::constants::MINIMUM_LIQUIDITY;
use lpflow_core::{Amount, DepositSide, ProtocolError, Slippage, BPS_DENOMINATOR};

use crate::oracle::OrientedReserves;
use crate::state::{DepositBasis, DepositQuote, LiquidityPosition, SwapQuote, WithdrawalQuote};
use alloy::primitives::Address;

fn big(value: Amount) -> BigUint {
    BigUint::from(value)
}

fn narrow(value: BigUint) -> Result<Amount, ProtocolError> {
    value.to_u128().ok_or_else(|| ProtocolError::AmountOverflow {
        value: value.to_string(),
    })
}

/// `a * b / c`, truncating. `None` when `c` is zero.
fn mul_div(a: Amount, b: Amount, c: Amount) -> Option<BigUint> {
    if c == 0 {
        return None;
    }
    Some(big(a) * big(b) / big(c))
}

/// Apply slippage tolerance to an amount, always rounding down.
///
/// minimum = amount * (10000 - bps) / 10000
pub fn apply_slippage(amount: Amount, slippage: Slippage) -> Result<Amount, ProtocolError> {
    let scaled = big(amount) * BigUint::from(slippage.retained_bps())
        / BigUint::from(BPS_DENOMINATOR as u32);
    narrow(scaled)
}

/// Counterpart needed to deposit `amount_fixed` at the current reserve ratio.
///
/// counterpart = amount_fixed * reserve_other / reserve_fixed
pub fn quote_deposit(
    amount_fixed: Amount,
    reserve_fixed: Amount,
    reserve_other: Amount,
) -> Result<Amount, ProtocolError> {
    let counterpart = mul_div(amount_fixed, reserve_other, reserve_fixed).ok_or_else(|| {
        ProtocolError::QuoteUnavailable {
            reason: "reserve ratio undefined for an empty pool".to_string(),
        }
    })?;
    narrow(counterpart)
}

/// Derive deposit amounts and their minimums.
///
/// `reserves` is `None` for an empty pool, in which case both desired amounts
/// are used as given. Otherwise the side named by `side` is held fixed; `Auto`
/// fixes A unless the derived B would exceed `desired_b`, then fixes B.
pub fn plan_deposit(
    desired_a: Amount,
    desired_b: Amount,
    reserves: Option<&OrientedReserves>,
    total_supply: Amount,
    side: DepositSide,
    slippage: Slippage,
) -> Result<DepositQuote, ProtocolError> {
    if desired_a == 0 && desired_b == 0 {
        return Err(ProtocolError::InvalidAmount {
            message: "deposit of zero".to_string(),
        });
    }

    let (amount_a, amount_b, basis) = match reserves.filter(|r| !r.is_empty()) {
        None => (desired_a, desired_b, DepositBasis::InitialPrice),
        Some(r) => {
            let fix_a = || -> Result<_, ProtocolError> {
                let b = quote_deposit(desired_a, r.reserve_a, r.reserve_b)?;
                Ok((desired_a, b, DepositBasis::FixedA))
            };
            let fix_b = || -> Result<_, ProtocolError> {
                let a = quote_deposit(desired_b, r.reserve_b, r.reserve_a)?;
                Ok((a, desired_b, DepositBasis::FixedB))
            };
            match side {
                DepositSide::A => fix_a()?,
                DepositSide::B => fix_b()?,
                DepositSide::Auto => {
                    let (a, b, basis) = fix_a()?;
                    if b <= desired_b {
                        (a, b, basis)
                    } else {
                        fix_b()?
                    }
                }
            }
        }
    };

    if amount_a == 0 || amount_b == 0 {
        return Err(ProtocolError::InvalidAmount {
            message: format!("deposit rounds to zero ({} / {})", amount_a, amount_b),
        });
    }

    let expected_shares = expected_shares(amount_a, amount_b, reserves, total_supply);

    Ok(DepositQuote {
        amount_a,
        amount_b,
        min_a: apply_slippage(amount_a, slippage)?,
        min_b: apply_slippage(amount_b, slippage)?,
        basis,
        expected_shares,
        slippage,
    })
}

/// Shares the pair should mint for a deposit of `amount_a` and `amount_b`.
pub fn expected_shares(
    amount_a: Amount,
    amount_b: Amount,
    reserves: Option<&OrientedReserves>,
    total_supply: Amount,
) -> Amount {
    match reserves.filter(|r| !r.is_empty() && total_supply > 0) {
        None => calculate_initial_shares(amount_a, amount_b),
        Some(r) => calculate_shares_minted(r.reserve_a, r.reserve_b, total_supply, amount_a, amount_b),
    }
}

/// Bound a router quote. `hop_amounts` is the router's `getAmountsOut`
/// result: the input followed by each hop's predicted output.
pub fn quote_swap(
    path: &[Address],
    hop_amounts: &[Amount],
    slippage: Slippage,
) -> Result<SwapQuote, ProtocolError> {
    if path.len() < 2 {
        return Err(ProtocolError::QuoteUnavailable {
            reason: format!("swap path needs at least 2 assets, got {}", path.len()),
        });
    }
    if hop_amounts.len() != path.len() {
        return Err(ProtocolError::QuoteUnavailable {
            reason: format!(
                "router returned {} amounts for a {}-asset path",
                hop_amounts.len(),
                path.len()
            ),
        });
    }

    let amount_in = hop_amounts[0];
    let expected_out = hop_amounts[hop_amounts.len() - 1];
    if amount_in == 0 || expected_out == 0 {
        return Err(ProtocolError::QuoteUnavailable {
            reason: "router predicts no output".to_string(),
        });
    }

    Ok(SwapQuote {
        amount_in,
        path: path.to_vec(),
        hop_amounts: hop_amounts.to_vec(),
        expected_out,
        min_out: apply_slippage(expected_out, slippage)?,
        slippage,
        price_impact: None,
    })
}

/// Expected claim on each reserve for a position, and its minimums.
///
/// expected_a = reserve_a * shares / total_supply
pub fn quote_withdrawal(
    reserves: &OrientedReserves,
    position: &LiquidityPosition,
    slippage: Slippage,
) -> Result<WithdrawalQuote, ProtocolError> {
    if position.is_empty() {
        return Err(ProtocolError::EmptyPosition {
            balance: position.shares,
            total_supply: position.total_supply,
        });
    }

    let (expected_a, expected_b) = calculate_redeem_shares(
        reserves.reserve_a,
        reserves.reserve_b,
        position.total_supply,
        position.shares,
    )?;

    Ok(WithdrawalQuote {
        shares: position.shares,
        total_supply: position.total_supply,
        expected_a,
        expected_b,
        min_a: apply_slippage(expected_a, slippage)?,
        min_b: apply_slippage(expected_b, slippage)?,
        slippage,
    })
}

/// Calculate swap output using constant product formula
///
/// Formula: output = (reserves_out * input * fee_num) / (reserves_in * fee_denom + input * fee_num)
pub fn calculate_output(
    reserves_in: Amount,
    reserves_out: Amount,
    input_amount: Amount,
    fee_num: u32,
    fee_denom: u32,
) -> Amount {
    if reserves_in == 0 || reserves_out == 0 || input_amount == 0 {
        return 0;
    }

    let numerator = big(reserves_out) * big(input_amount) * BigUint::from(fee_num);
    let denominator =
        big(reserves_in) * BigUint::from(fee_denom) + big(input_amount) * BigUint::from(fee_num);

    if denominator == BigUint::from(0u32) {
        return 0;
    }

    (numerator / denominator).to_u128().unwrap_or(0)
}

/// Calculate spot price (reserves_out / reserves_in)
pub fn calculate_spot_price(reserves_in: Amount, reserves_out: Amount) -> f64 {
    if reserves_in == 0 {
        return 0.0;
    }
    reserves_out as f64 / reserves_in as f64
}

/// Calculate price impact as percentage
pub fn calculate_price_impact(
    reserves_in: Amount,
    reserves_out: Amount,
    input_amount: Amount,
    output_amount: Amount,
) -> f64 {
    if input_amount == 0 || output_amount == 0 {
        return 0.0;
    }

    let spot_price = calculate_spot_price(reserves_in, reserves_out);
    let execution_price = output_amount as f64 / input_amount as f64;

    if spot_price == 0.0 {
        return 0.0;
    }

    ((spot_price - execution_price) / spot_price).abs() * 100.0
}

/// Shares minted by the first deposit: sqrt(a * b) - MINIMUM_LIQUIDITY.
///
/// Returns 0 when the deposit cannot cover the locked minimum.
pub fn calculate_initial_shares(amount_a: Amount, amount_b: Amount) -> Amount {
    if amount_a == 0 || amount_b == 0 {
        return 0;
    }
    let root = (big(amount_a) * big(amount_b)).sqrt();
    root.to_u128()
        .unwrap_or(Amount::MAX)
        .saturating_sub(MINIMUM_LIQUIDITY)
}

/// Shares minted by a later deposit.
///
/// shares = min(a * supply / reserve_a, b * supply / reserve_b)
pub fn calculate_shares_minted(
    reserve_a: Amount,
    reserve_b: Amount,
    total_supply: Amount,
    amount_a: Amount,
    amount_b: Amount,
) -> Amount {
    let (Some(by_a), Some(by_b)) = (
        mul_div(amount_a, total_supply, reserve_a),
        mul_div(amount_b, total_supply, reserve_b),
    ) else {
        return 0;
    };
    by_a.min(by_b).to_u128().unwrap_or(0)
}

/// Calculate a position's share of pool reserves when redeeming.
///
/// Returns (amount_a, amount_b).
pub fn calculate_redeem_shares(
    reserve_a: Amount,
    reserve_b: Amount,
    total_supply: Amount,
    shares: Amount,
) -> Result<(Amount, Amount), ProtocolError> {
    let (Some(out_a), Some(out_b)) = (
        mul_div(reserve_a, shares, total_supply),
        mul_div(reserve_b, shares, total_supply),
    ) else {
        return Err(ProtocolError::EmptyPosition {
            balance: shares,
            total_supply,
        });
    };
    Ok((narrow(out_a)?, narrow(out_b)?))
}
