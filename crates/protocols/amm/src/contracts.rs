//! Typed facades over the pool contracts
//!
//! Each facade wraps a [`ContractHandle`] and turns reads into typed values
//! and state-changing operations into [`ContractCall`]s for the orchestrator.

use std::time::{SystemTime, UNIX_EPOCH};

use alloy::dyn_abi::DynSolValue;
use alloy::primitives::{Address, U256};
use ledger_client::{ContractCall, ContractHandle, Ledger};
use lpflow_core::{to_amount, Amount, LedgerError, Result};

fn uint(value: Amount) -> DynSolValue {
    DynSolValue::Uint(U256::from(value), 256)
}

fn addr(value: Address) -> DynSolValue {
    DynSolValue::Address(value)
}

fn output<'a>(call: &ContractCall, values: &'a [DynSolValue], index: usize) -> Result<&'a DynSolValue> {
    values.get(index).ok_or_else(|| {
        LedgerError::ParseError(format!("{} returned {} values, wanted #{}", call, values.len(), index))
            .into()
    })
}

fn uint_output(call: &ContractCall, values: &[DynSolValue], index: usize) -> Result<Amount> {
    let (value, _) = output(call, values, index)?
        .as_uint()
        .ok_or_else(|| LedgerError::ParseError(format!("{} output #{} is not a uint", call, index)))?;
    Ok(to_amount(value)?)
}

fn address_output(call: &ContractCall, values: &[DynSolValue], index: usize) -> Result<Address> {
    output(call, values, index)?.as_address().ok_or_else(|| {
        LedgerError::ParseError(format!("{} output #{} is not an address", call, index)).into()
    })
}

fn uint_array_output(call: &ContractCall, values: &[DynSolValue], index: usize) -> Result<Vec<Amount>> {
    let items = output(call, values, index)?.as_array().ok_or_else(|| {
        LedgerError::ParseError(format!("{} output #{} is not an array", call, index))
    })?;
    items
        .iter()
        .enumerate()
        .map(|(i, item)| -> Result<Amount> {
            let (value, _) = item.as_uint().ok_or_else(|| {
                LedgerError::ParseError(format!("{} output #{}[{}] is not a uint", call, index, i))
            })?;
            Ok(to_amount(value)?)
        })
        .collect()
}

/// Fungible asset contract
#[derive(Debug, Clone)]
pub struct Erc20(pub ContractHandle);

impl Erc20 {
    pub fn address(&self) -> Address {
        self.0.address
    }

    pub fn name(&self) -> &str {
        self.0.name()
    }

    pub async fn balance_of<L: Ledger>(&self, ledger: &L, owner: Address) -> Result<Amount> {
        let call = self.0.call("balanceOf", vec![addr(owner)]);
        let out = ledger.read(&call).await?;
        uint_output(&call, &out, 0)
    }

    pub async fn allowance<L: Ledger>(
        &self,
        ledger: &L,
        owner: Address,
        spender: Address,
    ) -> Result<Amount> {
        let call = self.0.call("allowance", vec![addr(owner), addr(spender)]);
        let out = ledger.read(&call).await?;
        uint_output(&call, &out, 0)
    }

    pub fn approve_call(&self, spender: Address, amount: Amount) -> ContractCall {
        self.0.call("approve", vec![addr(spender), uint(amount)])
    }
}

/// Raw pair reserves in the pair's own order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reserves {
    pub reserve0: Amount,
    pub reserve1: Amount,
}

/// Pool contract; also the share asset
#[derive(Debug, Clone)]
pub struct Pair(pub ContractHandle);

impl Pair {
    pub fn address(&self) -> Address {
        self.0.address
    }

    pub async fn get_reserves<L: Ledger>(&self, ledger: &L) -> Result<Reserves> {
        let call = self.0.call("getReserves", vec![]);
        let out = ledger.read(&call).await?;
        Ok(Reserves {
            reserve0: uint_output(&call, &out, 0)?,
            reserve1: uint_output(&call, &out, 1)?,
        })
    }

    pub async fn token0<L: Ledger>(&self, ledger: &L) -> Result<Address> {
        let call = self.0.call("token0", vec![]);
        let out = ledger.read(&call).await?;
        address_output(&call, &out, 0)
    }

    pub async fn token1<L: Ledger>(&self, ledger: &L) -> Result<Address> {
        let call = self.0.call("token1", vec![]);
        let out = ledger.read(&call).await?;
        address_output(&call, &out, 0)
    }

    pub async fn total_supply<L: Ledger>(&self, ledger: &L) -> Result<Amount> {
        let call = self.0.call("totalSupply", vec![]);
        let out = ledger.read(&call).await?;
        uint_output(&call, &out, 0)
    }

    /// The pair's share-asset side
    pub fn as_erc20(&self) -> Erc20 {
        Erc20(self.0.clone())
    }
}

/// Pool registry
#[derive(Debug, Clone)]
pub struct Factory(pub ContractHandle);

impl Factory {
    pub fn address(&self) -> Address {
        self.0.address
    }

    pub fn name(&self) -> &str {
        self.0.name()
    }

    /// Registered pair for two assets; the zero address means none.
    pub async fn get_pair<L: Ledger>(
        &self,
        ledger: &L,
        token_a: Address,
        token_b: Address,
    ) -> Result<Option<Address>> {
        let call = self.0.call("getPair", vec![addr(token_a), addr(token_b)]);
        let out = ledger.read(&call).await?;
        let pair = address_output(&call, &out, 0)?;
        Ok((pair != Address::ZERO).then_some(pair))
    }

    pub fn create_pair_call(&self, token_a: Address, token_b: Address) -> ContractCall {
        self.0.call("createPair", vec![addr(token_a), addr(token_b)])
    }
}

/// Periphery contract executing deposits, swaps and withdrawals
#[derive(Debug, Clone)]
pub struct Router {
    handle: ContractHandle,
    deadline_secs: Option<u64>,
}

impl Router {
    /// `deadline_secs` appends `now + deadline_secs` to every state-changing
    /// call, for routers whose entry points take a deadline.
    pub fn new(handle: ContractHandle, deadline_secs: Option<u64>) -> Self {
        Self {
            handle,
            deadline_secs,
        }
    }

    pub fn address(&self) -> Address {
        self.handle.address
    }

    pub async fn get_amounts_out<L: Ledger>(
        &self,
        ledger: &L,
        amount_in: Amount,
        path: &[Address],
    ) -> Result<Vec<Amount>> {
        let path = DynSolValue::Array(path.iter().copied().map(addr).collect());
        let call = self.handle.call("getAmountsOut", vec![uint(amount_in), path]);
        let out = ledger.read(&call).await?;
        uint_array_output(&call, &out, 0)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn add_liquidity_call(
        &self,
        token_a: Address,
        token_b: Address,
        amount_a: Amount,
        amount_b: Amount,
        min_a: Amount,
        min_b: Amount,
        to: Address,
    ) -> ContractCall {
        self.call(
            "addLiquidity",
            vec![
                addr(token_a),
                addr(token_b),
                uint(amount_a),
                uint(amount_b),
                uint(min_a),
                uint(min_b),
                addr(to),
            ],
        )
    }

    pub fn swap_exact_tokens_for_tokens_call(
        &self,
        amount_in: Amount,
        min_out: Amount,
        path: &[Address],
        to: Address,
    ) -> ContractCall {
        self.call(
            "swapExactTokensForTokens",
            vec![
                uint(amount_in),
                uint(min_out),
                DynSolValue::Array(path.iter().copied().map(addr).collect()),
                addr(to),
            ],
        )
    }

    pub fn remove_liquidity_call(
        &self,
        token_a: Address,
        token_b: Address,
        shares: Amount,
        min_a: Amount,
        min_b: Amount,
        to: Address,
    ) -> ContractCall {
        self.call(
            "removeLiquidity",
            vec![
                addr(token_a),
                addr(token_b),
                uint(shares),
                uint(min_a),
                uint(min_b),
                addr(to),
            ],
        )
    }

    fn call(&self, function: &str, mut args: Vec<DynSolValue>) -> ContractCall {
        if let Some(secs) = self.deadline_secs {
            let now = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0);
            args.push(DynSolValue::Uint(U256::from(now + secs), 256));
        }
        self.handle.call(function, args)
    }
}
