//! In-memory ledger simulating ERC-20 assets, a pair factory, constant-product
//! pairs and a router with a 0.3% fee.
//!
//! Every submission is executed and mined immediately into its own block.
//! A failing call is still mined, with `success = false` and its reason kept
//! for `revert_reason`, which is how a node with a fixed gas limit behaves.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use alloy::dyn_abi::DynSolValue;
use alloy::primitives::{Address, Bytes, TxHash, B256, U256};
use amm::{Contracts, Erc20, Factory, Router, Workflow, WorkflowParams};
use ledger_client::{
    ConfirmationPolicy, ContractCall, ContractHandle, ContractInterface, Ledger, LogEntry, Receipt,
    TxOrchestrator,
};
use lpflow_core::{Amount, DepositSide, LedgerError, Slippage};

pub const ETHER: Amount = 1_000_000_000_000_000_000;
pub const MINIMUM_LIQUIDITY: Amount = 1_000;

pub const SIGNER: Address = Address::repeat_byte(0x51);
// A sorts after B so the pair stores B first
pub const TOKEN_A: Address = Address::repeat_byte(0x0b);
pub const TOKEN_B: Address = Address::repeat_byte(0x0a);
pub const FACTORY: Address = Address::repeat_byte(0xf0);
pub const ROUTER: Address = Address::repeat_byte(0xe0);

const INSUFFICIENT_OUTPUT: &str = "UniswapV2Router: INSUFFICIENT_OUTPUT_AMOUNT";
const INSUFFICIENT_A: &str = "UniswapV2Router: INSUFFICIENT_A_AMOUNT";
const INSUFFICIENT_B: &str = "UniswapV2Router: INSUFFICIENT_B_AMOUNT";

pub fn erc20_interface(name: &str) -> Arc<ContractInterface> {
    Arc::new(
        ContractInterface::parse(
            name,
            &[
                "function balanceOf(address owner) view returns (uint256)",
                "function allowance(address owner, address spender) view returns (uint256)",
                "function approve(address spender, uint256 value) returns (bool)",
            ],
        )
        .unwrap(),
    )
}

pub fn pair_interface() -> Arc<ContractInterface> {
    Arc::new(
        ContractInterface::parse(
            "UniswapV2Pair",
            &[
                "function balanceOf(address owner) view returns (uint256)",
                "function allowance(address owner, address spender) view returns (uint256)",
                "function approve(address spender, uint256 value) returns (bool)",
                "function getReserves() view returns (uint112 reserve0, uint112 reserve1, uint32 blockTimestampLast)",
                "function token0() view returns (address)",
                "function token1() view returns (address)",
                "function totalSupply() view returns (uint256)",
            ],
        )
        .unwrap(),
    )
}

pub fn factory_interface() -> Arc<ContractInterface> {
    Arc::new(
        ContractInterface::parse(
            "UniswapV2Factory",
            &[
                "event PairCreated(address indexed token0, address indexed token1, address pair, uint256)",
                "function getPair(address tokenA, address tokenB) view returns (address pair)",
                "function createPair(address tokenA, address tokenB) returns (address pair)",
            ],
        )
        .unwrap(),
    )
}

pub fn router_interface() -> Arc<ContractInterface> {
    Arc::new(
        ContractInterface::parse(
            "UniswapV2Router02",
            &[
                "function getAmountsOut(uint256 amountIn, address[] path) view returns (uint256[] amounts)",
                "function addLiquidity(address tokenA, address tokenB, uint256 amountADesired, uint256 amountBDesired, uint256 amountAMin, uint256 amountBMin, address to) returns (uint256 amountA, uint256 amountB, uint256 liquidity)",
                "function swapExactTokensForTokens(uint256 amountIn, uint256 amountOutMin, address[] path, address to) returns (uint256[] amounts)",
                "function removeLiquidity(address tokenA, address tokenB, uint256 liquidity, uint256 amountAMin, uint256 amountBMin, address to) returns (uint256 amountA, uint256 amountB)",
            ],
        )
        .unwrap(),
    )
}

pub fn contracts() -> Contracts {
    Contracts {
        token_a: Erc20(ContractHandle::new(TOKEN_A, erc20_interface("AToken"))),
        token_b: Erc20(ContractHandle::new(TOKEN_B, erc20_interface("BToken"))),
        factory: Factory(ContractHandle::new(FACTORY, factory_interface())),
        router: Router::new(ContractHandle::new(ROUTER, router_interface()), None),
        pair_interface: pair_interface(),
    }
}

/// 1000 / 1000 deposit, 100 swapped, 1% tolerance, approvals sized to the deposit
pub fn params() -> WorkflowParams {
    WorkflowParams {
        slippage: Slippage::from_percent(1).unwrap(),
        deposit_a: 1_000 * ETHER,
        deposit_b: 1_000 * ETHER,
        approval_ceiling: 1_000 * ETHER,
        swap_amount: 100 * ETHER,
        deposit_side: DepositSide::Auto,
        fee_numerator: 997,
        fee_denominator: 1_000,
    }
}

pub fn fast_policy() -> ConfirmationPolicy {
    ConfirmationPolicy {
        confirmations: 1,
        poll_interval: Duration::from_millis(5),
        timeout: Duration::from_secs(5),
    }
}

pub fn workflow(sim: &Arc<SimLedger>) -> Workflow<SimLedger> {
    let orchestrator = TxOrchestrator::new(sim.clone(), fast_policy());
    Workflow::new(orchestrator, contracts(), params())
}

fn uint(value: Amount) -> DynSolValue {
    DynSolValue::Uint(U256::from(value), 256)
}

fn arg_address(call: &ContractCall, index: usize) -> Result<Address, String> {
    call.args
        .get(index)
        .and_then(DynSolValue::as_address)
        .ok_or_else(|| format!("{}: argument {} is not an address", call, index))
}

fn arg_amount(call: &ContractCall, index: usize) -> Result<Amount, String> {
    call.args
        .get(index)
        .and_then(DynSolValue::as_uint)
        .and_then(|(value, _)| u128::try_from(value).ok())
        .ok_or_else(|| format!("{}: argument {} is not a uint", call, index))
}

fn arg_path(call: &ContractCall, index: usize) -> Result<Vec<Address>, String> {
    call.args
        .get(index)
        .and_then(DynSolValue::as_array)
        .ok_or_else(|| format!("{}: argument {} is not an array", call, index))?
        .iter()
        .map(|v| v.as_address().ok_or_else(|| "path entry is not an address".to_string()))
        .collect()
}

fn sorted(a: Address, b: Address) -> (Address, Address) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

fn isqrt(value: U256) -> U256 {
    if value < U256::from(2u64) {
        return value;
    }
    let mut x = value;
    let mut y = (x + U256::from(1u64)) / U256::from(2u64);
    while y < x {
        x = y;
        y = (x + value / x) / U256::from(2u64);
    }
    x
}

pub fn mul_div(a: Amount, b: Amount, c: Amount) -> Amount {
    (U256::from(a) * U256::from(b) / U256::from(c)).to::<u128>()
}

/// UniswapV2Library.getAmountOut
pub fn amount_out(amount_in: Amount, reserve_in: Amount, reserve_out: Amount) -> Amount {
    let with_fee = U256::from(amount_in) * U256::from(997u64);
    let numerator = with_fee * U256::from(reserve_out);
    let denominator = U256::from(reserve_in) * U256::from(1_000u64) + with_fee;
    (numerator / denominator).to::<u128>()
}

#[derive(Debug, Clone)]
struct PairState {
    token0: Address,
    token1: Address,
    total_supply: Amount,
}

#[derive(Debug, Clone, Default)]
pub struct World {
    balances: HashMap<(Address, Address), Amount>,
    allowances: HashMap<(Address, Address, Address), Amount>,
    pairs: HashMap<(Address, Address), Address>,
    pair_state: HashMap<Address, PairState>,
}

impl World {
    pub fn balance(&self, token: Address, owner: Address) -> Amount {
        self.balances.get(&(token, owner)).copied().unwrap_or(0)
    }

    pub fn mint(&mut self, token: Address, owner: Address, amount: Amount) {
        *self.balances.entry((token, owner)).or_default() += amount;
    }

    fn transfer(&mut self, token: Address, from: Address, to: Address, amount: Amount) -> Result<(), String> {
        let balance = self.balance(token, from);
        if balance < amount {
            return Err("TransferHelper: TRANSFER_FROM_FAILED".to_string());
        }
        self.balances.insert((token, from), balance - amount);
        self.mint(token, to, amount);
        Ok(())
    }

    fn transfer_from(
        &mut self,
        token: Address,
        owner: Address,
        spender: Address,
        to: Address,
        amount: Amount,
    ) -> Result<(), String> {
        let key = (token, owner, spender);
        let allowed = self.allowances.get(&key).copied().unwrap_or(0);
        if allowed < amount {
            return Err("TransferHelper: TRANSFER_FROM_FAILED".to_string());
        }
        self.allowances.insert(key, allowed - amount);
        self.transfer(token, owner, to, amount)
    }

    fn pair_for(&self, a: Address, b: Address) -> Result<Address, String> {
        self.pairs
            .get(&sorted(a, b))
            .copied()
            .ok_or_else(|| "UniswapV2Library: PAIR_NOT_FOUND".to_string())
    }

    fn pair(&self, pair: Address) -> Result<&PairState, String> {
        self.pair_state
            .get(&pair)
            .ok_or_else(|| format!("no pair at {}", pair))
    }

    /// Reserves of `pair` ordered as (reserve of `token`, reserve of the other)
    pub fn reserves_for(&self, pair: Address, token: Address) -> (Amount, Amount) {
        let Some(state) = self.pair_state.get(&pair) else {
            return (0, 0);
        };
        let r0 = self.balance(state.token0, pair);
        let r1 = self.balance(state.token1, pair);
        if token == state.token0 {
            (r0, r1)
        } else {
            (r1, r0)
        }
    }

    pub fn total_supply(&self, pair: Address) -> Amount {
        self.pair_state.get(&pair).map(|s| s.total_supply).unwrap_or(0)
    }

    /// Trade `amount_in` of `token_in` straight against the pair, bypassing the router.
    pub fn external_swap(&mut self, token_in: Address, token_out: Address, amount_in: Amount) {
        let Ok(pair) = self.pair_for(token_in, token_out) else {
            return;
        };
        let (r_in, r_out) = self.reserves_for(pair, token_in);
        let out = amount_out(amount_in, r_in, r_out);
        self.mint(token_in, pair, amount_in);
        let _ = self.transfer(token_out, pair, Address::ZERO, out);
    }

    fn amounts_out(&self, amount_in: Amount, path: &[Address]) -> Result<Vec<Amount>, String> {
        if path.len() < 2 {
            return Err("UniswapV2Library: INVALID_PATH".to_string());
        }
        let mut amounts = vec![amount_in];
        for hop in path.windows(2) {
            let pair = self.pair_for(hop[0], hop[1])?;
            let (r_in, r_out) = self.reserves_for(pair, hop[0]);
            if r_in == 0 || r_out == 0 {
                return Err("UniswapV2Library: INSUFFICIENT_LIQUIDITY".to_string());
            }
            let last = amounts[amounts.len() - 1];
            amounts.push(amount_out(last, r_in, r_out));
        }
        Ok(amounts)
    }
}

pub struct SimLedger {
    world: Mutex<World>,
    chain: Mutex<Chain>,
    hook: Mutex<Option<(String, Box<dyn FnOnce(&mut World) + Send>)>>,
}

#[derive(Default)]
struct Chain {
    head: u64,
    nonce: u64,
    receipts: HashMap<TxHash, Receipt>,
    reasons: HashMap<u64, String>,
    submitted: Vec<String>,
    nonce_lookups: u64,
    emit_pair_created: bool,
    quote_markup_bps: u128,
    reject_on_estimate: bool,
}

impl SimLedger {
    /// Signer funded with 10,000 of each asset
    pub fn new() -> Arc<Self> {
        let mut world = World::default();
        world.mint(TOKEN_A, SIGNER, 10_000 * ETHER);
        world.mint(TOKEN_B, SIGNER, 10_000 * ETHER);
        Arc::new(Self {
            world: Mutex::new(world),
            chain: Mutex::new(Chain {
                head: 100,
                emit_pair_created: true,
                ..Chain::default()
            }),
            hook: Mutex::new(None),
        })
    }

    pub fn world(&self) -> World {
        self.world.lock().unwrap().clone()
    }

    pub fn with_world<T>(&self, f: impl FnOnce(&mut World) -> T) -> T {
        f(&mut self.world.lock().unwrap())
    }

    /// Run `f` against the world right before the next submission of `function`.
    pub fn before_next(&self, function: &str, f: impl FnOnce(&mut World) + Send + 'static) {
        *self.hook.lock().unwrap() = Some((function.to_string(), Box::new(f)));
    }

    /// Names of every submitted call, in order
    pub fn submitted(&self) -> Vec<String> {
        self.chain.lock().unwrap().submitted.clone()
    }

    pub fn nonce_lookups(&self) -> u64 {
        self.chain.lock().unwrap().nonce_lookups
    }

    pub fn suppress_pair_created(&self) {
        self.chain.lock().unwrap().emit_pair_created = false;
    }

    /// Make the router's `getAmountsOut` overstate every hop
    pub fn mark_up_quotes(&self, bps: u128) {
        self.chain.lock().unwrap().quote_markup_bps = bps;
    }

    /// Refuse failing calls at submission the way a node's gas estimation
    /// does, instead of mining them as reverts
    pub fn reject_on_estimate(&self) {
        self.chain.lock().unwrap().reject_on_estimate = true;
    }

    fn run_hook(&self, function: &str) {
        let mut slot = self.hook.lock().unwrap();
        if slot.as_ref().is_some_and(|(name, _)| name == function) {
            if let Some((_, hook)) = slot.take() {
                hook(&mut self.world.lock().unwrap());
            }
        }
    }

    fn view(&self, call: &ContractCall) -> Result<Vec<DynSolValue>, String> {
        let world = self.world.lock().unwrap();
        let function = call.function.as_str();

        if call.contract == ROUTER {
            return match function {
                "getAmountsOut" => {
                    let markup = self.chain.lock().unwrap().quote_markup_bps;
                    let amounts = world.amounts_out(arg_amount(call, 0)?, &arg_path(call, 1)?)?;
                    let amounts = amounts
                        .into_iter()
                        .enumerate()
                        .map(|(i, a)| if i == 0 { a } else { a * (10_000 + markup) / 10_000 })
                        .map(uint)
                        .collect();
                    Ok(vec![DynSolValue::Array(amounts)])
                }
                other => Err(format!("router has no view {}", other)),
            };
        }
        if call.contract == FACTORY {
            return match function {
                "getPair" => {
                    let pair = world
                        .pair_for(arg_address(call, 0)?, arg_address(call, 1)?)
                        .unwrap_or(Address::ZERO);
                    Ok(vec![DynSolValue::Address(pair)])
                }
                other => Err(format!("factory has no view {}", other)),
            };
        }

        match function {
            "balanceOf" => Ok(vec![uint(world.balance(call.contract, arg_address(call, 0)?))]),
            "allowance" => {
                let key = (call.contract, arg_address(call, 0)?, arg_address(call, 1)?);
                Ok(vec![uint(world.allowances.get(&key).copied().unwrap_or(0))])
            }
            "getReserves" => {
                let state = world.pair(call.contract)?;
                Ok(vec![
                    DynSolValue::Uint(U256::from(world.balance(state.token0, call.contract)), 112),
                    DynSolValue::Uint(U256::from(world.balance(state.token1, call.contract)), 112),
                    DynSolValue::Uint(U256::ZERO, 32),
                ])
            }
            "token0" => Ok(vec![DynSolValue::Address(world.pair(call.contract)?.token0)]),
            "token1" => Ok(vec![DynSolValue::Address(world.pair(call.contract)?.token1)]),
            "totalSupply" => Ok(vec![uint(world.pair(call.contract)?.total_supply)]),
            other => Err(format!("{} has no view {}", call.contract, other)),
        }
    }

    fn execute(&self, world: &mut World, call: &ContractCall, emit_pair_created: bool) -> Result<Vec<LogEntry>, String> {
        let function = call.function.as_str();
        let caller = SIGNER;

        if call.contract == FACTORY && function == "createPair" {
            let (token0, token1) = sorted(arg_address(call, 0)?, arg_address(call, 1)?);
            if world.pairs.contains_key(&(token0, token1)) {
                return Err("UniswapV2: PAIR_EXISTS".to_string());
            }
            let pair = Address::repeat_byte(0xa0 + world.pairs.len() as u8);
            world.pairs.insert((token0, token1), pair);
            world.pair_state.insert(
                pair,
                PairState {
                    token0,
                    token1,
                    total_supply: 0,
                },
            );

            // An unrelated entry ahead of the one the caller looks for
            let mut logs = vec![LogEntry {
                address: ROUTER,
                topics: vec![B256::repeat_byte(0xee)],
                data: Bytes::from(vec![0xde, 0xad]),
            }];
            if emit_pair_created {
                let selector = call
                    .interface
                    .abi()
                    .event("PairCreated")
                    .and_then(|events| events.first())
                    .map(|event| event.selector())
                    .ok_or("factory interface lacks PairCreated")?;
                let mut data = pair.into_word().to_vec();
                data.extend_from_slice(&U256::from(world.pairs.len()).to_be_bytes::<32>());
                logs.push(LogEntry {
                    address: FACTORY,
                    topics: vec![selector, token0.into_word(), token1.into_word()],
                    data: Bytes::from(data),
                });
            }
            return Ok(logs);
        }

        if function == "approve" {
            let spender = arg_address(call, 0)?;
            let amount = arg_amount(call, 1)?;
            world.allowances.insert((call.contract, caller, spender), amount);
            return Ok(vec![]);
        }

        if call.contract != ROUTER {
            return Err(format!("{} is not callable", call));
        }

        match function {
            "addLiquidity" => {
                let (token_a, token_b) = (arg_address(call, 0)?, arg_address(call, 1)?);
                let (desired_a, desired_b) = (arg_amount(call, 2)?, arg_amount(call, 3)?);
                let (min_a, min_b) = (arg_amount(call, 4)?, arg_amount(call, 5)?);
                let to = arg_address(call, 6)?;

                let pair = world.pair_for(token_a, token_b)?;
                let (reserve_a, reserve_b) = world.reserves_for(pair, token_a);
                let (amount_a, amount_b) = if reserve_a == 0 && reserve_b == 0 {
                    (desired_a, desired_b)
                } else {
                    let optimal_b = mul_div(desired_a, reserve_b, reserve_a);
                    if optimal_b <= desired_b {
                        if optimal_b < min_b {
                            return Err(INSUFFICIENT_B.to_string());
                        }
                        (desired_a, optimal_b)
                    } else {
                        let optimal_a = mul_div(desired_b, reserve_a, reserve_b);
                        if optimal_a < min_a {
                            return Err(INSUFFICIENT_A.to_string());
                        }
                        (optimal_a, desired_b)
                    }
                };

                world.transfer_from(token_a, caller, ROUTER, pair, amount_a)?;
                world.transfer_from(token_b, caller, ROUTER, pair, amount_b)?;

                let supply = world.total_supply(pair);
                let liquidity = if supply == 0 {
                    let root = isqrt(U256::from(amount_a) * U256::from(amount_b)).to::<u128>();
                    if root <= MINIMUM_LIQUIDITY {
                        return Err("UniswapV2: INSUFFICIENT_LIQUIDITY_MINTED".to_string());
                    }
                    world.mint(pair, Address::ZERO, MINIMUM_LIQUIDITY);
                    root - MINIMUM_LIQUIDITY
                } else {
                    mul_div(amount_a, supply, reserve_a).min(mul_div(amount_b, supply, reserve_b))
                };
                let minted = liquidity + if supply == 0 { MINIMUM_LIQUIDITY } else { 0 };
                world.mint(pair, to, liquidity);
                if let Some(state) = world.pair_state.get_mut(&pair) {
                    state.total_supply += minted;
                }
                Ok(vec![])
            }
            "swapExactTokensForTokens" => {
                let amount_in = arg_amount(call, 0)?;
                let min_out = arg_amount(call, 1)?;
                let path = arg_path(call, 2)?;
                let to = arg_address(call, 3)?;

                let amounts = world.amounts_out(amount_in, &path)?;
                if amounts[amounts.len() - 1] < min_out {
                    return Err(INSUFFICIENT_OUTPUT.to_string());
                }
                let first_pair = world.pair_for(path[0], path[1])?;
                world.transfer_from(path[0], caller, ROUTER, first_pair, amount_in)?;
                for (i, hop) in path.windows(2).enumerate() {
                    let pair = world.pair_for(hop[0], hop[1])?;
                    let recipient = match path.get(i + 2) {
                        Some(next) => world.pair_for(hop[1], *next)?,
                        None => to,
                    };
                    world.transfer(hop[1], pair, recipient, amounts[i + 1])?;
                }
                Ok(vec![])
            }
            "removeLiquidity" => {
                let (token_a, token_b) = (arg_address(call, 0)?, arg_address(call, 1)?);
                let liquidity = arg_amount(call, 2)?;
                let (min_a, min_b) = (arg_amount(call, 3)?, arg_amount(call, 4)?);
                let to = arg_address(call, 5)?;

                let pair = world.pair_for(token_a, token_b)?;
                world.transfer_from(pair, caller, ROUTER, pair, liquidity)?;

                let supply = world.total_supply(pair);
                let (reserve_a, reserve_b) = world.reserves_for(pair, token_a);
                let amount_a = mul_div(liquidity, reserve_a, supply);
                let amount_b = mul_div(liquidity, reserve_b, supply);
                if amount_a < min_a {
                    return Err(INSUFFICIENT_A.to_string());
                }
                if amount_b < min_b {
                    return Err(INSUFFICIENT_B.to_string());
                }

                world.transfer(pair, pair, Address::ZERO, liquidity)?;
                if let Some(state) = world.pair_state.get_mut(&pair) {
                    state.total_supply -= liquidity;
                }
                world.transfer(token_a, pair, to, amount_a)?;
                world.transfer(token_b, pair, to, amount_b)?;
                Ok(vec![])
            }
            other => Err(format!("router has no function {}", other)),
        }
    }
}

fn tx_hash(index: u64) -> TxHash {
    B256::from(U256::from(index).to_be_bytes::<32>())
}

impl Ledger for SimLedger {
    fn signer(&self) -> Address {
        SIGNER
    }

    async fn block_number(&self) -> ledger_client::Result<u64> {
        Ok(self.chain.lock().unwrap().head)
    }

    async fn read(&self, call: &ContractCall) -> ledger_client::Result<Vec<DynSolValue>> {
        call.calldata()?;
        self.view(call).map_err(|message| LedgerError::ApiError {
            message: format!("{}: execution reverted: {}", call, message),
        })
    }

    async fn next_nonce(&self) -> ledger_client::Result<u64> {
        let mut chain = self.chain.lock().unwrap();
        chain.nonce_lookups += 1;
        Ok(chain.nonce)
    }

    async fn submit(&self, call: &ContractCall, nonce: u64) -> ledger_client::Result<TxHash> {
        call.calldata()?;
        {
            let chain = self.chain.lock().unwrap();
            if nonce != chain.nonce {
                return Err(LedgerError::Rejected {
                    reason: format!("nonce {} but account is at {}", nonce, chain.nonce),
                });
            }
        }

        self.run_hook(&call.function);

        let (emit_pair_created, reject_on_estimate) = {
            let chain = self.chain.lock().unwrap();
            (chain.emit_pair_created, chain.reject_on_estimate)
        };
        let outcome = {
            let mut world = self.world.lock().unwrap();
            let mut draft = world.clone();
            let outcome = self.execute(&mut draft, call, emit_pair_created);
            match &outcome {
                Ok(_) => *world = draft,
                Err(reason) if reject_on_estimate => {
                    return Err(LedgerError::Rejected {
                        reason: format!("execution reverted: {}", reason),
                    });
                }
                Err(_) => {}
            }
            outcome
        };

        let mut chain = self.chain.lock().unwrap();
        chain.nonce += 1;
        chain.head += 1;
        let block_number = chain.head;
        let hash = tx_hash(chain.nonce);
        chain.submitted.push(call.function.clone());

        let (success, logs) = match outcome {
            Ok(logs) => (true, logs),
            Err(reason) => {
                chain.reasons.insert(block_number, reason);
                (false, vec![])
            }
        };
        chain.receipts.insert(
            hash,
            Receipt {
                tx_hash: hash,
                block_number,
                success,
                logs,
            },
        );
        Ok(hash)
    }

    async fn receipt(&self, tx_hash: TxHash) -> ledger_client::Result<Option<Receipt>> {
        Ok(self.chain.lock().unwrap().receipts.get(&tx_hash).cloned())
    }

    async fn revert_reason(&self, _call: &ContractCall, block_number: u64) -> Option<String> {
        self.chain.lock().unwrap().reasons.get(&block_number).cloned()
    }
}
