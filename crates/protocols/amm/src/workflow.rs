//! Workflow Sequencer
//!
//! Runs the pool lifecycle as ordered stages: provisioning, liquidity
//! settlement, and trading (swap then proportional withdrawal). Every stage
//! re-reads pool state, computes its intent from that read, ensures
//! allowances, submits through the orchestrator and verifies the effect.
//!
//! Progress is reported as [`StageEvent`]s over an optional channel; the
//! workflow itself never prints.

use std::sync::Arc;

use alloy::primitives::{Address, TxHash};
use ledger_client::{
    find_event, ContractArtifact, ContractCall, ContractHandle, ContractInterface, Ledger, Receipt,
    TxOrchestrator,
};
use lpflow_core::{
    parse_token_amount, Amount, AppConfig, DepositSide, Error, ProtocolError, Result, Slippage,
    WorkflowConfig,
};
use serde::Serialize;
use tokio::sync::mpsc;

use crate::allowance::{ensure_allowance, AllowanceOutcome};
use crate::calculator::{
    calculate_output, calculate_price_impact, plan_deposit, quote_swap, quote_withdrawal,
};
use crate::contracts::{Erc20, Factory, Pair, Router};
use crate::oracle::{get_pool, ordering_of, PoolSnapshot};
use crate::state::{
    Balances, DepositQuote, LiquidityPosition, SwapQuote, TradeIntent, WithdrawalQuote,
};

const PAIR_CREATED: &str = "PairCreated";

/// Milestones of one pool lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowState {
    Provisioning,
    LiquiditySettled,
    Traded,
    WithdrawalComplete,
}

impl WorkflowState {
    /// The milestone that may follow this one
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Provisioning => Some(Self::LiquiditySettled),
            Self::LiquiditySettled => Some(Self::Traded),
            Self::Traded => Some(Self::WithdrawalComplete),
            Self::WithdrawalComplete => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Provision,
    Settle,
    Swap,
    Withdraw,
}

/// Structured progress signal for a presentation layer
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StageEvent {
    StageStarted {
        stage: Stage,
    },
    IntentComputed {
        stage: Stage,
        intent: TradeIntent,
    },
    AllowanceChecked {
        stage: Stage,
        token: String,
        outcome: AllowanceOutcome,
    },
    CallConfirmed {
        stage: Stage,
        call: String,
        tx_hash: TxHash,
        block_number: u64,
    },
    StateChanged {
        from: WorkflowState,
        to: WorkflowState,
    },
    StageCompleted {
        stage: Stage,
        state: WorkflowState,
    },
    StageFailed {
        stage: Stage,
        code: &'static str,
        message: String,
        /// Re-running the stage with fresh quotes may succeed
        rerun: bool,
    },
}

/// Trade parameters in raw token units
#[derive(Debug, Clone)]
pub struct WorkflowParams {
    pub slippage: Slippage,
    pub deposit_a: Amount,
    pub deposit_b: Amount,
    pub approval_ceiling: Amount,
    pub swap_amount: Amount,
    pub deposit_side: DepositSide,
    pub fee_numerator: u32,
    pub fee_denominator: u32,
}

impl WorkflowParams {
    pub fn from_config(config: &WorkflowConfig) -> Result<Self> {
        let decimals = config.decimals;
        Ok(Self {
            slippage: Slippage::from_bps(config.slippage_bps)?,
            deposit_a: parse_token_amount(&config.deposit_a, decimals)?,
            deposit_b: parse_token_amount(&config.deposit_b, decimals)?,
            approval_ceiling: parse_token_amount(&config.approval_ceiling, decimals)?,
            swap_amount: parse_token_amount(&config.swap_amount, decimals)?,
            deposit_side: config.deposit_side,
            fee_numerator: config.fee_numerator,
            fee_denominator: config.fee_denominator,
        })
    }
}

/// Handles to every participating contract
#[derive(Debug, Clone)]
pub struct Contracts {
    pub token_a: Erc20,
    pub token_b: Erc20,
    pub factory: Factory,
    pub router: Router,
    /// Bound to an address once the pair is resolved
    pub pair_interface: Arc<ContractInterface>,
}

impl Contracts {
    /// Load every artifact named by the configuration
    pub fn load(config: &AppConfig) -> Result<Self> {
        let artifacts = &config.artifacts;
        let load = |file: &str| ContractArtifact::load(&artifacts.path(file));

        Ok(Self {
            token_a: Erc20(load(&artifacts.token_a)?.handle()?),
            token_b: Erc20(load(&artifacts.token_b)?.handle()?),
            factory: Factory(load(&artifacts.factory)?.handle()?),
            router: Router::new(
                load(&artifacts.router)?.handle()?,
                config.workflow.deadline_secs,
            ),
            pair_interface: load(&artifacts.pair)?.interface,
        })
    }

    pub fn pair_at(&self, address: Address) -> Pair {
        Pair(ContractHandle::new(address, self.pair_interface.clone()))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProvisionReport {
    pub pair: Address,
    /// Whether this run created the pair
    pub created: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<TxHash>,
    pub a_is_first: bool,
    pub pool: PoolSnapshot,
}

#[derive(Debug, Clone, Serialize)]
pub struct SettlementReport {
    pub quote: DepositQuote,
    pub tx_hash: TxHash,
    pub before: Balances,
    pub after: Balances,
    pub shares_minted: Amount,
    pub pool: PoolSnapshot,
}

#[derive(Debug, Clone, Serialize)]
pub struct SwapReport {
    pub quote: SwapQuote,
    pub tx_hash: TxHash,
    pub before: Balances,
    pub after: Balances,
    pub received: Amount,
}

#[derive(Debug, Clone, Serialize)]
pub struct WithdrawalReport {
    pub quote: WithdrawalQuote,
    pub tx_hash: TxHash,
    pub before: Balances,
    pub after: Balances,
    pub received_a: Amount,
    pub received_b: Amount,
}

#[derive(Debug, Clone, Serialize)]
pub struct TradeReport {
    pub swap: SwapReport,
    pub withdrawal: WithdrawalReport,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub provision: ProvisionReport,
    pub settlement: SettlementReport,
    pub trade: TradeReport,
}

pub struct Workflow<L> {
    orchestrator: TxOrchestrator<L>,
    contracts: Contracts,
    params: WorkflowParams,
    events: Option<mpsc::UnboundedSender<StageEvent>>,
    state: WorkflowState,
    pair: Option<Pair>,
}

impl<L: Ledger> Workflow<L> {
    pub fn new(orchestrator: TxOrchestrator<L>, contracts: Contracts, params: WorkflowParams) -> Self {
        Self {
            orchestrator,
            contracts,
            params,
            events: None,
            state: WorkflowState::Provisioning,
            pair: None,
        }
    }

    /// Send stage signals to `sender`
    pub fn with_events(mut self, sender: mpsc::UnboundedSender<StageEvent>) -> Self {
        self.events = Some(sender);
        self
    }

    pub fn state(&self) -> WorkflowState {
        self.state
    }

    pub fn contracts(&self) -> &Contracts {
        &self.contracts
    }

    pub fn params(&self) -> &WorkflowParams {
        &self.params
    }

    fn ledger(&self) -> &L {
        self.orchestrator.ledger().as_ref()
    }

    fn owner(&self) -> Address {
        self.ledger().signer()
    }

    fn emit(&self, event: StageEvent) {
        if let Some(sender) = &self.events {
            // A dropped receiver only means nobody is listening.
            let _ = sender.send(event);
        }
    }

    /// Advance to `to` when it directly follows the current milestone, then
    /// report the stage as completed with whatever state the workflow holds.
    /// A stage run out of order does not claim the milestones it skipped.
    fn complete(&mut self, stage: Stage, to: WorkflowState) {
        let from = self.state;
        if from.next() == Some(to) {
            tracing::info!(from = ?from, to = ?to, "Workflow state changed");
            self.state = to;
            self.emit(StageEvent::StateChanged { from, to });
        } else if from != to {
            tracing::debug!(
                stage = ?stage,
                state = ?from,
                "Stage completed outside the gated sequence, state unchanged"
            );
        }
        self.emit(StageEvent::StageCompleted {
            stage,
            state: self.state,
        });
    }

    fn finish<T>(&self, stage: Stage, result: Result<T>) -> Result<T> {
        if let Err(err) = &result {
            tracing::error!(stage = ?stage, code = err.error_code(), "Stage failed: {}", err);
            self.emit(StageEvent::StageFailed {
                stage,
                code: err.error_code(),
                message: err.to_string(),
                rerun: err.is_slippage_guard(),
            });
        }
        result
    }

    async fn submit(&self, stage: Stage, call: &ContractCall) -> Result<Receipt> {
        let receipt = self.orchestrator.submit_and_confirm(call).await?;
        self.emit(StageEvent::CallConfirmed {
            stage,
            call: call.to_string(),
            tx_hash: receipt.tx_hash,
            block_number: receipt.block_number,
        });
        Ok(receipt)
    }

    async fn approve(&self, stage: Stage, token: &Erc20, required: Amount, ceiling: Amount) -> Result<()> {
        let outcome = ensure_allowance(
            &self.orchestrator,
            token,
            self.owner(),
            self.contracts.router.address(),
            required,
            ceiling,
        )
        .await?;
        self.emit(StageEvent::AllowanceChecked {
            stage,
            token: token.name().to_string(),
            outcome,
        });
        Ok(())
    }

    async fn balances(&self, pair: &Pair) -> Result<Balances> {
        let ledger = self.ledger();
        let owner = self.owner();
        Ok(Balances {
            token_a: self.contracts.token_a.balance_of(ledger, owner).await?,
            token_b: self.contracts.token_b.balance_of(ledger, owner).await?,
            shares: pair.as_erc20().balance_of(ledger, owner).await?,
        })
    }

    /// The pool for (A, B): resolved by this run or looked up in the factory.
    async fn resolve_pair(&self) -> Result<Pair> {
        if let Some(pair) = &self.pair {
            return Ok(pair.clone());
        }
        let token_a = self.contracts.token_a.address();
        let token_b = self.contracts.token_b.address();
        let address = self
            .contracts
            .factory
            .get_pair(self.ledger(), token_a, token_b)
            .await?
            .ok_or(ProtocolError::PoolNotFound { token_a, token_b })?;
        Ok(self.contracts.pair_at(address))
    }

    /// Connect to the pool for (A, B), creating it through the factory when absent.
    pub async fn provision(&mut self) -> Result<ProvisionReport> {
        self.emit(StageEvent::StageStarted {
            stage: Stage::Provision,
        });
        let result = self.provision_inner().await;
        let report = self.finish(Stage::Provision, result)?;
        self.pair = Some(self.contracts.pair_at(report.pair));
        self.complete(Stage::Provision, WorkflowState::Provisioning);
        Ok(report)
    }

    async fn provision_inner(&self) -> Result<ProvisionReport> {
        let ledger = self.ledger();
        let factory = &self.contracts.factory;
        let token_a = self.contracts.token_a.address();
        let token_b = self.contracts.token_b.address();

        let (address, created, tx_hash) = match factory.get_pair(ledger, token_a, token_b).await? {
            Some(address) => {
                tracing::info!(pair = %address, "Pool already registered");
                (address, false, None)
            }
            None => {
                let receipt = self
                    .submit(Stage::Provision, &factory.create_pair_call(token_a, token_b))
                    .await?;
                let address = find_event(&receipt, &factory.0.interface, PAIR_CREATED)
                    .and_then(|event| event.address_arg("pair"))
                    .ok_or_else(|| ProtocolError::EventNotFound {
                        event: PAIR_CREATED.to_string(),
                        tx_hash: receipt.tx_hash,
                    })?;
                tracing::info!(pair = %address, tx_hash = %receipt.tx_hash, "Pool created");
                (address, true, Some(receipt.tx_hash))
            }
        };

        let registered = factory.get_pair(ledger, token_a, token_b).await?;
        if registered != Some(address) {
            return Err(ProtocolError::VerificationFailed {
                stage: "provision".to_string(),
                message: format!("factory reports {:?} for the pool at {}", registered, address),
            }
            .into());
        }

        let pair = self.contracts.pair_at(address);
        let a_is_first = ordering_of(ledger, &pair, token_a).await?;
        let pool = get_pool(ledger, &pair).await?;

        Ok(ProvisionReport {
            pair: address,
            created,
            tx_hash,
            a_is_first,
            pool,
        })
    }

    /// Approve both assets and deposit them at the current pool price.
    pub async fn settle(&mut self) -> Result<SettlementReport> {
        self.emit(StageEvent::StageStarted {
            stage: Stage::Settle,
        });
        let result = self.settle_inner().await;
        let report = self.finish(Stage::Settle, result)?;
        self.complete(Stage::Settle, WorkflowState::LiquiditySettled);
        Ok(report)
    }

    async fn settle_inner(&self) -> Result<SettlementReport> {
        let stage = Stage::Settle;
        let ledger = self.ledger();
        let owner = self.owner();
        let (token_a, token_b) = (&self.contracts.token_a, &self.contracts.token_b);
        let pair = self.resolve_pair().await?;

        let before = self.balances(&pair).await?;
        let snapshot = get_pool(ledger, &pair).await?;
        let reserves = if snapshot.is_empty() {
            None
        } else {
            Some(snapshot.oriented(token_a.address())?)
        };

        let quote = plan_deposit(
            self.params.deposit_a,
            self.params.deposit_b,
            reserves.as_ref(),
            snapshot.total_supply,
            self.params.deposit_side,
            self.params.slippage,
        )?;
        tracing::info!(
            amount_a = quote.amount_a,
            amount_b = quote.amount_b,
            min_a = quote.min_a,
            min_b = quote.min_b,
            basis = ?quote.basis,
            "Deposit quoted"
        );
        self.emit(StageEvent::IntentComputed {
            stage,
            intent: TradeIntent::Deposit(quote.clone()),
        });

        self.approve(stage, token_a, quote.amount_a, self.params.approval_ceiling)
            .await?;
        self.approve(stage, token_b, quote.amount_b, self.params.approval_ceiling)
            .await?;

        let call = self.contracts.router.add_liquidity_call(
            token_a.address(),
            token_b.address(),
            quote.amount_a,
            quote.amount_b,
            quote.min_a,
            quote.min_b,
            owner,
        );
        let receipt = self.submit(stage, &call).await?;

        let after = self.balances(&pair).await?;
        let shares_minted = after.shares.saturating_sub(before.shares);
        if shares_minted == 0 {
            return Err(verification(stage, "no pool shares minted"));
        }
        let spent_a = before.token_a.saturating_sub(after.token_a);
        let spent_b = before.token_b.saturating_sub(after.token_b);
        if spent_a > quote.amount_a || spent_b > quote.amount_b {
            return Err(verification(
                stage,
                format!(
                    "deposit took {} / {}, quoted at most {} / {}",
                    spent_a, spent_b, quote.amount_a, quote.amount_b
                ),
            ));
        }
        if shares_minted != quote.expected_shares {
            tracing::warn!(
                expected = quote.expected_shares,
                minted = shares_minted,
                "Minted shares differ from quote"
            );
        }

        Ok(SettlementReport {
            quote,
            tx_hash: receipt.tx_hash,
            before,
            after,
            shares_minted,
            pool: get_pool(ledger, &pair).await?,
        })
    }

    /// Swap the configured amount of A for B through the router.
    pub async fn swap(&mut self) -> Result<SwapReport> {
        self.emit(StageEvent::StageStarted { stage: Stage::Swap });
        let result = self.swap_inner().await;
        let report = self.finish(Stage::Swap, result)?;
        self.complete(Stage::Swap, WorkflowState::Traded);
        Ok(report)
    }

    async fn swap_inner(&self) -> Result<SwapReport> {
        let stage = Stage::Swap;
        let ledger = self.ledger();
        let owner = self.owner();
        let (token_a, token_b) = (&self.contracts.token_a, &self.contracts.token_b);
        let pair = self.resolve_pair().await?;
        let path = [token_a.address(), token_b.address()];
        let amount_in = self.params.swap_amount;

        let snapshot = get_pool(ledger, &pair).await?;
        if snapshot.is_empty() {
            return Err(ProtocolError::QuoteUnavailable {
                reason: "pool has no liquidity".to_string(),
            }
            .into());
        }
        let reserves = snapshot.oriented(token_a.address())?;

        let hops = self
            .contracts
            .router
            .get_amounts_out(ledger, amount_in, &path)
            .await?;
        let mut quote = quote_swap(&path, &hops, self.params.slippage)?;

        let local = calculate_output(
            reserves.reserve_a,
            reserves.reserve_b,
            amount_in,
            self.params.fee_numerator,
            self.params.fee_denominator,
        );
        if quote.min_out > local {
            return Err(ProtocolError::QuoteExceedsPool {
                min_output: quote.min_out,
                pool_output: local,
            }
            .into());
        }
        if local.abs_diff(quote.expected_out) > quote.expected_out.abs_diff(quote.min_out) {
            tracing::warn!(
                router = quote.expected_out,
                local,
                "Router quote diverges from local constant-product output"
            );
        }
        quote.price_impact = Some(calculate_price_impact(
            reserves.reserve_a,
            reserves.reserve_b,
            amount_in,
            quote.expected_out,
        ));

        tracing::info!(
            amount_in,
            expected_out = quote.expected_out,
            min_out = quote.min_out,
            "Swap quoted"
        );
        self.emit(StageEvent::IntentComputed {
            stage,
            intent: TradeIntent::Swap(quote.clone()),
        });

        self.approve(stage, token_a, amount_in, self.params.approval_ceiling)
            .await?;

        let before = self.balances(&pair).await?;
        let call = self.contracts.router.swap_exact_tokens_for_tokens_call(
            amount_in,
            quote.min_out,
            &path,
            owner,
        );
        let receipt = self.submit(stage, &call).await?;

        let after = self.balances(&pair).await?;
        let received = after.token_b.saturating_sub(before.token_b);
        if received < quote.min_out {
            return Err(verification(
                stage,
                format!("received {} below minimum {}", received, quote.min_out),
            ));
        }

        Ok(SwapReport {
            quote,
            tx_hash: receipt.tx_hash,
            before,
            after,
            received,
        })
    }

    /// Withdraw the caller's whole position in proportion to current reserves.
    pub async fn withdraw(&mut self) -> Result<WithdrawalReport> {
        self.emit(StageEvent::StageStarted {
            stage: Stage::Withdraw,
        });
        let result = self.withdraw_inner().await;
        let report = self.finish(Stage::Withdraw, result)?;
        self.complete(Stage::Withdraw, WorkflowState::WithdrawalComplete);
        Ok(report)
    }

    async fn withdraw_inner(&self) -> Result<WithdrawalReport> {
        let stage = Stage::Withdraw;
        let ledger = self.ledger();
        let owner = self.owner();
        let (token_a, token_b) = (&self.contracts.token_a, &self.contracts.token_b);
        let pair = self.resolve_pair().await?;

        let before = self.balances(&pair).await?;
        let snapshot = get_pool(ledger, &pair).await?;
        let position = LiquidityPosition {
            shares: before.shares,
            total_supply: snapshot.total_supply,
        };
        let quote = quote_withdrawal(
            &snapshot.oriented(token_a.address())?,
            &position,
            self.params.slippage,
        )?;
        tracing::info!(
            shares = quote.shares,
            pool_share = position.pool_share(),
            min_a = quote.min_a,
            min_b = quote.min_b,
            "Withdrawal quoted"
        );
        self.emit(StageEvent::IntentComputed {
            stage,
            intent: TradeIntent::Withdrawal(quote.clone()),
        });

        // Share approval covers exactly the position being withdrawn.
        self.approve(stage, &pair.as_erc20(), quote.shares, quote.shares)
            .await?;

        let call = self.contracts.router.remove_liquidity_call(
            token_a.address(),
            token_b.address(),
            quote.shares,
            quote.min_a,
            quote.min_b,
            owner,
        );
        let receipt = self.submit(stage, &call).await?;

        let after = self.balances(&pair).await?;
        let received_a = after.token_a.saturating_sub(before.token_a);
        let received_b = after.token_b.saturating_sub(before.token_b);
        if before.shares.saturating_sub(after.shares) != quote.shares {
            return Err(verification(stage, "position was not fully redeemed"));
        }
        if received_a < quote.min_a || received_b < quote.min_b {
            return Err(verification(
                stage,
                format!(
                    "received {} / {}, below minimums {} / {}",
                    received_a, received_b, quote.min_a, quote.min_b
                ),
            ));
        }

        Ok(WithdrawalReport {
            quote,
            tx_hash: receipt.tx_hash,
            before,
            after,
            received_a,
            received_b,
        })
    }

    /// Swap, then withdraw the whole position.
    pub async fn trade(&mut self) -> Result<TradeReport> {
        let swap = self.swap().await?;
        let withdrawal = self.withdraw().await?;
        Ok(TradeReport { swap, withdrawal })
    }

    /// All stages in order; the first failure halts the run.
    pub async fn run(&mut self) -> Result<RunReport> {
        let provision = self.provision().await?;
        let settlement = self.settle().await?;
        let trade = self.trade().await?;
        Ok(RunReport {
            provision,
            settlement,
            trade,
        })
    }
}

fn verification(stage: Stage, message: impl Into<String>) -> Error {
    let stage = match stage {
        Stage::Provision => "provision",
        Stage::Settle => "settle",
        Stage::Swap => "swap",
        Stage::Withdraw => "withdraw",
    };
    ProtocolError::VerificationFailed {
        stage: stage.to_string(),
        message: message.into(),
    }
    .into()
}
