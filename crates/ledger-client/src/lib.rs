//! ledger-client: Contract calls, submission, and confirmation against a remote ledger
//!
//! The [`Ledger`] trait is the single capability the workflow needs from the
//! chain: read-only calls, nonce lookup, submission, and receipt polling. The
//! JSON-RPC implementation lives in [`rpc`]; tests substitute in-memory ledgers.

pub mod artifact;
pub mod events;
pub mod orchestrator;
pub mod rpc;

use std::fmt;
use std::future::{Future, IntoFuture};
use std::sync::Arc;
use std::time::Duration;

use alloy::dyn_abi::DynSolValue;
use alloy::primitives::{Address, Bytes, TxHash, B256};
use lpflow_core::LedgerError;

pub use artifact::{ContractArtifact, ContractHandle, ContractInterface};
pub use events::{decoded_events, find_event, DecodedLog};
pub use orchestrator::{ConfirmationPolicy, TxOrchestrator};
pub use rpc::RpcLedger;

/// Result type for ledger operations
pub type Result<T> = std::result::Result<T, LedgerError>;

/// One contract function invocation with typed arguments.
#[derive(Debug, Clone)]
pub struct ContractCall {
    pub contract: Address,
    pub interface: Arc<ContractInterface>,
    pub function: String,
    pub args: Vec<DynSolValue>,
}

impl ContractCall {
    /// ABI-encoded calldata (selector + arguments)
    pub fn calldata(&self) -> Result<Vec<u8>> {
        self.interface.encode_call(&self.function, &self.args)
    }
}

impl fmt::Display for ContractCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.interface.name(), self.function)
    }
}

/// A raw log entry as emitted by the execution environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
}

/// Outcome of an included call.
#[derive(Debug, Clone)]
pub struct Receipt {
    pub tx_hash: TxHash,
    pub block_number: u64,
    pub success: bool,
    /// Log entries in emission order
    pub logs: Vec<LogEntry>,
}

/// Remote ledger capability used by every workflow component.
///
/// Implementations must not reorder submissions; the orchestrator supplies an
/// explicit nonce for every call.
pub trait Ledger: Send + Sync {
    /// Address of the signing identity
    fn signer(&self) -> Address;

    /// Current head block number
    fn block_number(&self) -> impl Future<Output = Result<u64>> + Send;

    /// Execute a read-only call and decode its outputs
    fn read(&self, call: &ContractCall) -> impl Future<Output = Result<Vec<DynSolValue>>> + Send;

    /// Next unused ordinal of the signing identity
    fn next_nonce(&self) -> impl Future<Output = Result<u64>> + Send;

    /// Sign and submit a state-changing call. `LedgerError::Rejected` means the
    /// call never reached the ledger.
    fn submit(
        &self,
        call: &ContractCall,
        nonce: u64,
    ) -> impl Future<Output = Result<TxHash>> + Send;

    /// Receipt of a submitted call, `None` while it is still pending
    fn receipt(&self, tx_hash: TxHash) -> impl Future<Output = Result<Option<Receipt>>> + Send;

    /// Best-effort revert reason for a call that was included but failed
    fn revert_reason(
        &self,
        call: &ContractCall,
        block_number: u64,
    ) -> impl Future<Output = Option<String>> + Send;
}

/// Apply a request timeout to a remote operation, mapping both the timeout
/// and the transport error into [`LedgerError`].
pub async fn timed_request<T, E, F>(operation: &str, timeout: Duration, fut: F) -> Result<T>
where
    F: IntoFuture<Output = std::result::Result<T, E>>,
    E: fmt::Display,
{
    with_timeout(operation, timeout, fut)
        .await?
        .map_err(|e| LedgerError::ApiError {
            message: format!("{}: {}", operation, e),
        })
}

/// Like [`timed_request`] but leaves the inner result untouched.
pub async fn with_timeout<F>(operation: &str, timeout: Duration, fut: F) -> Result<F::Output>
where
    F: IntoFuture,
{
    tokio::time::timeout(timeout, fut.into_future())
        .await
        .map_err(|_| LedgerError::Timeout {
            operation: operation.to_string(),
            secs: timeout.as_secs(),
        })
}
