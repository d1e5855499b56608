//! JSON-RPC ledger backed by an alloy HTTP provider and a local signer.

use std::time::Duration;

use alloy::dyn_abi::DynSolValue;
use alloy::eips::BlockId;
use alloy::network::{ReceiptResponse, TransactionBuilder};
use alloy::primitives::{Address, TxHash};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use alloy::signers::local::PrivateKeySigner;
use alloy::sol_types::decode_revert_reason;
use alloy::transports::TransportError;
use lpflow_core::{LedgerConfig, LedgerError};

use crate::{timed_request, with_timeout, ContractCall, Ledger, LogEntry, Receipt, Result};

/// Remote ledger reached over JSON-RPC
#[derive(Clone)]
pub struct RpcLedger {
    provider: DynProvider,
    signer: Address,
    url: String,
    request_timeout: Duration,
}

impl std::fmt::Debug for RpcLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcLedger")
            .field("url", &self.url)
            .field("signer", &self.signer)
            .finish_non_exhaustive()
    }
}

impl RpcLedger {
    /// Connect to the endpoint and bind the signing key.
    ///
    /// `signing_key` is a hex private key; it is never logged or echoed in errors.
    pub async fn connect(config: &LedgerConfig, signing_key: &str) -> Result<Self> {
        let wallet: PrivateKeySigner =
            signing_key
                .trim()
                .parse()
                .map_err(|_| LedgerError::InvalidArguments {
                    function: "signer".to_string(),
                    message: format!("{} does not hold a valid private key", config.key_env),
                })?;
        let signer = wallet.address();
        let request_timeout = Duration::from_secs(config.request_timeout_secs);

        let provider = ProviderBuilder::new()
            .wallet(wallet)
            .connect(&config.url)
            .await
            .map_err(|e| LedgerError::Unreachable {
                url: format!("{}: {}", config.url, e),
            })?
            .erased();

        let ledger = Self {
            provider,
            signer,
            url: config.url.clone(),
            request_timeout,
        };

        let chain_id =
            timed_request("eth_chainId", request_timeout, ledger.provider.get_chain_id()).await?;
        if let Some(expected) = config.chain_id {
            if chain_id != expected {
                return Err(LedgerError::ApiError {
                    message: format!("connected to chain {}, expected {}", chain_id, expected),
                });
            }
        }

        tracing::info!(url = %ledger.url, chain_id, signer = %signer, "Connected to ledger");
        Ok(ledger)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn request(&self, call: &ContractCall) -> Result<TransactionRequest> {
        let input = call.calldata()?;
        Ok(TransactionRequest::default()
            .with_from(self.signer)
            .with_to(call.contract)
            .with_input(input))
    }
}

impl Ledger for RpcLedger {
    fn signer(&self) -> Address {
        self.signer
    }

    async fn block_number(&self) -> Result<u64> {
        timed_request(
            "eth_blockNumber",
            self.request_timeout,
            self.provider.get_block_number(),
        )
        .await
    }

    async fn read(&self, call: &ContractCall) -> Result<Vec<DynSolValue>> {
        let tx = self.request(call)?;
        let operation = call.to_string();

        let output = with_timeout(&operation, self.request_timeout, self.provider.call(tx))
            .await?
            .map_err(|e| LedgerError::ApiError {
                message: format!("{}: {}", operation, describe_error(&e)),
            })?;

        tracing::debug!(call = %call, bytes = output.len(), "Read");
        call.interface
            .decode_output(&call.function, &call.args, &output)
    }

    async fn next_nonce(&self) -> Result<u64> {
        timed_request(
            "eth_getTransactionCount",
            self.request_timeout,
            self.provider.get_transaction_count(self.signer).pending(),
        )
        .await
    }

    async fn submit(&self, call: &ContractCall, nonce: u64) -> Result<TxHash> {
        let tx = self.request(call)?.with_nonce(nonce);
        let operation = call.to_string();

        // Gas estimation runs here, so a call that would revert is refused
        // before it is ever broadcast.
        let pending = with_timeout(&operation, self.request_timeout, self.provider.send_transaction(tx))
            .await?
            .map_err(|e| match revert_reason(&e) {
                Some(reason) => LedgerError::Rejected { reason },
                None => LedgerError::ApiError {
                    message: format!("{}: {}", operation, e),
                },
            })?;

        Ok(*pending.tx_hash())
    }

    async fn receipt(&self, tx_hash: TxHash) -> Result<Option<Receipt>> {
        let receipt = timed_request(
            "eth_getTransactionReceipt",
            self.request_timeout,
            self.provider.get_transaction_receipt(tx_hash),
        )
        .await?;

        let Some(receipt) = receipt else {
            return Ok(None);
        };
        let Some(block_number) = receipt.block_number else {
            // Receipts without a block are still pending on some nodes.
            return Ok(None);
        };

        let logs = receipt
            .inner
            .logs()
            .iter()
            .map(|log| LogEntry {
                address: log.inner.address,
                topics: log.inner.data.topics().to_vec(),
                data: log.inner.data.data.clone(),
            })
            .collect();

        Ok(Some(Receipt {
            tx_hash,
            block_number,
            success: receipt.status(),
            logs,
        }))
    }

    async fn revert_reason(&self, call: &ContractCall, block_number: u64) -> Option<String> {
        // Replay against the state the call saw: the parent of its block.
        let tx = self.request(call).ok()?;
        let parent = BlockId::number(block_number.saturating_sub(1));
        let replay = with_timeout(
            "revert replay",
            self.request_timeout,
            self.provider.call(tx).block(parent),
        )
        .await
        .ok()?;

        match replay {
            Ok(_) => None,
            Err(e) => revert_reason(&e),
        }
    }
}

/// Decoded `Error(string)` payload, or the node's message for execution reverts.
fn revert_reason(err: &TransportError) -> Option<String> {
    let payload = err.as_error_resp()?;
    if let Some(reason) = payload
        .as_revert_data()
        .and_then(|data| decode_revert_reason(&data))
    {
        return Some(reason);
    }
    let message = payload.message.to_string();
    message.contains("revert").then_some(message)
}

fn describe_error(err: &TransportError) -> String {
    revert_reason(err).unwrap_or_else(|| err.to_string())
}
