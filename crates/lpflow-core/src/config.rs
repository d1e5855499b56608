//! Configuration types for lpflow

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{constants, DepositSide, Error, Result};

/// Remote ledger connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// JSON-RPC endpoint (e.g., "http://127.0.0.1:8545")
    pub url: String,

    /// Expected chain id; checked on connect when set
    #[serde(default)]
    pub chain_id: Option<u64>,

    /// Timeout applied to every remote read
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Environment variable holding the signing key
    #[serde(default = "default_key_env")]
    pub key_env: String,
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_key_env() -> String {
    "PRIVATE_KEY".to_string()
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:8545".to_string(),
            chain_id: None,
            request_timeout_secs: default_request_timeout_secs(),
            key_env: default_key_env(),
        }
    }
}

/// How long and how deep to wait for each submitted call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmationConfig {
    /// Blocks (including the inclusion block) before a call counts as final
    #[serde(default = "default_confirmations")]
    pub confirmations: u64,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    #[serde(default = "default_confirmation_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_confirmations() -> u64 {
    1
}

fn default_poll_interval_ms() -> u64 {
    1_000
}

fn default_confirmation_timeout_secs() -> u64 {
    120
}

impl Default for ConfirmationConfig {
    fn default() -> Self {
        Self {
            confirmations: default_confirmations(),
            poll_interval_ms: default_poll_interval_ms(),
            timeout_secs: default_confirmation_timeout_secs(),
        }
    }
}

/// Locations of the persisted contract artifacts (`{ "address", "abi" }` JSON files)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactConfig {
    pub dir: PathBuf,
    pub token_a: String,
    pub token_b: String,
    pub factory: String,
    pub router: String,
    /// Pair interface; its address is optional and resolved during provisioning
    pub pair: String,
}

impl ArtifactConfig {
    pub fn path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("abis"),
            token_a: "AToken.json".to_string(),
            token_b: "BToken.json".to_string(),
            factory: "UniswapV2Factory.json".to_string(),
            router: "UniswapV2Router02.json".to_string(),
            pair: "UniswapV2Pair.json".to_string(),
        }
    }
}

/// Trade parameters. Amounts are decimal strings scaled by `decimals`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowConfig {
    #[serde(default = "default_decimals")]
    pub decimals: u8,

    /// Slippage tolerance in basis points (100 = 1%)
    #[serde(default = "default_slippage_bps")]
    pub slippage_bps: i32,

    pub deposit_a: String,
    pub deposit_b: String,

    /// Allowance granted whenever the current one is insufficient
    pub approval_ceiling: String,

    pub swap_amount: String,

    #[serde(default)]
    pub deposit_side: DepositSide,

    #[serde(default = "default_fee_numerator")]
    pub fee_numerator: u32,

    #[serde(default = "default_fee_denominator")]
    pub fee_denominator: u32,

    /// Appends `now + deadline_secs` to router calls when set
    #[serde(default)]
    pub deadline_secs: Option<u64>,
}

fn default_decimals() -> u8 {
    constants::DEFAULT_DECIMALS
}

fn default_slippage_bps() -> i32 {
    100
}

fn default_fee_numerator() -> u32 {
    constants::DEFAULT_FEE_NUM
}

fn default_fee_denominator() -> u32 {
    constants::DEFAULT_FEE_DENOM
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            decimals: default_decimals(),
            slippage_bps: default_slippage_bps(),
            deposit_a: "1000".to_string(),
            deposit_b: "1000".to_string(),
            approval_ceiling: "1000".to_string(),
            swap_amount: "100".to_string(),
            deposit_side: DepositSide::default(),
            fee_numerator: default_fee_numerator(),
            fee_denominator: default_fee_denominator(),
            deadline_secs: None,
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub ledger: LedgerConfig,

    #[serde(default)]
    pub confirmation: ConfirmationConfig,

    #[serde(default)]
    pub artifacts: ArtifactConfig,

    #[serde(default)]
    pub workflow: WorkflowConfig,
}

impl AppConfig {
    /// Load a JSON configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|e| Error::Serialization(e.to_string()))
    }
}
