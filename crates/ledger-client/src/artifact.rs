//! Contract interface artifacts
//!
//! Each participating contract is described by a persisted JSON document with
//! its deployed address and ABI. The workflow treats these as opaque
//! capabilities: calls are made by function name with typed arguments.

use std::path::Path;
use std::sync::Arc;

use alloy::dyn_abi::{DynSolValue, EventExt, FunctionExt, JsonAbiExt};
use alloy::json_abi::{Function, JsonAbi};
use alloy::primitives::Address;
use lpflow_core::LedgerError;
use serde::Deserialize;

use crate::events::DecodedLog;
use crate::{ContractCall, LogEntry, Result};

#[derive(Debug, Deserialize)]
struct ArtifactFile {
    #[serde(default)]
    address: Option<Address>,
    abi: JsonAbi,
}

/// Named ABI of one contract
#[derive(Debug, Clone)]
pub struct ContractInterface {
    name: String,
    abi: JsonAbi,
}

impl ContractInterface {
    pub fn new(name: impl Into<String>, abi: JsonAbi) -> Self {
        Self {
            name: name.into(),
            abi,
        }
    }

    /// Build an interface from human-readable signatures, e.g.
    /// `"function approve(address spender, uint256 amount) returns (bool)"`.
    pub fn parse(name: impl Into<String>, signatures: &[&str]) -> Result<Self> {
        let name = name.into();
        let abi = JsonAbi::parse(signatures.iter().copied()).map_err(|e| {
            LedgerError::ParseError(format!("{} interface: {}", name, e))
        })?;
        Ok(Self { name, abi })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn abi(&self) -> &JsonAbi {
        &self.abi
    }

    pub fn has_function(&self, name: &str) -> bool {
        self.abi.function(name).is_some_and(|overloads| !overloads.is_empty())
    }

    /// Resolve a function by name, picking the overload whose arity matches.
    pub fn function(&self, name: &str, args: &[DynSolValue]) -> Result<&Function> {
        let overloads = self
            .abi
            .function(name)
            .ok_or_else(|| LedgerError::UnknownFunction {
                contract: self.name.clone(),
                function: name.to_string(),
            })?;

        overloads
            .iter()
            .find(|f| f.inputs.len() == args.len())
            .ok_or_else(|| LedgerError::InvalidArguments {
                function: format!("{}.{}", self.name, name),
                message: format!("no overload takes {} arguments", args.len()),
            })
    }

    pub fn encode_call(&self, name: &str, args: &[DynSolValue]) -> Result<Vec<u8>> {
        let function = self.function(name, args)?;
        function
            .abi_encode_input(args)
            .map_err(|e| LedgerError::InvalidArguments {
                function: format!("{}.{}", self.name, name),
                message: e.to_string(),
            })
    }

    pub fn decode_output(
        &self,
        name: &str,
        args: &[DynSolValue],
        data: &[u8],
    ) -> Result<Vec<DynSolValue>> {
        let function = self.function(name, args)?;
        function.abi_decode_output(data).map_err(|e| {
            LedgerError::ParseError(format!("{}.{} output: {}", self.name, name, e))
        })
    }

    /// Decode a log entry against this interface's events.
    ///
    /// Returns `None` for entries this interface does not describe (other
    /// contracts touched by the same transaction, anonymous events, or
    /// malformed payloads).
    pub fn decode_log(&self, log: &LogEntry) -> Option<DecodedLog> {
        let selector = log.topics.first()?;
        let event = self
            .abi
            .events()
            .find(|e| !e.anonymous && e.selector() == *selector)?;

        let decoded = event
            .decode_log_parts(log.topics.iter().copied(), &log.data)
            .ok()?;

        let mut indexed = decoded.indexed.into_iter();
        let mut body = decoded.body.into_iter();
        let mut args = Vec::with_capacity(event.inputs.len());
        for input in &event.inputs {
            let value = if input.indexed {
                indexed.next()?
            } else {
                body.next()?
            };
            args.push((input.name.clone(), value));
        }

        Some(DecodedLog {
            name: event.name.clone(),
            address: log.address,
            args,
        })
    }
}

/// A contract interface bound to a deployed address
#[derive(Debug, Clone)]
pub struct ContractHandle {
    pub address: Address,
    pub interface: Arc<ContractInterface>,
}

impl ContractHandle {
    pub fn new(address: Address, interface: Arc<ContractInterface>) -> Self {
        Self { address, interface }
    }

    pub fn name(&self) -> &str {
        self.interface.name()
    }

    pub fn call(&self, function: &str, args: Vec<DynSolValue>) -> ContractCall {
        ContractCall {
            contract: self.address,
            interface: self.interface.clone(),
            function: function.to_string(),
            args,
        }
    }
}

/// A loaded artifact file
#[derive(Debug, Clone)]
pub struct ContractArtifact {
    pub address: Option<Address>,
    pub interface: Arc<ContractInterface>,
}

impl ContractArtifact {
    /// Load `{ "address": "0x..", "abi": [...] }`; the contract name is the file stem.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            LedgerError::ParseError(format!("artifact {}: {}", path.display(), e))
        })?;
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("contract")
            .to_string();
        Self::from_json(name, &raw)
    }

    pub fn from_json(name: impl Into<String>, raw: &str) -> Result<Self> {
        let name = name.into();
        let file: ArtifactFile = serde_json::from_str(raw)
            .map_err(|e| LedgerError::ParseError(format!("artifact {}: {}", name, e)))?;
        Ok(Self {
            address: file.address,
            interface: Arc::new(ContractInterface::new(name, file.abi)),
        })
    }

    pub fn name(&self) -> &str {
        self.interface.name()
    }

    /// Bind to the recorded address
    pub fn handle(&self) -> Result<ContractHandle> {
        let address = self.address.ok_or_else(|| {
            LedgerError::ParseError(format!("artifact {} has no address", self.name()))
        })?;
        Ok(self.at(address))
    }

    /// Bind the interface to an address resolved elsewhere (e.g. from an event)
    pub fn at(&self, address: Address) -> ContractHandle {
        ContractHandle::new(address, self.interface.clone())
    }
}
