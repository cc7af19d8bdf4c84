//! Process-wide environment record.
//!
//! Writes go through [`StateWriter`], which is only handed to the
//! initialization sequencer, detectors, provider configuration, the
//! submission collaborator and the interactive readiness path. Everything
//! else reads through [`StateReader`].

use std::sync::{Arc, RwLock};

use alloy::primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{AssistConfig, CategoryCode, ProviderGeneration, ProviderHandle};
use crate::ports::PortError;

/// A submission handed to the wallet and not yet settled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingTransaction {
    pub id: u64,
    pub category: CategoryCode,
    pub tx_object: Value,
    pub method_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentState {
    pub version: String,
    pub config: Option<AssistConfig>,
    pub mobile_device: bool,
    pub valid_browser: bool,
    pub web3_wallet: bool,
    pub access_to_accounts: bool,
    pub legacy_wallet: bool,
    pub modern_wallet: bool,
    pub wallet_logged_in: bool,
    pub wallet_enabled: bool,
    pub correct_network: bool,
    pub minimum_balance: bool,
    /// Unknown until the backend rejects the network.
    pub supported_network: bool,
    /// Unknown until the backend rejects the key.
    pub valid_api_key: bool,
    pub legacy_web3: bool,
    pub modern_web3: bool,
    pub web3_instance: Option<ProviderHandle>,
    pub current_network: Option<u64>,
    pub accounts: Vec<Address>,
    pub account_balance: Option<U256>,
    /// Transactions awaiting approval; entries leave once the send settles.
    pub transaction_queue: Vec<PendingTransaction>,
}

impl Default for EnvironmentState {
    fn default() -> Self {
        Self {
            version: String::new(),
            config: None,
            mobile_device: false,
            valid_browser: false,
            web3_wallet: false,
            access_to_accounts: false,
            legacy_wallet: false,
            modern_wallet: false,
            wallet_logged_in: false,
            wallet_enabled: false,
            correct_network: false,
            minimum_balance: false,
            supported_network: true,
            valid_api_key: true,
            legacy_web3: false,
            modern_web3: false,
            web3_instance: None,
            current_network: None,
            accounts: Vec::new(),
            account_balance: None,
            transaction_queue: Vec::new(),
        }
    }
}

impl EnvironmentState {
    pub fn provider_generation(&self) -> Option<ProviderGeneration> {
        if self.legacy_web3 {
            Some(ProviderGeneration::Legacy)
        } else if self.modern_web3 {
            Some(ProviderGeneration::Modern)
        } else {
            None
        }
    }

    pub fn mobile_blocked(&self) -> bool {
        self.config.as_ref().is_some_and(|c| c.mobile_blocked)
    }

    pub fn headless_mode(&self) -> bool {
        self.config.as_ref().is_some_and(|c| c.headless_mode)
    }

    /// Mobile device whose configuration lets it transact untouched.
    pub fn mobile_passthrough(&self) -> bool {
        self.mobile_device && !self.mobile_blocked()
    }
}

#[derive(Debug, Clone)]
pub struct StateReader {
    inner: Arc<RwLock<EnvironmentState>>,
}

impl StateReader {
    pub fn read<T>(&self, f: impl FnOnce(&EnvironmentState) -> T) -> Result<T, PortError> {
        let g = self
            .inner
            .read()
            .map_err(|e| PortError::Transport(format!("state lock poisoned: {e}")))?;
        Ok(f(&g))
    }

    pub fn snapshot(&self) -> Result<EnvironmentState, PortError> {
        self.read(EnvironmentState::clone)
    }
}

#[derive(Debug, Clone, Default)]
pub struct StateWriter {
    inner: Arc<RwLock<EnvironmentState>>,
}

impl StateWriter {
    pub fn new(state: EnvironmentState) -> Self {
        Self {
            inner: Arc::new(RwLock::new(state)),
        }
    }

    pub fn reader(&self) -> StateReader {
        StateReader {
            inner: Arc::clone(&self.inner),
        }
    }

    pub fn update<T>(&self, f: impl FnOnce(&mut EnvironmentState) -> T) -> Result<T, PortError> {
        let mut g = self
            .inner
            .write()
            .map_err(|e| PortError::Transport(format!("state lock poisoned: {e}")))?;
        Ok(f(&mut g))
    }

    pub fn read<T>(&self, f: impl FnOnce(&EnvironmentState) -> T) -> Result<T, PortError> {
        self.reader().read(f)
    }

    pub fn snapshot(&self) -> Result<EnvironmentState, PortError> {
        self.reader().snapshot()
    }
}
