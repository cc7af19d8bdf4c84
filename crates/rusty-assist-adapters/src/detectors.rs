//! Environment detectors.
//!
//! Each detector refreshes a slice of the environment record and can be
//! re-run at any time. [`DetectorChain`] runs them in order and is what the
//! core calls as its environment check.

use std::sync::Arc;

use async_trait::async_trait;

use rusty_assist_core::{
    detect_generation, AssistError, Detector, EnvironmentCheckPort, HostPort, PortError,
    ProviderGeneration, StateWriter,
};

use crate::{AssistAdapterConfig, Eip1193Adapter};

const MOBILE_MARKERS: [&str; 6] = ["Android", "iPhone", "iPad", "iPod", "Mobile", "Opera Mini"];
const SUPPORTED_BROWSERS: [&str; 2] = ["Chrome/", "Firefox/"];

/// Mobile device and browser support from the user agent.
#[derive(Debug, Clone)]
pub struct UserAgentDetector {
    user_agent: String,
}

impl UserAgentDetector {
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
        }
    }

    pub fn is_mobile(&self) -> bool {
        MOBILE_MARKERS.iter().any(|m| self.user_agent.contains(m))
    }

    /// Only desktop Chrome and Firefox builds host the wallet extensions.
    pub fn is_supported_browser(&self) -> bool {
        !self.is_mobile() && SUPPORTED_BROWSERS.iter().any(|b| self.user_agent.contains(b))
    }
}

#[async_trait]
impl Detector for UserAgentDetector {
    fn name(&self) -> &'static str {
        "user_agent"
    }

    async fn detect(&self, state: &StateWriter) -> Result<(), PortError> {
        let mobile = self.is_mobile();
        let supported = self.is_supported_browser();
        state.update(|s| {
            s.mobile_device = mobile;
            s.valid_browser = supported;
        })
    }
}

/// Wallet presence and generation.
pub struct WalletDetector {
    host: Arc<dyn HostPort>,
}

impl WalletDetector {
    pub fn new(host: Arc<dyn HostPort>) -> Self {
        Self { host }
    }
}

#[async_trait]
impl Detector for WalletDetector {
    fn name(&self) -> &'static str {
        "wallet"
    }

    async fn detect(&self, state: &StateWriter) -> Result<(), PortError> {
        let (configured, generation) =
            state.read(|s| (s.web3_instance.is_some(), s.provider_generation()))?;
        let ambient = self.host.ambient_provider();
        let generation = match (generation, &ambient) {
            (Some(g), _) => Some(g),
            (None, Some(handle)) => Some(detect_generation(&handle.version)?),
            (None, None) => None,
        };
        let present = configured || ambient.is_some();
        state.update(|s| {
            s.web3_wallet = present;
            s.legacy_wallet = present && generation == Some(ProviderGeneration::Legacy);
            s.modern_wallet = present && generation == Some(ProviderGeneration::Modern);
        })
    }
}

/// Account access, login and enable status.
#[derive(Debug, Clone)]
pub struct AccountDetector {
    provider: Arc<Eip1193Adapter>,
}

impl AccountDetector {
    pub fn new(provider: Arc<Eip1193Adapter>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl Detector for AccountDetector {
    fn name(&self) -> &'static str {
        "accounts"
    }

    async fn detect(&self, state: &StateWriter) -> Result<(), PortError> {
        if !state.read(|s| s.web3_wallet)? {
            return state.update(|s| {
                s.accounts.clear();
                s.access_to_accounts = false;
                s.wallet_logged_in = false;
                s.wallet_enabled = false;
            });
        }
        let accounts = self.provider.accounts().await?;
        let enabled = self.provider.is_enabled()?;
        let logged_in = !accounts.is_empty();
        state.update(|s| {
            s.access_to_accounts = logged_in && enabled;
            s.wallet_logged_in = logged_in;
            s.wallet_enabled = enabled;
            s.accounts = accounts;
        })
    }
}

/// Current chain against the supported set and the configured network.
#[derive(Debug, Clone)]
pub struct NetworkDetector {
    provider: Arc<Eip1193Adapter>,
    config: Arc<AssistAdapterConfig>,
}

impl NetworkDetector {
    pub fn new(provider: Arc<Eip1193Adapter>, config: Arc<AssistAdapterConfig>) -> Self {
        Self { provider, config }
    }
}

#[async_trait]
impl Detector for NetworkDetector {
    fn name(&self) -> &'static str {
        "network"
    }

    async fn detect(&self, state: &StateWriter) -> Result<(), PortError> {
        if !state.read(|s| s.web3_wallet)? {
            return state.update(|s| {
                s.current_network = None;
                s.correct_network = false;
            });
        }
        let chain_id = self.provider.chain_id().await?;
        let supported = self.config.network_supported(chain_id);
        if !supported {
            tracing::warn!(chain_id, "connected to an unsupported network");
        }
        state.update(|s| {
            let expected = s.config.as_ref().and_then(|c| c.network_id);
            s.current_network = Some(chain_id);
            s.supported_network = supported;
            s.correct_network = expected.map_or(true, |n| n == chain_id);
        })
    }
}

/// Balance of the first account against the configured minimum.
#[derive(Debug, Clone)]
pub struct BalanceDetector {
    provider: Arc<Eip1193Adapter>,
}

impl BalanceDetector {
    pub fn new(provider: Arc<Eip1193Adapter>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl Detector for BalanceDetector {
    fn name(&self) -> &'static str {
        "balance"
    }

    async fn detect(&self, state: &StateWriter) -> Result<(), PortError> {
        let account = state.read(|s| s.accounts.first().copied())?;
        let balance = match account {
            Some(account) => Some(self.provider.balance(account).await?),
            None => None,
        };
        state.update(|s| {
            let minimum = s.config.as_ref().and_then(|c| c.minimum_balance);
            s.account_balance = balance;
            s.minimum_balance = match (minimum, balance) {
                (None, _) => true,
                (Some(min), Some(have)) => have >= min,
                (Some(_), None) => false,
            };
        })
    }
}

/// Runs detectors in order; stops at the first failing one.
pub struct DetectorChain {
    state: StateWriter,
    detectors: Vec<Arc<dyn Detector>>,
}

impl DetectorChain {
    pub fn new(state: StateWriter, detectors: Vec<Arc<dyn Detector>>) -> Self {
        Self { state, detectors }
    }

    /// User agent, wallet, accounts, network, balance.
    pub fn standard(
        state: StateWriter,
        provider: Arc<Eip1193Adapter>,
        config: &AssistAdapterConfig,
    ) -> Self {
        let detectors: Vec<Arc<dyn Detector>> = vec![
            Arc::new(UserAgentDetector::new(config.user_agent.clone())),
            Arc::new(WalletDetector::new(provider.clone())),
            Arc::new(AccountDetector::new(Arc::clone(&provider))),
            Arc::new(NetworkDetector::new(
                Arc::clone(&provider),
                Arc::new(config.clone()),
            )),
            Arc::new(BalanceDetector::new(provider)),
        ];
        Self::new(state, detectors)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.detectors.iter().map(|d| d.name()).collect()
    }
}

#[async_trait]
impl EnvironmentCheckPort for DetectorChain {
    async fn check_environment(&self) -> Result<(), AssistError> {
        for detector in &self.detectors {
            if let Err(e) = detector.detect(&self.state).await {
                tracing::warn!(detector = detector.name(), error = %e, "environment detector failed");
                return Err(e.into());
            }
        }
        tracing::debug!(detectors = self.detectors.len(), "environment refreshed");
        Ok(())
    }
}
