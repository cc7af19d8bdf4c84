use alloy::primitives::{Address, U256};
use rusty_assist_core::ProviderHandle;
use thiserror::Error;

const DESKTOP_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid {var}: {reason}")]
    InvalidVar { var: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssistAdapterConfig {
    /// JSON-RPC endpoint; deterministic mode when `None`.
    pub provider_proxy_url: Option<String>,
    pub rpc_timeout_ms: u64,
    pub chain_id: u64,
    pub balance: U256,
    pub accounts: Vec<Address>,
    pub user_agent: String,
    pub provider_name: String,
    /// Version of the ambient provider; no ambient provider when `None`.
    pub provider_version: Option<String>,
    /// Empty means every chain is supported.
    pub supported_networks: Vec<u64>,
}

impl Default for AssistAdapterConfig {
    fn default() -> Self {
        Self {
            provider_proxy_url: None,
            rpc_timeout_ms: 10_000,
            chain_id: 1,
            balance: U256::from(10u64).pow(U256::from(18u64)),
            accounts: vec![Address::with_last_byte(1)],
            user_agent: DESKTOP_USER_AGENT.to_owned(),
            provider_name: "web3".to_owned(),
            provider_version: Some("1.0.0".to_owned()),
            supported_networks: vec![1, 3, 4, 5, 42],
        }
    }
}

impl AssistAdapterConfig {
    /// Reads `ASSIST_*` variables over the defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut cfg = Self::default();
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_owned())
                .filter(|v| !v.is_empty())
        };

        if let Some(url) = get("ASSIST_PROVIDER_PROXY_URL") {
            cfg.provider_proxy_url = Some(url);
        }
        if let Some(raw) = get("ASSIST_RPC_TIMEOUT_MS") {
            cfg.rpc_timeout_ms = parse_u64("ASSIST_RPC_TIMEOUT_MS", &raw)?;
        }
        if let Some(raw) = get("ASSIST_CHAIN_ID") {
            cfg.chain_id = parse_u64("ASSIST_CHAIN_ID", &raw)?;
        }
        if let Some(raw) = get("ASSIST_BALANCE_WEI") {
            cfg.balance = raw.parse().map_err(|e| ConfigError::InvalidVar {
                var: "ASSIST_BALANCE_WEI",
                reason: format!("{e}"),
            })?;
        }
        if let Some(raw) = get("ASSIST_ACCOUNTS") {
            cfg.accounts = raw
                .split(',')
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .map(|a| {
                    a.parse::<Address>().map_err(|e| ConfigError::InvalidVar {
                        var: "ASSIST_ACCOUNTS",
                        reason: format!("{a}: {e}"),
                    })
                })
                .collect::<Result<_, _>>()?;
        }
        if let Some(agent) = get("ASSIST_USER_AGENT") {
            cfg.user_agent = agent;
        }
        if let Some(name) = get("ASSIST_PROVIDER_NAME") {
            cfg.provider_name = name;
        }
        if let Some(version) = get("ASSIST_PROVIDER_VERSION") {
            cfg.provider_version = if version.eq_ignore_ascii_case("none") {
                None
            } else {
                Some(version)
            };
        }
        if let Some(raw) = get("ASSIST_SUPPORTED_NETWORKS") {
            cfg.supported_networks = raw
                .split(',')
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(|n| parse_u64("ASSIST_SUPPORTED_NETWORKS", n))
                .collect::<Result<_, _>>()?;
        }
        Ok(cfg)
    }

    pub fn ambient_provider(&self) -> Option<ProviderHandle> {
        self.provider_version
            .as_ref()
            .map(|v| ProviderHandle::new(self.provider_name.clone(), v.clone()))
    }

    pub fn network_supported(&self, chain_id: u64) -> bool {
        self.supported_networks.is_empty() || self.supported_networks.contains(&chain_id)
    }
}

fn parse_u64(var: &'static str, raw: &str) -> Result<u64, ConfigError> {
    let parsed = match raw.strip_prefix("0x") {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => raw.parse(),
    };
    parsed.map_err(|e| ConfigError::InvalidVar {
        var,
        reason: format!("{raw}: {e}"),
    })
}
