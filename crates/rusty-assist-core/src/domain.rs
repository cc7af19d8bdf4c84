use std::fmt;

use alloy::primitives::U256;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ports::AssistError;

/// Machine-readable tag carried by every fatal condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FailureCode {
    InitFail,
    MobileBlocked,
    BrowserFail,
    WalletFail,
    WalletLogin,
    WalletLoginEnable,
    WalletEnable,
    NetworkFail,
    NsfFail,
}

impl FailureCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InitFail => "initFail",
            Self::MobileBlocked => "mobileBlocked",
            Self::BrowserFail => "browserFail",
            Self::WalletFail => "walletFail",
            Self::WalletLogin => "walletLogin",
            Self::WalletLoginEnable => "walletLoginEnable",
            Self::WalletEnable => "walletEnable",
            Self::NetworkFail => "networkFail",
            Self::NsfFail => "nsfFail",
        }
    }

    pub fn default_reason(self) -> &'static str {
        match self {
            Self::InitFail => "Assist failed to initialize",
            Self::MobileBlocked => "User is on a mobile device",
            Self::BrowserFail => "User has an invalid browser",
            Self::WalletFail => "User does not have a web3 wallet installed",
            Self::WalletLogin => "User is not logged in to their wallet",
            Self::WalletLoginEnable => "User needs to login to their account",
            Self::WalletEnable => "User has not enabled this website to access their account",
            Self::NetworkFail => "User is on the wrong network",
            Self::NsfFail => "User does not have the minimum balance specified in the config",
        }
    }
}

impl fmt::Display for FailureCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventCode {
    InitFail,
    InitState,
    MobileBlocked,
    ContractQuery,
    BrowserFail,
    WalletFail,
    WalletLogin,
    WalletLoginEnable,
    WalletEnable,
    NetworkFail,
    NsfFail,
    TxRequest,
    TxSent,
    TxPending,
    TxSendFail,
}

impl From<FailureCode> for EventCode {
    fn from(code: FailureCode) -> Self {
        match code {
            FailureCode::InitFail => Self::InitFail,
            FailureCode::MobileBlocked => Self::MobileBlocked,
            FailureCode::BrowserFail => Self::BrowserFail,
            FailureCode::WalletFail => Self::WalletFail,
            FailureCode::WalletLogin => Self::WalletLogin,
            FailureCode::WalletLoginEnable => Self::WalletLoginEnable,
            FailureCode::WalletEnable => Self::WalletEnable,
            FailureCode::NetworkFail => Self::NetworkFail,
            FailureCode::NsfFail => Self::NsfFail,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CategoryCode {
    Initialize,
    Onboard,
    ActiveContract,
    ActiveTransaction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProviderGeneration {
    Legacy,
    Modern,
}

/// Opaque handle to a wallet provider instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderHandle {
    pub name: String,
    /// Provider library version, e.g. `0.20.7` or `1.0.0-beta.36`.
    pub version: String,
}

impl ProviderHandle {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

/// Caller-supplied configuration. Immutable once copied into state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AssistConfig {
    pub dapp_id: Option<String>,
    pub web3: Option<ProviderHandle>,
    pub mobile_blocked: bool,
    pub headless_mode: bool,
    pub network_id: Option<u64>,
    /// Minimum account balance in wei.
    pub minimum_balance: Option<U256>,
}

impl AssistConfig {
    pub fn new(dapp_id: impl Into<String>) -> Self {
        Self {
            dapp_id: Some(dapp_id.into()),
            ..Self::default()
        }
    }

    /// Parses a JSON config; anything but an object is an `initFail`.
    pub fn from_json(value: &Value) -> Result<Self, AssistError> {
        if !value.is_object() {
            return Err(AssistError::fatal(
                FailureCode::InitFail,
                "A config object is needed to initialize assist",
            ));
        }
        serde_json::from_value(value.clone()).map_err(|e| {
            AssistError::fatal(FailureCode::InitFail, format!("invalid assist config: {e}"))
        })
    }

    pub fn has_dapp_id(&self) -> bool {
        self.dapp_id
            .as_deref()
            .is_some_and(|id| !id.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryContext {
    pub method_name: String,
    pub parameters: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractTelemetry {
    pub method_name: String,
    pub parameters: Vec<Value>,
    /// JSON text of the call result; absent when the call failed.
    pub result: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    pub event_code: EventCode,
    pub category_code: CategoryCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract: Option<ContractTelemetry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction: Option<Value>,
}

impl EventRecord {
    pub fn new(event_code: EventCode, category_code: CategoryCode) -> Self {
        Self {
            event_code,
            category_code,
            reason: None,
            state: None,
            contract: None,
            transaction: None,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn with_state(mut self, state: Value) -> Self {
        self.state = Some(state);
        self
    }

    pub fn with_contract(mut self, contract: ContractTelemetry) -> Self {
        self.contract = Some(contract);
        self
    }

    pub fn with_transaction(mut self, transaction: Value) -> Self {
        self.transaction = Some(transaction);
        self
    }
}
