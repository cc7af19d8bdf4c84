use alloy::json_abi::Function;
use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::contract::MethodHandle;
use crate::dispatcher::Submission;
use crate::domain::{CategoryCode, EventRecord, FailureCode, ProviderHandle};
use crate::state::StateWriter;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PortError {
    #[error("port not implemented: {0}")]
    NotImplemented(&'static str),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("policy error: {0}")]
    Policy(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssistError {
    #[error("{code}: {reason}")]
    Fatal { code: FailureCode, reason: String },
    #[error(transparent)]
    Port(#[from] PortError),
}

impl AssistError {
    pub fn fatal(code: FailureCode, reason: impl Into<String>) -> Self {
        Self::Fatal {
            code,
            reason: reason.into(),
        }
    }

    pub fn from_code(code: FailureCode) -> Self {
        Self::fatal(code, code.default_reason())
    }

    pub fn code(&self) -> Option<FailureCode> {
        match self {
            Self::Fatal { code, .. } => Some(*code),
            Self::Port(_) => None,
        }
    }

    pub fn reason(&self) -> String {
        match self {
            Self::Fatal { reason, .. } => reason.clone(),
            Self::Port(e) => e.to_string(),
        }
    }
}

/// Node-style completion handler: receives exactly one settlement.
pub type Callback = Box<dyn FnOnce(Result<Value, AssistError>) + Send>;

pub type DismissHook = Box<dyn FnOnce() + Send>;

#[derive(Default)]
pub struct InteractiveHandlers {
    pub on_dismiss: Option<DismissHook>,
}

impl InteractiveHandlers {
    pub fn on_dismiss(hook: impl FnOnce() + Send + 'static) -> Self {
        Self {
            on_dismiss: Some(Box::new(hook)),
        }
    }
}

impl std::fmt::Debug for InteractiveHandlers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InteractiveHandlers")
            .field("on_dismiss", &self.on_dismiss.is_some())
            .finish()
    }
}

#[async_trait]
pub trait EnvironmentCheckPort: Send + Sync {
    async fn check_environment(&self) -> Result<(), AssistError>;
}

#[async_trait]
pub trait PreparePort: Send + Sync {
    async fn prepare_for_transaction(&self, category: CategoryCode) -> Result<Value, AssistError>;
}

pub trait HostPort: Send + Sync {
    /// Provider injected by the host environment, if any.
    fn ambient_provider(&self) -> Option<ProviderHandle>;
}

/// Single-call primitives used when a wrapped method is invoked directly.
#[async_trait]
pub trait InvocationPort: Send + Sync {
    /// Direct call of a `0.x` contract method, its callback form bridged
    /// to a future.
    async fn legacy_invoke(
        &self,
        handle: &MethodHandle,
        entry: &Function,
        args: Vec<Value>,
    ) -> Result<Value, PortError>;

    /// Direct call of a `methods.<name>(...)` entry on a `1.x` contract.
    /// Adapters whose transport does not differ per generation may share
    /// one body with [`InvocationPort::legacy_invoke`].
    async fn modern_invoke(
        &self,
        handle: &MethodHandle,
        entry: &Function,
        args: Vec<Value>,
    ) -> Result<Value, PortError>;
}

#[async_trait]
pub trait ProviderPort: Send + Sync {
    /// Read-only contract call.
    async fn call(
        &self,
        handle: &MethodHandle,
        args: &[Value],
        tx_object: Option<&Value>,
        default_block: Option<&Value>,
    ) -> Result<Value, PortError>;

    /// State-changing contract call.
    async fn send_contract_transaction(
        &self,
        handle: &MethodHandle,
        args: &[Value],
        tx_object: &Value,
    ) -> Result<Value, PortError>;

    /// Plain `eth.sendTransaction` for both provider generations. The
    /// legacy callback form is bridged by the adapter, so
    /// [`crate::SendKind::Legacy`] and [`crate::SendKind::Modern`] only tag
    /// the submission.
    async fn send_transaction(&self, tx_object: &Value) -> Result<Value, PortError>;
}

/// Owns queueing, persistence and lifecycle telemetry of a submission.
#[async_trait]
pub trait SubmissionPort: Send + Sync {
    async fn submit(&self, submission: Submission) -> Result<Value, AssistError>;
}

pub trait NotifierPort: Send + Sync {
    fn notify(&self, event: EventRecord, handlers: Option<InteractiveHandlers>);
}

/// Refreshes one or more environment flags. Must be safe to re-run.
#[async_trait]
pub trait Detector: Send + Sync {
    fn name(&self) -> &'static str;

    async fn detect(&self, state: &StateWriter) -> Result<(), PortError>;
}
