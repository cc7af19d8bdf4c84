use std::sync::Arc;

use serde_json::Value;

use crate::contract::MethodHandle;
use crate::domain::{CategoryCode, FailureCode, ProviderGeneration, TelemetryContext};
use crate::ports::{AssistError, Callback, PortError, ProviderPort, SubmissionPort};
use crate::provider::ProviderConfigurator;
use crate::state::StateReader;

#[derive(Debug, Clone, PartialEq)]
pub enum SendKind {
    /// Legacy `eth.sendTransaction`, bridged from its callback form.
    Legacy,
    /// Modern promise-returning `eth.sendTransaction`.
    Modern,
    /// State-changing call of a contract method.
    Contract {
        handle: MethodHandle,
        args: Vec<Value>,
    },
}

/// Send primitive handed to the submission collaborator.
#[derive(Clone)]
pub struct SendMethod {
    provider: Arc<dyn ProviderPort>,
    kind: SendKind,
}

impl SendMethod {
    pub fn new(provider: Arc<dyn ProviderPort>, kind: SendKind) -> Self {
        Self { provider, kind }
    }

    pub fn for_generation(provider: Arc<dyn ProviderPort>, generation: ProviderGeneration) -> Self {
        let kind = match generation {
            ProviderGeneration::Legacy => SendKind::Legacy,
            ProviderGeneration::Modern => SendKind::Modern,
        };
        Self::new(provider, kind)
    }

    pub fn kind(&self) -> &SendKind {
        &self.kind
    }

    /// Both generations resolve to [`ProviderPort::send_transaction`].
    pub async fn send(&self, tx_object: &Value) -> Result<Value, PortError> {
        match &self.kind {
            SendKind::Legacy | SendKind::Modern => self.provider.send_transaction(tx_object).await,
            SendKind::Contract { handle, args } => {
                self.provider
                    .send_contract_transaction(handle, args, tx_object)
                    .await
            }
        }
    }
}

impl std::fmt::Debug for SendMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SendMethod").field("kind", &self.kind).finish()
    }
}

/// Everything the submission collaborator needs for one transaction.
#[derive(Debug, Clone)]
pub struct Submission {
    pub category: CategoryCode,
    pub tx_object: Value,
    pub send: SendMethod,
    pub method: Option<MethodHandle>,
    pub telemetry: Option<TelemetryContext>,
}

pub struct TransactionRequest {
    pub tx_object: Value,
    pub callback: Option<Callback>,
    pub telemetry: Option<TelemetryContext>,
}

impl TransactionRequest {
    pub fn new(tx_object: Value) -> Self {
        Self {
            tx_object,
            callback: None,
            telemetry: None,
        }
    }
}

/// Hands `outcome` to the callback, if any, and returns it unchanged.
pub(crate) fn settle(
    callback: Option<Callback>,
    outcome: Result<Value, AssistError>,
) -> Result<Value, AssistError> {
    if let Some(cb) = callback {
        cb(outcome.clone());
    }
    outcome
}

pub struct TransactionDispatcher {
    state: StateReader,
    providers: ProviderConfigurator,
    provider: Arc<dyn ProviderPort>,
    submission: Arc<dyn SubmissionPort>,
}

impl TransactionDispatcher {
    pub fn new(
        state: StateReader,
        providers: ProviderConfigurator,
        provider: Arc<dyn ProviderPort>,
        submission: Arc<dyn SubmissionPort>,
    ) -> Self {
        Self {
            state,
            providers,
            provider,
            submission,
        }
    }

    /// The `Transaction` entry point. Precondition failures are returned
    /// without touching the callback.
    pub async fn transaction(
        &self,
        tx_object: Value,
        callback: Option<Callback>,
    ) -> Result<Value, AssistError> {
        let (valid_api_key, supported_network) = self
            .state
            .read(|s| (s.valid_api_key, s.supported_network))?;
        if !valid_api_key {
            return Err(AssistError::fatal(
                FailureCode::InitFail,
                "Your API key is not valid",
            ));
        }
        if !supported_network {
            return Err(AssistError::fatal(
                FailureCode::InitFail,
                "This network is not supported",
            ));
        }
        let generation = self.providers.ensure_instance()?;

        if self.state.read(|s| s.mobile_passthrough())? {
            tracing::debug!("mobile passthrough: sending without bookkeeping");
            let outcome = self
                .provider
                .send_transaction(&tx_object)
                .await
                .map_err(AssistError::from);
            return settle(callback, outcome);
        }

        let send = SendMethod::for_generation(Arc::clone(&self.provider), generation);
        let request = TransactionRequest {
            tx_object,
            callback,
            telemetry: None,
        };
        self.submit(CategoryCode::ActiveTransaction, request, send, None)
            .await
    }

    /// Hands a request to the submission collaborator; the callback mirrors
    /// the settlement.
    pub async fn submit(
        &self,
        category: CategoryCode,
        request: TransactionRequest,
        send: SendMethod,
        method: Option<MethodHandle>,
    ) -> Result<Value, AssistError> {
        let TransactionRequest {
            tx_object,
            callback,
            telemetry,
        } = request;
        tracing::debug!(?category, send = ?send.kind(), "submitting transaction");
        let outcome = self
            .submission
            .submit(Submission {
                category,
                tx_object,
                send,
                method,
                telemetry,
            })
            .await;
        if let Err(e) = &outcome {
            tracing::warn!(?category, error = %e, "transaction submission failed");
        }
        settle(callback, outcome)
    }
}
