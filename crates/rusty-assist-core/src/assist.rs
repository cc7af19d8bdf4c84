use std::sync::Arc;

use serde_json::Value;

use crate::contract::{AdaptedContract, ContractAdapter, ContractDescriptor, ContractRuntime};
use crate::dispatcher::TransactionDispatcher;
use crate::domain::{AssistConfig, CategoryCode, EventCode, EventRecord, FailureCode};
use crate::ports::{
    AssistError, Callback, EnvironmentCheckPort, HostPort, InvocationPort, NotifierPort,
    PreparePort, ProviderPort, SubmissionPort,
};
use crate::provider::ProviderConfigurator;
use crate::readiness::ReadinessEvaluator;
use crate::state::{EnvironmentState, StateReader, StateWriter};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// External collaborators wired in by `init`.
#[derive(Clone)]
pub struct Collaborators {
    pub environment: Arc<dyn EnvironmentCheckPort>,
    pub prepare: Arc<dyn PreparePort>,
    pub host: Arc<dyn HostPort>,
    pub invocation: Arc<dyn InvocationPort>,
    pub provider: Arc<dyn ProviderPort>,
    pub submission: Arc<dyn SubmissionPort>,
    pub notifier: Arc<dyn NotifierPort>,
}

/// The initialized API surface: `onboard`, `Contract`, `Transaction` and
/// `getState`.
pub struct Assist {
    state: StateReader,
    environment: Arc<dyn EnvironmentCheckPort>,
    readiness: ReadinessEvaluator,
    contracts: ContractAdapter,
    dispatcher: Arc<TransactionDispatcher>,
}

impl Assist {
    /// Validates `config`, records it in `state` and runs the environment
    /// detectors.
    ///
    /// Configuration failures are both notified and returned.
    pub async fn init(
        config: Option<AssistConfig>,
        state: StateWriter,
        collaborators: Collaborators,
    ) -> Result<Self, AssistError> {
        let Collaborators {
            environment,
            prepare,
            host,
            invocation,
            provider,
            submission,
            notifier,
        } = collaborators;

        state.update(|s| s.version = VERSION.to_owned())?;

        let Some(config) = config else {
            return Err(init_fail(
                notifier.as_ref(),
                "A config object is needed to initialize assist",
            ));
        };
        if !config.has_dapp_id() {
            state.update(|s| s.valid_api_key = false)?;
            return Err(init_fail(
                notifier.as_ref(),
                "No API key provided to init function",
            ));
        }

        let providers = ProviderConfigurator::new(state.clone(), Arc::clone(&host));
        let explicit = config.web3.clone();
        state.update(|s| s.config = Some(config))?;

        if explicit.is_some() || providers.has_ambient() {
            providers
                .configure(explicit)
                .map_err(|e| init_fail(notifier.as_ref(), &e.reason()))?;
        } else {
            tracing::info!("no web3 provider available at init");
            state.update(|s| s.web3_wallet = false)?;
        }

        if let Err(e) = environment.check_environment().await {
            tracing::warn!(error = %e, "environment check failed during init");
        }

        let snapshot = state.snapshot()?;
        let mut event = EventRecord::new(EventCode::InitState, CategoryCode::Initialize);
        match serde_json::to_value(&snapshot) {
            Ok(value) => event = event.with_state(value),
            Err(e) => tracing::warn!(error = %e, "state snapshot not serializable"),
        }
        notifier.notify(event, None);
        tracing::info!(
            version = VERSION,
            mobile = snapshot.mobile_device,
            headless = snapshot.headless_mode(),
            "assist initialized"
        );

        let reader = state.reader();
        let dispatcher = Arc::new(TransactionDispatcher::new(
            reader.clone(),
            providers.clone(),
            Arc::clone(&provider),
            submission,
        ));
        let runtime = Arc::new(ContractRuntime::new(
            invocation,
            provider,
            Arc::clone(&notifier),
            Arc::clone(&dispatcher),
        ));

        Ok(Self {
            state: reader.clone(),
            environment: Arc::clone(&environment),
            readiness: ReadinessEvaluator::new(state, environment, prepare, notifier),
            contracts: ContractAdapter::new(reader, providers, runtime),
            dispatcher,
        })
    }

    pub async fn onboard(&self) -> Result<Value, AssistError> {
        self.readiness.onboard().await
    }

    pub fn contract(
        &self,
        descriptor: Arc<ContractDescriptor>,
    ) -> Result<AdaptedContract, AssistError> {
        self.contracts.adapt(descriptor)
    }

    pub async fn transaction(
        &self,
        tx_object: Value,
        callback: Option<Callback>,
    ) -> Result<Value, AssistError> {
        self.dispatcher.transaction(tx_object, callback).await
    }

    /// Snapshot of the environment after refreshing it.
    pub async fn get_state(&self) -> Result<EnvironmentState, AssistError> {
        self.environment.check_environment().await?;
        Ok(self.state.snapshot()?)
    }
}

fn init_fail(notifier: &dyn NotifierPort, reason: &str) -> AssistError {
    tracing::error!(reason, "assist init failed");
    notifier.notify(
        EventRecord::new(EventCode::InitFail, CategoryCode::Initialize).with_reason(reason),
        None,
    );
    AssistError::fatal(FailureCode::InitFail, reason)
}
