use std::sync::Arc;

use rusty_assist_core::{
    Assist, AssistConfig, AssistError, Collaborators, EnvironmentCheckPort, NotifierPort,
    PreparePort, StateWriter,
};

use crate::{AssistAdapterConfig, DetectorChain, Eip1193Adapter, PrepareAdapter, SubmissionAdapter};

/// An initialized [`Assist`] wired to the provider adapter, the standard
/// detectors and the queueing submission collaborator.
pub struct AssistRuntime {
    pub assist: Assist,
    pub state: StateWriter,
    pub provider: Arc<Eip1193Adapter>,
}

impl AssistRuntime {
    pub async fn start(
        adapter_config: AssistAdapterConfig,
        assist_config: Option<AssistConfig>,
        notifier: Arc<dyn NotifierPort>,
    ) -> Result<Self, AssistError> {
        let provider = Arc::new(Eip1193Adapter::with_config(adapter_config.clone()));
        Self::start_with_provider(provider, &adapter_config, assist_config, notifier).await
    }

    /// Like [`AssistRuntime::start`] but reuses an existing provider, so
    /// callers can keep injecting wallet changes into it.
    pub async fn start_with_provider(
        provider: Arc<Eip1193Adapter>,
        adapter_config: &AssistAdapterConfig,
        assist_config: Option<AssistConfig>,
        notifier: Arc<dyn NotifierPort>,
    ) -> Result<Self, AssistError> {
        let state = StateWriter::default();
        let environment: Arc<dyn EnvironmentCheckPort> = Arc::new(DetectorChain::standard(
            state.clone(),
            Arc::clone(&provider),
            adapter_config,
        ));
        let prepare: Arc<dyn PreparePort> = Arc::new(PrepareAdapter::new(
            state.reader(),
            Arc::clone(&environment),
            Arc::clone(&notifier),
        ));
        let submission = SubmissionAdapter::new(state.clone(), Arc::clone(&notifier))
            .with_prepare(Arc::clone(&prepare));

        let collaborators = Collaborators {
            environment,
            prepare,
            host: provider.clone(),
            invocation: provider.clone(),
            provider: provider.clone(),
            submission: Arc::new(submission),
            notifier,
        };
        let assist = Assist::init(assist_config, state.clone(), collaborators).await?;
        tracing::debug!(proxy = provider.is_proxy(), "assist runtime started");
        Ok(Self {
            assist,
            state,
            provider,
        })
    }
}
