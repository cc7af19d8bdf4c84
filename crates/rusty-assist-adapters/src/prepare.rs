use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use rusty_assist_core::{
    AssistError, CategoryCode, EnvironmentCheckPort, EventRecord, NotifierPort, PreparePort,
    ReadinessCheck, StateReader, READY_MESSAGE,
};

/// Interactive prepare-for-transaction. Refreshes the environment, then
/// stops at the first unmet condition and notifies it under the caller's
/// category.
pub struct PrepareAdapter {
    state: StateReader,
    environment: Arc<dyn EnvironmentCheckPort>,
    notifier: Arc<dyn NotifierPort>,
}

impl PrepareAdapter {
    pub fn new(
        state: StateReader,
        environment: Arc<dyn EnvironmentCheckPort>,
        notifier: Arc<dyn NotifierPort>,
    ) -> Self {
        Self {
            state,
            environment,
            notifier,
        }
    }
}

#[async_trait]
impl PreparePort for PrepareAdapter {
    async fn prepare_for_transaction(&self, category: CategoryCode) -> Result<Value, AssistError> {
        self.environment.check_environment().await?;
        let snapshot = self.state.snapshot()?;

        for check in ReadinessCheck::ALL {
            let Some(code) = check.failures(&snapshot).into_iter().next() else {
                continue;
            };
            tracing::info!(?check, %code, ?category, "user not ready to transact");
            self.notifier.notify(
                EventRecord::new(code.into(), category).with_reason(code.default_reason()),
                None,
            );
            return Err(AssistError::from_code(code));
        }
        Ok(json!(READY_MESSAGE))
    }
}
