use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use rusty_assist_core::{
    AssistError, ContractTelemetry, EventCode, EventRecord, NotifierPort, PendingTransaction,
    PreparePort, StateWriter, Submission, SubmissionPort,
};

/// Queues submissions in the environment record while the wallet holds
/// them and reports their lifecycle: `txRequest`, then `txSent` or
/// `txSendFail`. Settled entries leave the queue.
pub struct SubmissionAdapter {
    state: StateWriter,
    notifier: Arc<dyn NotifierPort>,
    prepare: Option<Arc<dyn PreparePort>>,
    next_id: AtomicU64,
}

impl SubmissionAdapter {
    pub fn new(state: StateWriter, notifier: Arc<dyn NotifierPort>) -> Self {
        Self {
            state,
            notifier,
            prepare: None,
            next_id: AtomicU64::new(1),
        }
    }

    /// Gates every submission on the prepare collaborator.
    pub fn with_prepare(mut self, prepare: Arc<dyn PreparePort>) -> Self {
        self.prepare = Some(prepare);
        self
    }

    fn event(&self, code: EventCode, submission: &Submission, transaction: Value) -> EventRecord {
        let mut event =
            EventRecord::new(code, submission.category).with_transaction(transaction);
        if let Some(t) = &submission.telemetry {
            event = event.with_contract(ContractTelemetry {
                method_name: t.method_name.clone(),
                parameters: t.parameters.clone(),
                result: None,
            });
        }
        event
    }
}

fn with_id(tx_object: &Value, id: u64) -> Value {
    let mut tx = tx_object.as_object().cloned().unwrap_or_default();
    tx.insert("id".to_owned(), json!(id));
    Value::Object(tx)
}

#[async_trait]
impl SubmissionPort for SubmissionAdapter {
    async fn submit(&self, submission: Submission) -> Result<Value, AssistError> {
        if let Some(prepare) = &self.prepare {
            prepare
                .prepare_for_transaction(submission.category)
                .await?;
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let awaiting = self.state.update(|s| {
            let awaiting = s.transaction_queue.len();
            s.transaction_queue.push(PendingTransaction {
                id,
                category: submission.category,
                tx_object: submission.tx_object.clone(),
                method_name: submission.telemetry.as_ref().map(|t| t.method_name.clone()),
            });
            awaiting
        })?;
        let tx = with_id(&submission.tx_object, id);
        tracing::info!(id, category = ?submission.category, "transaction requested");
        self.notifier
            .notify(self.event(EventCode::TxRequest, &submission, tx.clone()), None);
        if awaiting > 0 {
            self.notifier.notify(
                self.event(EventCode::TxPending, &submission, tx.clone())
                    .with_reason("A previous transaction is still awaiting approval"),
                None,
            );
        }

        let outcome = submission.send.send(&submission.tx_object).await;
        self.state
            .update(|s| s.transaction_queue.retain(|p| p.id != id))?;

        match outcome {
            Ok(hash) => {
                tracing::info!(id, %hash, "transaction sent");
                let mut sent = tx;
                if let Some(obj) = sent.as_object_mut() {
                    obj.insert("hash".to_owned(), hash.clone());
                }
                self.notifier
                    .notify(self.event(EventCode::TxSent, &submission, sent), None);
                Ok(hash)
            }
            Err(e) => {
                tracing::warn!(id, error = %e, "transaction send failed");
                self.notifier.notify(
                    self.event(EventCode::TxSendFail, &submission, tx)
                        .with_reason(e.to_string()),
                    None,
                );
                Err(e.into())
            }
        }
    }
}
