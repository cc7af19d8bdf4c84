use std::sync::{Mutex, PoisonError};

use rusty_assist_core::{DismissHook, EventCode, EventRecord, InteractiveHandlers, NotifierPort};

/// Logs every event. With no UI to dismiss, interactive hooks run at once
/// unless `auto_dismiss` is off.
#[derive(Debug, Clone)]
pub struct TracingNotifier {
    auto_dismiss: bool,
}

impl Default for TracingNotifier {
    fn default() -> Self {
        Self { auto_dismiss: true }
    }
}

impl TracingNotifier {
    pub fn with_auto_dismiss(auto_dismiss: bool) -> Self {
        Self { auto_dismiss }
    }
}

fn is_failure(code: EventCode) -> bool {
    !matches!(
        code,
        EventCode::InitState
            | EventCode::ContractQuery
            | EventCode::TxRequest
            | EventCode::TxSent
            | EventCode::TxPending
    )
}

impl NotifierPort for TracingNotifier {
    fn notify(&self, event: EventRecord, handlers: Option<InteractiveHandlers>) {
        let payload = serde_json::to_string(&event).unwrap_or_default();
        if is_failure(event.event_code) {
            tracing::warn!(
                event = ?event.event_code,
                category = ?event.category_code,
                reason = event.reason.as_deref().unwrap_or(""),
                %payload,
                "assist event"
            );
        } else {
            tracing::info!(
                event = ?event.event_code,
                category = ?event.category_code,
                %payload,
                "assist event"
            );
        }

        let hook = handlers.and_then(|h| h.on_dismiss);
        match hook {
            Some(hook) if self.auto_dismiss => {
                tracing::debug!(event = ?event.event_code, "auto-dismissing notification");
                hook();
            }
            Some(_) => tracing::debug!("dismiss hook dropped"),
            None => {}
        }
    }
}

/// Keeps events and pending dismissal hooks for inspection.
#[derive(Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<EventRecord>>,
    hooks: Mutex<Vec<DismissHook>>,
}

impl RecordingNotifier {
    pub fn events(&self) -> Vec<EventRecord> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn events_with_code(&self, code: EventCode) -> Vec<EventRecord> {
        self.events()
            .into_iter()
            .filter(|e| e.event_code == code)
            .collect()
    }

    pub fn pending_hooks(&self) -> usize {
        self.hooks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Runs the most recent dismissal hook. `false` if none is pending.
    pub fn dismiss_latest(&self) -> bool {
        let hook = self
            .hooks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop();
        match hook {
            Some(hook) => {
                hook();
                true
            }
            None => false,
        }
    }
}

impl NotifierPort for RecordingNotifier {
    fn notify(&self, event: EventRecord, handlers: Option<InteractiveHandlers>) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
        if let Some(hook) = handlers.and_then(|h| h.on_dismiss) {
            self.hooks
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(hook);
        }
    }
}
