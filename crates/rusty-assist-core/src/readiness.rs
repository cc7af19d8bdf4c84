//! Readiness evaluation behind `onboard`.
//!
//! Headless mode evaluates every check and reports the first failure;
//! interactive mode stops at the first failing gate and may wait on the
//! user to dismiss a notification.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::oneshot;

use crate::domain::{CategoryCode, EventCode, EventRecord, FailureCode};
use crate::ports::{
    AssistError, EnvironmentCheckPort, InteractiveHandlers, NotifierPort, PreparePort,
};
use crate::state::{EnvironmentState, StateWriter};

pub const READY_MESSAGE: &str = "User is ready to transact";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadinessCheck {
    MobileDevice,
    Browser,
    Wallet,
    AccountAccess,
    Network,
    Balance,
}

impl ReadinessCheck {
    pub const ALL: [Self; 6] = [
        Self::MobileDevice,
        Self::Browser,
        Self::Wallet,
        Self::AccountAccess,
        Self::Network,
        Self::Balance,
    ];

    /// Failure tags this check raises against `state`, in order.
    pub fn failures(self, state: &EnvironmentState) -> Vec<FailureCode> {
        let mut out = Vec::new();
        match self {
            Self::MobileDevice if state.mobile_device => out.push(FailureCode::MobileBlocked),
            Self::Browser if !state.valid_browser => out.push(FailureCode::BrowserFail),
            Self::Wallet if !state.web3_wallet => out.push(FailureCode::WalletFail),
            Self::AccountAccess if !state.access_to_accounts => {
                if state.legacy_wallet {
                    out.push(FailureCode::WalletLogin);
                }
                if state.modern_wallet && !state.wallet_logged_in {
                    out.push(FailureCode::WalletLoginEnable);
                }
                if state.modern_wallet && !state.wallet_enabled {
                    out.push(FailureCode::WalletEnable);
                }
            }
            Self::Network if !state.correct_network => out.push(FailureCode::NetworkFail),
            Self::Balance if !state.minimum_balance => out.push(FailureCode::NsfFail),
            _ => {}
        }
        out
    }
}

/// Records only the first failure while every check still runs.
#[derive(Debug, Default)]
pub struct FirstFailure {
    first: Option<FailureCode>,
    discarded: Vec<FailureCode>,
    evaluated: usize,
}

impl FirstFailure {
    pub fn record(&mut self, check: ReadinessCheck, failures: Vec<FailureCode>) {
        self.evaluated += 1;
        for code in failures {
            if self.first.is_none() {
                self.first = Some(code);
            } else {
                tracing::debug!(?check, discarded = %code, "later readiness failure discarded");
                self.discarded.push(code);
            }
        }
    }

    pub fn first(&self) -> Option<FailureCode> {
        self.first
    }

    pub fn discarded(&self) -> &[FailureCode] {
        &self.discarded
    }

    pub fn evaluated(&self) -> usize {
        self.evaluated
    }

    pub fn into_result(self) -> Result<Value, AssistError> {
        match self.first {
            Some(code) => Err(AssistError::from_code(code)),
            None => Ok(Value::String(READY_MESSAGE.to_owned())),
        }
    }
}

/// Runs all six headless checks against a state snapshot.
pub fn evaluate_headless(state: &EnvironmentState) -> FirstFailure {
    let mut acc = FirstFailure::default();
    for check in ReadinessCheck::ALL {
        acc.record(check, check.failures(state));
    }
    acc
}

pub struct ReadinessEvaluator {
    state: StateWriter,
    environment: Arc<dyn EnvironmentCheckPort>,
    prepare: Arc<dyn PreparePort>,
    notifier: Arc<dyn NotifierPort>,
}

impl ReadinessEvaluator {
    pub fn new(
        state: StateWriter,
        environment: Arc<dyn EnvironmentCheckPort>,
        prepare: Arc<dyn PreparePort>,
        notifier: Arc<dyn NotifierPort>,
    ) -> Self {
        Self {
            state,
            environment,
            prepare,
            notifier,
        }
    }

    pub async fn onboard(&self) -> Result<Value, AssistError> {
        if self.state.read(EnvironmentState::headless_mode)? {
            self.headless().await
        } else {
            self.interactive().await
        }
    }

    async fn headless(&self) -> Result<Value, AssistError> {
        self.environment.check_environment().await?;
        let snapshot = self.state.snapshot()?;
        let outcome = evaluate_headless(&snapshot);
        tracing::debug!(
            first = ?outcome.first(),
            evaluated = outcome.evaluated(),
            "headless readiness evaluated"
        );
        outcome.into_result()
    }

    async fn interactive(&self) -> Result<Value, AssistError> {
        let (valid_api_key, supported_network, mobile_device) = self
            .state
            .read(|s| (s.valid_api_key, s.supported_network, s.mobile_device))?;

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

        if mobile_device {
            // Observable side effect kept from the browser gating flow.
            self.state.update(|s| s.valid_browser = false)?;
            let (tx, rx) = oneshot::channel::<()>();
            self.notifier.notify(
                EventRecord::new(EventCode::MobileBlocked, CategoryCode::Onboard),
                Some(InteractiveHandlers::on_dismiss(move || {
                    let _ = tx.send(());
                })),
            );
            if rx.await.is_err() {
                // Hook dropped without being called: nothing can settle us.
                std::future::pending::<()>().await;
            }
            tracing::info!("mobile notification dismissed");
            return Err(AssistError::from_code(FailureCode::MobileBlocked));
        }

        self.prepare
            .prepare_for_transaction(CategoryCode::Onboard)
            .await
    }
}
