#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use alloy::json_abi::Function;
use alloy::primitives::Address;
use async_trait::async_trait;
use serde_json::{json, Value};

use rusty_assist_core::{
    Assist, AssistConfig, AssistError, CategoryCode, Collaborators, DismissHook,
    EnvironmentCheckPort, EnvironmentState, EventRecord, HostPort, InteractiveHandlers,
    InvocationPort, MethodHandle, NotifierPort, PortError, PreparePort, ProviderHandle,
    ProviderPort, StateWriter, Submission, SubmissionPort,
};

#[derive(Default)]
pub struct FakeEnvironment {
    pub runs: AtomicUsize,
    pub failure: Mutex<Option<AssistError>>,
}

#[async_trait]
impl EnvironmentCheckPort for FakeEnvironment {
    async fn check_environment(&self) -> Result<(), AssistError> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        match self.failure.lock().expect("env lock").clone() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[derive(Default)]
pub struct FakePrepare {
    pub categories: Mutex<Vec<CategoryCode>>,
}

#[async_trait]
impl PreparePort for FakePrepare {
    async fn prepare_for_transaction(&self, category: CategoryCode) -> Result<Value, AssistError> {
        self.categories.lock().expect("prepare lock").push(category);
        Ok(json!("prepared"))
    }
}

#[derive(Default)]
pub struct FakeHost {
    pub ambient: Mutex<Option<ProviderHandle>>,
}

impl HostPort for FakeHost {
    fn ambient_provider(&self) -> Option<ProviderHandle> {
        self.ambient.lock().expect("host lock").clone()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProviderCall {
    Call {
        method: String,
        args: Vec<Value>,
        tx_object: Option<Value>,
        default_block: Option<Value>,
    },
    SendContract {
        method: String,
        args: Vec<Value>,
        tx_object: Value,
    },
    Send {
        tx_object: Value,
    },
    LegacyInvoke {
        method: String,
        args: Vec<Value>,
    },
    ModernInvoke {
        method: String,
        args: Vec<Value>,
    },
}

#[derive(Default)]
pub struct FakeProvider {
    pub calls: Mutex<Vec<ProviderCall>>,
    pub call_result: Mutex<Option<Value>>,
    pub fail_calls: Mutex<bool>,
    pub fail_sends: Mutex<bool>,
}

impl FakeProvider {
    pub fn recorded(&self) -> Vec<ProviderCall> {
        self.calls.lock().expect("provider lock").clone()
    }

    fn push(&self, call: ProviderCall) {
        self.calls.lock().expect("provider lock").push(call);
    }

    fn send_outcome(&self) -> Result<Value, PortError> {
        if *self.fail_sends.lock().expect("provider lock") {
            Err(PortError::Transport("user rejected".to_owned()))
        } else {
            Ok(json!("0xfeed"))
        }
    }
}

#[async_trait]
impl ProviderPort for FakeProvider {
    async fn call(
        &self,
        handle: &MethodHandle,
        args: &[Value],
        tx_object: Option<&Value>,
        default_block: Option<&Value>,
    ) -> Result<Value, PortError> {
        self.push(ProviderCall::Call {
            method: handle.name.clone(),
            args: args.to_vec(),
            tx_object: tx_object.cloned(),
            default_block: default_block.cloned(),
        });
        if *self.fail_calls.lock().expect("provider lock") {
            return Err(PortError::Transport("execution reverted".to_owned()));
        }
        Ok(self
            .call_result
            .lock()
            .expect("provider lock")
            .clone()
            .unwrap_or_else(|| json!("1000")))
    }

    async fn send_contract_transaction(
        &self,
        handle: &MethodHandle,
        args: &[Value],
        tx_object: &Value,
    ) -> Result<Value, PortError> {
        self.push(ProviderCall::SendContract {
            method: handle.name.clone(),
            args: args.to_vec(),
            tx_object: tx_object.clone(),
        });
        self.send_outcome()
    }

    async fn send_transaction(&self, tx_object: &Value) -> Result<Value, PortError> {
        self.push(ProviderCall::Send {
            tx_object: tx_object.clone(),
        });
        self.send_outcome()
    }
}

#[async_trait]
impl InvocationPort for FakeProvider {
    async fn legacy_invoke(
        &self,
        handle: &MethodHandle,
        _entry: &Function,
        args: Vec<Value>,
    ) -> Result<Value, PortError> {
        if !handle.is_bound() {
            return Err(PortError::NotFound(handle.name.clone()));
        }
        self.push(ProviderCall::LegacyInvoke {
            method: handle.name.clone(),
            args,
        });
        Ok(json!("legacy"))
    }

    async fn modern_invoke(
        &self,
        handle: &MethodHandle,
        _entry: &Function,
        args: Vec<Value>,
    ) -> Result<Value, PortError> {
        if !handle.is_bound() {
            return Err(PortError::NotFound(handle.name.clone()));
        }
        self.push(ProviderCall::ModernInvoke {
            method: handle.name.clone(),
            args,
        });
        Ok(json!("modern"))
    }
}

/// Submission collaborator that sends straight through and records.
#[derive(Default)]
pub struct FakeSubmission {
    pub submissions: Mutex<Vec<Submission>>,
}

impl FakeSubmission {
    pub fn recorded(&self) -> Vec<Submission> {
        self.submissions.lock().expect("submission lock").clone()
    }
}

#[async_trait]
impl SubmissionPort for FakeSubmission {
    async fn submit(&self, submission: Submission) -> Result<Value, AssistError> {
        self.submissions
            .lock()
            .expect("submission lock")
            .push(submission.clone());
        Ok(submission.send.send(&submission.tx_object).await?)
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub events: Mutex<Vec<EventRecord>>,
    pub hooks: Mutex<Vec<DismissHook>>,
}

impl RecordingNotifier {
    pub fn events(&self) -> Vec<EventRecord> {
        self.events.lock().expect("notifier lock").clone()
    }

    pub fn dismiss_latest(&self) -> bool {
        let hook = self.hooks.lock().expect("notifier lock").pop();
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
        self.events.lock().expect("notifier lock").push(event);
        if let Some(hook) = handlers.and_then(|h| h.on_dismiss) {
            self.hooks.lock().expect("notifier lock").push(hook);
        }
    }
}

pub struct Harness {
    pub state: StateWriter,
    pub environment: Arc<FakeEnvironment>,
    pub prepare: Arc<FakePrepare>,
    pub host: Arc<FakeHost>,
    pub provider: Arc<FakeProvider>,
    pub submission: Arc<FakeSubmission>,
    pub notifier: Arc<RecordingNotifier>,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            state: StateWriter::default(),
            environment: Arc::new(FakeEnvironment::default()),
            prepare: Arc::new(FakePrepare::default()),
            host: Arc::new(FakeHost::default()),
            provider: Arc::new(FakeProvider::default()),
            submission: Arc::new(FakeSubmission::default()),
            notifier: Arc::new(RecordingNotifier::default()),
        }
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            environment: self.environment.clone(),
            prepare: self.prepare.clone(),
            host: self.host.clone(),
            invocation: self.provider.clone(),
            provider: self.provider.clone(),
            submission: self.submission.clone(),
            notifier: self.notifier.clone(),
        }
    }

    pub async fn init(&self, config: AssistConfig) -> Assist {
        Assist::init(Some(config), self.state.clone(), self.collaborators())
            .await
            .expect("init assist")
    }

    /// Sets every readiness flag to its passing value.
    pub fn make_ready(&self) {
        self.set(|s| {
            s.mobile_device = false;
            s.valid_browser = true;
            s.web3_wallet = true;
            s.access_to_accounts = true;
            s.modern_wallet = true;
            s.wallet_logged_in = true;
            s.wallet_enabled = true;
            s.correct_network = true;
            s.minimum_balance = true;
        });
    }

    pub fn set(&self, f: impl FnOnce(&mut EnvironmentState)) {
        self.state.update(f).expect("update state");
    }
}

pub fn legacy_provider() -> ProviderHandle {
    ProviderHandle::new("web3", "0.20.7")
}

pub fn modern_provider() -> ProviderHandle {
    ProviderHandle::new("web3", "1.0.0-beta.36")
}

pub fn config_with(provider: ProviderHandle) -> AssistConfig {
    AssistConfig {
        web3: Some(provider),
        ..AssistConfig::new("dapp-123")
    }
}

pub fn headless_config() -> AssistConfig {
    AssistConfig {
        headless_mode: true,
        ..config_with(modern_provider())
    }
}

pub fn transfer_fn() -> Function {
    Function::parse("function transfer(address to, uint256 amount) returns (bool)")
        .expect("parse transfer")
}

pub fn balance_of_fn() -> Function {
    Function::parse("function balanceOf(address owner) view returns (uint256)")
        .expect("parse balanceOf")
}

pub fn token_address() -> Address {
    "0x000000000000000000000000000000000000CAFE"
        .parse()
        .expect("valid token address")
}

pub fn recipient() -> Value {
    json!("0x000000000000000000000000000000000000dEaD")
}
