//! Method delegation for contract objects.
//!
//! [`ContractAdapter::adapt`] wraps a [`ContractDescriptor`] in a
//! [`DelegatedContract`] holding the original plus a map of overridden
//! members. Keys without an override read straight through to the
//! original, so non-method data is preserved.

use std::collections::BTreeMap;
use std::sync::Arc;

use alloy::json_abi::Function;
use alloy::primitives::{Address, Bytes};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::abi::encode_calldata;
use crate::args::{split_args, CallArg};
use crate::dispatcher::{SendKind, SendMethod, TransactionDispatcher, TransactionRequest};
use crate::domain::{
    CategoryCode, ContractTelemetry, EventCode, EventRecord, FailureCode, ProviderGeneration,
    TelemetryContext,
};
use crate::ports::{AssistError, InvocationPort, NotifierPort, PortError, ProviderPort};
use crate::provider::ProviderConfigurator;
use crate::state::StateReader;

/// Key of the aggregate method map on modern contract objects.
pub const METHODS_KEY: &str = "methods";

/// Provider-side handle of one contract method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodHandle {
    pub contract: Option<Address>,
    pub name: String,
    /// `None` when the contract object has no such method.
    pub function: Option<Function>,
}

impl MethodHandle {
    pub fn bound(contract: Option<Address>, function: Function) -> Self {
        Self {
            contract,
            name: function.name.clone(),
            function: Some(function),
        }
    }

    pub fn unbound(contract: Option<Address>, name: impl Into<String>) -> Self {
        Self {
            contract,
            name: name.into(),
            function: None,
        }
    }

    pub fn is_bound(&self) -> bool {
        self.function.is_some()
    }

    /// Calldata for invoking this method with `args`.
    pub fn get_data(&self, args: &[Value]) -> Result<Bytes, AssistError> {
        let function = self.function.as_ref().ok_or_else(|| {
            PortError::NotFound(format!("contract has no method named {}", self.name))
        })?;
        Ok(encode_calldata(function, args)?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodModelEntry {
    pub abi_item: Function,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Member {
    Value(Value),
    Method(MethodHandle),
    Methods(BTreeMap<String, MethodHandle>),
}

/// Canonical ABI entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbiEntry {
    pub name: String,
    pub item: Function,
}

/// Where a descriptor's ABI comes from.
#[derive(Debug, Clone, Copy)]
pub enum AbiSource<'a> {
    Abi(&'a [Function]),
    JsonInterface(&'a [Function]),
    MethodModel(&'a BTreeMap<String, MethodModelEntry>),
}

impl AbiSource<'_> {
    pub fn entries(&self) -> Vec<AbiEntry> {
        let functions: Vec<&Function> = match self {
            Self::Abi(list) | Self::JsonInterface(list) => list.iter().collect(),
            Self::MethodModel(model) => model.values().map(|m| &m.abi_item).collect(),
        };
        functions
            .into_iter()
            .map(|f| AbiEntry {
                name: f.name.clone(),
                item: f.clone(),
            })
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContractDescriptor {
    pub address: Option<Address>,
    pub abi: Option<Vec<Function>>,
    pub json_interface: Option<Vec<Function>>,
    pub method_model: Option<BTreeMap<String, MethodModelEntry>>,
    members: BTreeMap<String, Member>,
}

impl ContractDescriptor {
    pub fn new(address: Option<Address>) -> Self {
        Self {
            address,
            ..Self::default()
        }
    }

    /// Legacy-style object: an `abi` field and one member per method.
    pub fn legacy(address: Option<Address>, abi: Vec<Function>) -> Self {
        let mut descriptor = Self::new(address);
        for function in &abi {
            descriptor
                .members
                .entry(function.name.clone())
                .or_insert_with(|| Member::Method(MethodHandle::bound(address, function.clone())));
        }
        descriptor.abi = Some(abi);
        descriptor
    }

    /// Modern-style object: a cached interface and an aggregate `methods`.
    pub fn modern(address: Option<Address>, abi: Vec<Function>) -> Self {
        let mut methods = BTreeMap::new();
        for function in &abi {
            methods
                .entry(function.name.clone())
                .or_insert_with(|| MethodHandle::bound(address, function.clone()));
        }
        let mut descriptor = Self::new(address);
        descriptor
            .members
            .insert(METHODS_KEY.to_owned(), Member::Methods(methods));
        descriptor.json_interface = Some(abi);
        descriptor
    }

    pub fn with_member(mut self, key: impl Into<String>, member: Member) -> Self {
        self.members.insert(key.into(), member);
        self
    }

    pub fn with_method_model(mut self, model: BTreeMap<String, MethodModelEntry>) -> Self {
        self.method_model = Some(model);
        self
    }

    pub fn members(&self) -> impl Iterator<Item = (&str, &Member)> {
        self.members.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// `abi` wins over the cached interface, which wins over the method model.
    pub fn abi_source(&self) -> Option<AbiSource<'_>> {
        if let Some(abi) = &self.abi {
            return Some(AbiSource::Abi(abi));
        }
        if let Some(interface) = &self.json_interface {
            return Some(AbiSource::JsonInterface(interface));
        }
        self.method_model.as_ref().map(AbiSource::MethodModel)
    }
}

pub enum ContractMember<'a> {
    Passthrough(&'a Member),
    Legacy(&'a LegacyMethod),
    Modern(&'a ModernMethods),
}

/// Capability set shared by original and adapted contract objects.
pub trait ContractObject {
    fn address(&self) -> Option<Address>;

    fn keys(&self) -> Vec<&str>;

    fn member(&self, key: &str) -> Option<ContractMember<'_>>;

    fn value(&self, key: &str) -> Option<&Value> {
        match self.member(key)? {
            ContractMember::Passthrough(Member::Value(v)) => Some(v),
            _ => None,
        }
    }
}

impl ContractObject for ContractDescriptor {
    fn address(&self) -> Option<Address> {
        self.address
    }

    fn keys(&self) -> Vec<&str> {
        self.members.keys().map(String::as_str).collect()
    }

    fn member(&self, key: &str) -> Option<ContractMember<'_>> {
        self.members.get(key).map(ContractMember::Passthrough)
    }
}

/// Ports a delegated method needs at call time.
pub struct ContractRuntime {
    invocation: Arc<dyn InvocationPort>,
    provider: Arc<dyn ProviderPort>,
    notifier: Arc<dyn NotifierPort>,
    dispatcher: Arc<TransactionDispatcher>,
}

impl ContractRuntime {
    pub fn new(
        invocation: Arc<dyn InvocationPort>,
        provider: Arc<dyn ProviderPort>,
        notifier: Arc<dyn NotifierPort>,
        dispatcher: Arc<TransactionDispatcher>,
    ) -> Self {
        Self {
            invocation,
            provider,
            notifier,
            dispatcher,
        }
    }
}

/// A legacy-provider method rewired onto the uniform calling convention.
#[derive(Clone)]
pub struct LegacyMethod {
    handle: MethodHandle,
    entry: Function,
    runtime: Arc<ContractRuntime>,
}

impl std::fmt::Debug for LegacyMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LegacyMethod")
            .field("handle", &self.handle)
            .field("entry", &self.entry.name)
            .finish()
    }
}

impl LegacyMethod {
    pub fn name(&self) -> &str {
        &self.entry.name
    }

    pub fn handle(&self) -> &MethodHandle {
        &self.handle
    }

    pub fn entry(&self) -> &Function {
        &self.entry
    }

    /// Calling the method itself.
    pub async fn invoke(&self, args: Vec<Value>) -> Result<Value, AssistError> {
        Ok(self
            .runtime
            .invocation
            .legacy_invoke(&self.handle, &self.entry, args)
            .await?)
    }

    /// `.call(args..., txObject?, defaultBlock?, callback?)`.
    ///
    /// Errors go to the callback only. A `contractQuery` event is emitted
    /// once per invocation, with or without a callback.
    pub async fn call(&self, args: Vec<CallArg>) -> Option<Value> {
        let split = split_args(args, self.entry.inputs.len());
        let outcome = self
            .runtime
            .provider
            .call(
                &self.handle,
                &split.args,
                split.tx_object.as_ref(),
                split.default_block.as_ref(),
            )
            .await;

        let result = match outcome {
            Ok(value) => {
                if let Some(cb) = split.callback {
                    cb(Ok(value.clone()));
                }
                Some(value)
            }
            Err(e) => {
                tracing::warn!(method = %self.entry.name, error = %e, "contract call failed");
                if let Some(cb) = split.callback {
                    cb(Err(e.into()));
                }
                None
            }
        };

        self.runtime.notifier.notify(
            EventRecord::new(EventCode::ContractQuery, CategoryCode::ActiveContract).with_contract(
                ContractTelemetry {
                    method_name: self.entry.name.clone(),
                    parameters: split.args,
                    result: result.as_ref().map(Value::to_string),
                },
            ),
            None,
        );
        result
    }

    /// `.sendTransaction(args..., txObject?, callback?)`. Errors go to the
    /// callback only.
    pub async fn send_transaction(&self, args: Vec<CallArg>) -> Option<Value> {
        let split = split_args(args, self.entry.inputs.len());
        let telemetry = TelemetryContext {
            method_name: self.entry.name.clone(),
            parameters: split.args.clone(),
        };
        let send = SendMethod::new(
            Arc::clone(&self.runtime.provider),
            SendKind::Contract {
                handle: self.handle.clone(),
                args: split.args,
            },
        );
        let request = TransactionRequest {
            tx_object: split
                .tx_object
                .unwrap_or_else(|| Value::Object(Default::default())),
            callback: split.callback,
            telemetry: Some(telemetry),
        };
        self.runtime
            .dispatcher
            .submit(
                CategoryCode::ActiveContract,
                request,
                send,
                Some(self.handle.clone()),
            )
            .await
            .ok()
    }

    /// `.getData(args...)` of the original method.
    pub fn get_data(&self, args: &[Value]) -> Result<Bytes, AssistError> {
        self.handle.get_data(args)
    }
}

#[derive(Clone)]
pub struct ModernMethod {
    handle: MethodHandle,
    entry: Function,
    runtime: Arc<ContractRuntime>,
}

impl std::fmt::Debug for ModernMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModernMethod")
            .field("handle", &self.handle)
            .field("entry", &self.entry.name)
            .finish()
    }
}

impl ModernMethod {
    pub fn handle(&self) -> &MethodHandle {
        &self.handle
    }

    pub async fn invoke(&self, args: Vec<Value>) -> Result<Value, AssistError> {
        Ok(self
            .runtime
            .invocation
            .modern_invoke(&self.handle, &self.entry, args)
            .await?)
    }
}

/// Rebuilt aggregate `methods` member of a modern contract.
#[derive(Debug, Clone, Default)]
pub struct ModernMethods {
    methods: BTreeMap<String, ModernMethod>,
}

impl ModernMethods {
    pub fn get(&self, name: &str) -> Option<&ModernMethod> {
        self.methods.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

#[derive(Debug, Clone)]
pub enum Delegate {
    Legacy(LegacyMethod),
    Modern(ModernMethods),
}

#[derive(Debug, Clone)]
pub struct DelegatedContract {
    original: Arc<ContractDescriptor>,
    overrides: BTreeMap<String, Delegate>,
}

impl DelegatedContract {
    pub fn original(&self) -> &Arc<ContractDescriptor> {
        &self.original
    }

    pub fn method(&self, name: &str) -> Option<&LegacyMethod> {
        match self.overrides.get(name)? {
            Delegate::Legacy(m) => Some(m),
            Delegate::Modern(_) => None,
        }
    }

    pub fn methods(&self) -> Option<&ModernMethods> {
        match self.overrides.get(METHODS_KEY)? {
            Delegate::Modern(m) => Some(m),
            Delegate::Legacy(_) => None,
        }
    }
}

impl ContractObject for DelegatedContract {
    fn address(&self) -> Option<Address> {
        self.original.address
    }

    fn keys(&self) -> Vec<&str> {
        self.original.keys()
    }

    fn member(&self, key: &str) -> Option<ContractMember<'_>> {
        match self.overrides.get(key) {
            Some(Delegate::Legacy(m)) => Some(ContractMember::Legacy(m)),
            Some(Delegate::Modern(m)) => Some(ContractMember::Modern(m)),
            None => self.original.member(key),
        }
    }
}

/// Result of `Contract`: the untouched original on the mobile fast-path,
/// otherwise the delegating wrapper.
#[derive(Debug, Clone)]
pub enum AdaptedContract {
    Original(Arc<ContractDescriptor>),
    Delegated(DelegatedContract),
}

impl AdaptedContract {
    pub fn delegated(&self) -> Option<&DelegatedContract> {
        match self {
            Self::Delegated(d) => Some(d),
            Self::Original(_) => None,
        }
    }

    pub fn original(&self) -> &Arc<ContractDescriptor> {
        match self {
            Self::Original(o) => o,
            Self::Delegated(d) => d.original(),
        }
    }
}

impl ContractObject for AdaptedContract {
    fn address(&self) -> Option<Address> {
        self.original().address
    }

    fn keys(&self) -> Vec<&str> {
        self.original().keys()
    }

    fn member(&self, key: &str) -> Option<ContractMember<'_>> {
        match self {
            Self::Original(o) => o.member(key),
            Self::Delegated(d) => d.member(key),
        }
    }
}

pub struct ContractAdapter {
    state: StateReader,
    providers: ProviderConfigurator,
    runtime: Arc<ContractRuntime>,
}

impl ContractAdapter {
    pub fn new(
        state: StateReader,
        providers: ProviderConfigurator,
        runtime: Arc<ContractRuntime>,
    ) -> Self {
        Self {
            state,
            providers,
            runtime,
        }
    }

    /// The `Contract` entry point.
    pub fn adapt(&self, descriptor: Arc<ContractDescriptor>) -> Result<AdaptedContract, AssistError> {
        let (valid_api_key, supported_network, passthrough) = self.state.read(|s| {
            (
                s.valid_api_key,
                s.supported_network,
                s.mobile_passthrough(),
            )
        })?;
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
        if passthrough {
            tracing::debug!("mobile passthrough: contract returned unmodified");
            return Ok(AdaptedContract::Original(descriptor));
        }

        let generation = self.providers.ensure_instance()?;
        let entries = descriptor
            .abi_source()
            .ok_or_else(|| {
                AssistError::fatal(
                    FailureCode::InitFail,
                    "Contract object does not expose an ABI",
                )
            })?
            .entries();

        let overrides = match generation {
            ProviderGeneration::Legacy => self.legacy_overrides(&descriptor, &entries),
            ProviderGeneration::Modern => self.modern_overrides(&descriptor, &entries),
        };
        tracing::debug!(
            ?generation,
            abi_entries = entries.len(),
            overridden = overrides.len(),
            "contract delegated"
        );
        Ok(AdaptedContract::Delegated(DelegatedContract {
            original: descriptor,
            overrides,
        }))
    }

    fn legacy_overrides(
        &self,
        descriptor: &ContractDescriptor,
        entries: &[AbiEntry],
    ) -> BTreeMap<String, Delegate> {
        let mut overrides = BTreeMap::new();
        for (key, member) in descriptor.members() {
            let Some(entry) = entries.iter().find(|e| e.name == key) else {
                continue;
            };
            let handle = match member {
                Member::Method(handle) => handle.clone(),
                _ => MethodHandle::unbound(descriptor.address, key),
            };
            overrides.insert(
                key.to_owned(),
                Delegate::Legacy(LegacyMethod {
                    handle,
                    entry: entry.item.clone(),
                    runtime: Arc::clone(&self.runtime),
                }),
            );
        }
        overrides
    }

    fn modern_overrides(
        &self,
        descriptor: &ContractDescriptor,
        entries: &[AbiEntry],
    ) -> BTreeMap<String, Delegate> {
        let mut overrides = BTreeMap::new();
        let Some(Member::Methods(original)) = descriptor.members.get(METHODS_KEY) else {
            return overrides;
        };

        let mut methods = BTreeMap::new();
        for entry in entries {
            if methods.contains_key(&entry.name) {
                continue;
            }
            let handle = original.get(&entry.name).cloned().unwrap_or_else(|| {
                tracing::debug!(method = %entry.name, "abi method missing from contract object");
                MethodHandle::unbound(descriptor.address, &entry.name)
            });
            methods.insert(
                entry.name.clone(),
                ModernMethod {
                    handle,
                    entry: entry.item.clone(),
                    runtime: Arc::clone(&self.runtime),
                },
            );
        }
        overrides.insert(
            METHODS_KEY.to_owned(),
            Delegate::Modern(ModernMethods { methods }),
        );
        overrides
    }
}
