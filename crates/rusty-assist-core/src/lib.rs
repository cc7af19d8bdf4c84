pub mod abi;
pub mod args;
pub mod assist;
pub mod contract;
pub mod dispatcher;
pub mod domain;
pub mod ports;
pub mod provider;
pub mod readiness;
pub mod state;

pub use abi::encode_calldata;
pub use args::{split_args, CallArg, SplitArgs};
pub use assist::{Assist, Collaborators, VERSION};
pub use contract::{
    AbiEntry, AbiSource, AdaptedContract, ContractDescriptor, ContractMember, ContractObject,
    DelegatedContract, LegacyMethod, Member, MethodHandle, MethodModelEntry, ModernMethod,
    ModernMethods, METHODS_KEY,
};
pub use dispatcher::{SendKind, SendMethod, Submission, TransactionDispatcher, TransactionRequest};
pub use domain::{
    AssistConfig, CategoryCode, ContractTelemetry, EventCode, EventRecord, FailureCode,
    ProviderGeneration, ProviderHandle, TelemetryContext,
};
pub use ports::{
    AssistError, Callback, Detector, DismissHook, EnvironmentCheckPort, HostPort,
    InteractiveHandlers, InvocationPort, NotifierPort, PortError, PreparePort, ProviderPort,
    SubmissionPort,
};
pub use provider::{configure_provider, detect_generation, ProviderConfigurator};
pub use readiness::{evaluate_headless, FirstFailure, ReadinessCheck, READY_MESSAGE};
pub use state::{EnvironmentState, PendingTransaction, StateReader, StateWriter};
