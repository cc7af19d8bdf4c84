pub mod config;
pub mod detectors;
pub mod eip1193;
pub mod notifier;
pub mod prepare;
pub mod runtime;
pub mod submission;

pub use config::{AssistAdapterConfig, ConfigError};
pub use detectors::{
    AccountDetector, BalanceDetector, DetectorChain, NetworkDetector, UserAgentDetector,
    WalletDetector,
};
pub use eip1193::Eip1193Adapter;
pub use notifier::{RecordingNotifier, TracingNotifier};
pub use prepare::PrepareAdapter;
pub use runtime::AssistRuntime;
pub use submission::SubmissionAdapter;
