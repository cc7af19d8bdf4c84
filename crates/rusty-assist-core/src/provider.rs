use std::sync::Arc;

use crate::domain::{FailureCode, ProviderGeneration, ProviderHandle};
use crate::ports::{AssistError, HostPort, PortError};
use crate::state::StateWriter;

/// Generation from the provider library version: `0.x` is the legacy
/// callback API, anything later the promise API.
pub fn detect_generation(version: &str) -> Result<ProviderGeneration, PortError> {
    let trimmed = version.trim().trim_start_matches('v');
    let major = match semver::Version::parse(trimmed) {
        Ok(v) => v.major,
        Err(_) => trimmed
            .split('.')
            .next()
            .and_then(|m| m.parse::<u64>().ok())
            .ok_or_else(|| {
                PortError::Validation(format!("unrecognized provider version: {version}"))
            })?,
    };
    Ok(if major == 0 {
        ProviderGeneration::Legacy
    } else {
        ProviderGeneration::Modern
    })
}

/// Stores `handle` as the active provider instance and sets the
/// generation flags. An unrecognized version is an `initFail`.
pub fn configure_provider(
    state: &StateWriter,
    handle: ProviderHandle,
) -> Result<ProviderGeneration, AssistError> {
    let generation = detect_generation(&handle.version)
        .map_err(|e| AssistError::fatal(FailureCode::InitFail, e.to_string()))?;
    tracing::debug!(
        provider = %handle.name,
        version = %handle.version,
        ?generation,
        "configuring provider"
    );
    state.update(|s| {
        s.legacy_web3 = generation == ProviderGeneration::Legacy;
        s.modern_web3 = generation == ProviderGeneration::Modern;
        s.web3_instance = Some(handle);
    })?;
    Ok(generation)
}

/// Write capability limited to the provider instance and its flags.
#[derive(Clone)]
pub struct ProviderConfigurator {
    state: StateWriter,
    host: Arc<dyn HostPort>,
}

impl ProviderConfigurator {
    pub fn new(state: StateWriter, host: Arc<dyn HostPort>) -> Self {
        Self { state, host }
    }

    /// Configures `handle`, or the host's ambient provider when `None`.
    pub fn configure(
        &self,
        handle: Option<ProviderHandle>,
    ) -> Result<ProviderGeneration, AssistError> {
        let handle = handle.or_else(|| self.host.ambient_provider()).ok_or_else(|| {
            AssistError::fatal(
                FailureCode::InitFail,
                "A web3 provider is needed and none was found",
            )
        })?;
        configure_provider(&self.state, handle)
    }

    /// Returns the active generation, lazily configuring the ambient
    /// provider when no instance exists yet.
    pub fn ensure_instance(&self) -> Result<ProviderGeneration, AssistError> {
        let existing = self
            .state
            .read(|s| s.web3_instance.as_ref().and(s.provider_generation()))?;
        match existing {
            Some(generation) => Ok(generation),
            None => self.configure(None),
        }
    }

    pub fn has_ambient(&self) -> bool {
        self.host.ambient_provider().is_some()
    }
}
