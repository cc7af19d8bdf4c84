//! rusty-assist: onboards the configured wallet and prints the environment
//! state as JSON.

use std::process::ExitCode;
use std::sync::Arc;

use eyre::WrapErr;
use serde_json::{json, Value};

use rusty_assist_adapters::{AssistAdapterConfig, AssistRuntime, TracingNotifier};
use rusty_assist_core::{AssistConfig, AssistError};

/// `ASSIST_CONFIG` (a JSON object) wins over `ASSIST_DAPP_ID`.
fn load_assist_config() -> eyre::Result<AssistConfig> {
    if let Ok(raw) = std::env::var("ASSIST_CONFIG") {
        let value: Value = serde_json::from_str(&raw).wrap_err("ASSIST_CONFIG is not valid JSON")?;
        return AssistConfig::from_json(&value).map_err(|e| eyre::eyre!(e));
    }
    let mut config = AssistConfig::default();
    config.dapp_id = std::env::var("ASSIST_DAPP_ID").ok();
    config.headless_mode = std::env::var("ASSIST_HEADLESS")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    if let Ok(raw) = std::env::var("ASSIST_NETWORK_ID") {
        config.network_id = Some(raw.parse().wrap_err("ASSIST_NETWORK_ID")?);
    }
    Ok(config)
}

fn failure_report(e: &AssistError) -> Value {
    json!({
        "failure": e.code().map(|c| c.as_str()).unwrap_or("error"),
        "reason": e.reason(),
    })
}

#[tokio::main]
async fn main() -> eyre::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Starting rusty-assist");

    let adapter_config =
        AssistAdapterConfig::from_env().wrap_err("reading ASSIST_* environment")?;
    let assist_config = load_assist_config()?;

    let runtime = match AssistRuntime::start(
        adapter_config,
        Some(assist_config),
        Arc::new(TracingNotifier::default()),
    )
    .await
    {
        Ok(runtime) => runtime,
        Err(e) => {
            println!("{}", serde_json::to_string_pretty(&failure_report(&e))?);
            return Ok(ExitCode::from(2));
        }
    };

    let outcome = runtime.assist.onboard().await;
    let snapshot = runtime.state.snapshot().map_err(|e| eyre::eyre!(e))?;
    let state = serde_json::to_value(&snapshot).wrap_err("serializing environment state")?;
    let report = match &outcome {
        Ok(ready) => json!({ "ready": ready, "state": state }),
        Err(e) => json!({ "ready": false, "error": failure_report(e), "state": state }),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(match outcome {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::warn!(error = %e, "user is not ready to transact");
            ExitCode::from(1)
        }
    })
}
