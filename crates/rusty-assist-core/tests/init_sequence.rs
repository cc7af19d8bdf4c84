mod common;

use std::sync::atomic::Ordering;

use serde_json::json;

use rusty_assist_core::{
    Assist, AssistConfig, CategoryCode, EventCode, FailureCode, ProviderGeneration, VERSION,
};

use common::{config_with, legacy_provider, modern_provider, Harness};

#[tokio::test]
async fn init_without_config_fails_and_notifies() {
    let h = Harness::new();
    let err = Assist::init(None, h.state.clone(), h.collaborators())
        .await
        .err()
        .expect("init must fail");
    assert_eq!(err.code(), Some(FailureCode::InitFail));
    assert_eq!(err.reason(), "A config object is needed to initialize assist");

    let events = h.notifier.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_code, EventCode::InitFail);
    assert_eq!(events[0].category_code, CategoryCode::Initialize);
}

#[tokio::test]
async fn init_with_empty_config_reports_missing_api_key() {
    let h = Harness::new();
    let err = Assist::init(
        Some(AssistConfig::default()),
        h.state.clone(),
        h.collaborators(),
    )
    .await
    .err()
    .expect("init must fail");
    assert_eq!(err.code(), Some(FailureCode::InitFail));
    assert_eq!(err.reason(), "No API key provided to init function");

    let events = h.notifier.events();
    assert_eq!(events[0].event_code, EventCode::InitFail);
    assert_eq!(
        events[0].reason.as_deref(),
        Some("No API key provided to init function")
    );
    assert!(!h.state.snapshot().expect("snapshot").valid_api_key);
    assert_eq!(h.environment.runs.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn blank_dapp_id_counts_as_missing() {
    let h = Harness::new();
    let err = Assist::init(Some(AssistConfig::new("  ")), h.state.clone(), h.collaborators())
        .await
        .err()
        .expect("init must fail");
    assert_eq!(err.code(), Some(FailureCode::InitFail));
}

#[test]
fn json_config_must_be_an_object() {
    let err = AssistConfig::from_json(&json!("dapp-123")).expect_err("string is not a config");
    assert_eq!(err.code(), Some(FailureCode::InitFail));

    let config = AssistConfig::from_json(&json!({
        "dappId": "dapp-123",
        "headlessMode": true,
        "networkId": 4
    }))
    .expect("object config");
    assert!(config.headless_mode);
    assert_eq!(config.network_id, Some(4));
    assert!(!config.mobile_blocked);
}

#[tokio::test]
async fn init_configures_explicit_provider_and_emits_init_state() {
    let h = Harness::new();
    let _assist = h.init(config_with(legacy_provider())).await;

    let state = h.state.snapshot().expect("snapshot");
    assert_eq!(state.version, VERSION);
    assert_eq!(state.provider_generation(), Some(ProviderGeneration::Legacy));
    assert_eq!(state.web3_instance, Some(legacy_provider()));
    assert_eq!(h.environment.runs.load(Ordering::SeqCst), 1);

    let events = h.notifier.events();
    let init_state = events
        .iter()
        .find(|e| e.event_code == EventCode::InitState)
        .expect("initState event");
    assert_eq!(init_state.category_code, CategoryCode::Initialize);
    let snapshot = init_state.state.as_ref().expect("state payload");
    assert_eq!(snapshot["legacyWeb3"], json!(true));
}

#[tokio::test]
async fn init_falls_back_to_ambient_provider() {
    let h = Harness::new();
    *h.host.ambient.lock().expect("host lock") = Some(modern_provider());
    let _assist = h.init(AssistConfig::new("dapp-123")).await;

    let state = h.state.snapshot().expect("snapshot");
    assert_eq!(state.provider_generation(), Some(ProviderGeneration::Modern));
}

#[tokio::test]
async fn init_without_any_provider_marks_wallet_missing() {
    let h = Harness::new();
    h.set(|s| s.web3_wallet = true);
    let _assist = h.init(AssistConfig::new("dapp-123")).await;

    let state = h.state.snapshot().expect("snapshot");
    assert!(!state.web3_wallet);
    assert!(state.web3_instance.is_none());
}

#[tokio::test]
async fn environment_failure_does_not_abort_init() {
    let h = Harness::new();
    *h.environment.failure.lock().expect("env lock") = Some(
        rusty_assist_core::AssistError::from_code(FailureCode::NetworkFail),
    );
    let assist = h.init(config_with(modern_provider())).await;

    let err = assist.get_state().await.expect_err("get_state is gated");
    assert_eq!(err.code(), Some(FailureCode::NetworkFail));
}

#[tokio::test]
async fn get_state_reruns_environment_check() {
    let h = Harness::new();
    let assist = h.init(config_with(modern_provider())).await;
    let state = assist.get_state().await.expect("state");

    assert!(state.config.expect("config").has_dapp_id());
    assert_eq!(h.environment.runs.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn unparseable_provider_version_is_an_init_failure() {
    let h = Harness::new();
    let config = config_with(rusty_assist_core::ProviderHandle::new("web3", "beta"));
    let err = Assist::init(Some(config), h.state.clone(), h.collaborators())
        .await
        .err()
        .expect("init must fail");
    assert_eq!(err.code(), Some(FailureCode::InitFail));
    assert!(h
        .notifier
        .events()
        .iter()
        .any(|e| e.event_code == EventCode::InitFail));
}

#[tokio::test]
async fn unparseable_ambient_version_is_an_init_failure() {
    let h = Harness::new();
    *h.host.ambient.lock().expect("host lock") =
        Some(rusty_assist_core::ProviderHandle::new("web3", "beta"));
    let err = Assist::init(
        Some(AssistConfig::new("dapp-123")),
        h.state.clone(),
        h.collaborators(),
    )
    .await
    .err()
    .expect("init must fail");
    assert_eq!(err.code(), Some(FailureCode::InitFail));
    assert!(err.reason().contains("beta"));

    let failures: Vec<_> = h
        .notifier
        .events()
        .into_iter()
        .filter(|e| e.event_code == EventCode::InitFail)
        .collect();
    assert_eq!(failures.len(), 1);
    assert!(h.state.snapshot().expect("snapshot").web3_instance.is_none());
}

#[tokio::test]
async fn late_unparseable_ambient_version_fails_transaction_with_tag() {
    let h = Harness::new();
    let assist = h.init(AssistConfig::new("dapp-123")).await;
    *h.host.ambient.lock().expect("host lock") =
        Some(rusty_assist_core::ProviderHandle::new("web3", "beta"));

    let err = assist
        .transaction(json!({"to": "0x000000000000000000000000000000000000dEaD"}), None)
        .await
        .expect_err("provider version unusable");
    assert_eq!(err.code(), Some(FailureCode::InitFail));
    assert!(h.provider.recorded().is_empty());
}
