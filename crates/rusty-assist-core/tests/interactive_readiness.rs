mod common;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde_json::json;

use rusty_assist_core::{AssistConfig, CategoryCode, EventCode, FailureCode};

use common::{config_with, modern_provider, Harness};

fn interactive_config() -> AssistConfig {
    AssistConfig {
        mobile_blocked: true,
        ..config_with(modern_provider())
    }
}

#[tokio::test]
async fn invalid_api_key_fails_before_anything_else() {
    let h = Harness::new();
    let assist = h.init(interactive_config()).await;
    h.set(|s| {
        s.valid_api_key = false;
        s.mobile_device = true;
    });

    let err = assist.onboard().await.expect_err("api key gate");
    assert_eq!(err.code(), Some(FailureCode::InitFail));
    assert_eq!(err.reason(), "Your API key is not valid");
    assert!(h.prepare.categories.lock().expect("prepare lock").is_empty());
}

#[tokio::test]
async fn unsupported_network_fails_with_init_fail() {
    let h = Harness::new();
    let assist = h.init(interactive_config()).await;
    h.set(|s| s.supported_network = false);

    let err = assist.onboard().await.expect_err("network gate");
    assert_eq!(err.code(), Some(FailureCode::InitFail));
    assert_eq!(err.reason(), "This network is not supported");
}

#[tokio::test]
async fn desktop_onboard_relays_prepare_for_transaction() {
    let h = Harness::new();
    let assist = h.init(interactive_config()).await;

    let ready = assist.onboard().await.expect("prepared");
    assert_eq!(ready, json!("prepared"));
    assert_eq!(
        *h.prepare.categories.lock().expect("prepare lock"),
        vec![CategoryCode::Onboard]
    );
}

#[tokio::test]
async fn mobile_onboard_waits_for_dismissal() {
    let h = Harness::new();
    let assist = h.init(interactive_config()).await;
    h.make_ready();
    h.set(|s| s.mobile_device = true);

    let dismissed = Arc::new(AtomicBool::new(false));
    let settled_after_dismissal = {
        let dismissed = Arc::clone(&dismissed);
        let assist = &assist;
        async move {
            let outcome = assist.onboard().await;
            (outcome, dismissed.load(Ordering::SeqCst))
        }
    };
    let dismiss = {
        let dismissed = Arc::clone(&dismissed);
        let notifier = Arc::clone(&h.notifier);
        async move {
            for _ in 0..100 {
                tokio::task::yield_now().await;
            }
            let mobile_events: Vec<_> = notifier
                .events()
                .into_iter()
                .filter(|e| e.event_code == EventCode::MobileBlocked)
                .collect();
            assert_eq!(mobile_events.len(), 1);
            assert_eq!(mobile_events[0].category_code, CategoryCode::Onboard);
            dismissed.store(true, Ordering::SeqCst);
            assert!(notifier.dismiss_latest(), "dismiss hook registered");
        }
    };

    let ((outcome, was_dismissed), ()) = tokio::join!(settled_after_dismissal, dismiss);
    let err = outcome.expect_err("mobile blocked");
    assert_eq!(err.code(), Some(FailureCode::MobileBlocked));
    assert!(was_dismissed, "settled only after the hook ran");

    let state = h.state.snapshot().expect("snapshot");
    assert!(!state.valid_browser);
    assert!(h.prepare.categories.lock().expect("prepare lock").is_empty());
}
