#![allow(dead_code)]

use std::io::Read;
use std::sync::{Arc, Mutex};
use std::thread;

use alloy::json_abi::Function;
use alloy::primitives::{Address, U256};
use serde_json::{json, Value};
use tiny_http::{Response, Server, StatusCode};

use rusty_assist_adapters::{AssistAdapterConfig, AssistRuntime, Eip1193Adapter, RecordingNotifier};
use rusty_assist_core::{AssistConfig, ContractDescriptor};

pub const MOBILE_USER_AGENT: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) \
     AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Mobile/15E148 Safari/604.1";

pub const SAFARI_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_0) \
     AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Safari/605.1.15";

pub fn one_ether() -> U256 {
    U256::from(1_000_000_000_000_000_000u128)
}

pub fn assist_config() -> AssistConfig {
    AssistConfig {
        network_id: Some(1),
        minimum_balance: Some(one_ether() / U256::from(10u64)),
        ..AssistConfig::new("dapp-123")
    }
}

pub fn headless_config() -> AssistConfig {
    AssistConfig {
        headless_mode: true,
        ..assist_config()
    }
}

pub struct Started {
    pub runtime: AssistRuntime,
    pub notifier: Arc<RecordingNotifier>,
}

pub async fn start(adapter: AssistAdapterConfig, config: AssistConfig) -> Started {
    let notifier = Arc::new(RecordingNotifier::default());
    let runtime = AssistRuntime::start(adapter, Some(config), notifier.clone())
        .await
        .expect("start runtime");
    Started { runtime, notifier }
}

pub async fn start_with(
    provider: Arc<Eip1193Adapter>,
    adapter: &AssistAdapterConfig,
    config: AssistConfig,
) -> Started {
    let notifier = Arc::new(RecordingNotifier::default());
    let runtime =
        AssistRuntime::start_with_provider(provider, adapter, Some(config), notifier.clone())
            .await
            .expect("start runtime");
    Started { runtime, notifier }
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

pub fn legacy_token() -> Arc<ContractDescriptor> {
    Arc::new(ContractDescriptor::legacy(
        Some(token_address()),
        vec![transfer_fn(), balance_of_fn()],
    ))
}

pub fn wallet_account() -> Address {
    Address::with_last_byte(1)
}

/// JSON-RPC requests seen by the mock node, in arrival order.
pub type RpcLog = Arc<Mutex<Vec<Value>>>;

/// Mock node answering the methods the provider adapter uses. Methods in
/// `failing` answer with a JSON-RPC error.
pub fn spawn_rpc_server(
    log: RpcLog,
    failing: &'static [&'static str],
) -> (String, thread::JoinHandle<()>) {
    let server = Server::http("127.0.0.1:0").expect("start server");
    let addr = format!("http://{}", server.server_addr());

    let join = thread::spawn(move || {
        for _ in 0..32 {
            let mut req = match server.recv() {
                Ok(r) => r,
                Err(_) => break,
            };
            let mut body = String::new();
            let _ = req.as_reader().read_to_string(&mut body);
            let request: Value = serde_json::from_str(&body).unwrap_or(Value::Null);
            if let Ok(mut g) = log.lock() {
                g.push(request.clone());
            }

            let id = request.get("id").cloned().unwrap_or(json!(1));
            let method = request
                .get("method")
                .and_then(Value::as_str)
                .unwrap_or_default();
            let payload = if failing.contains(&method) {
                json!({"jsonrpc": "2.0", "id": id, "error": {"code": -32000, "message": "execution reverted"}})
            } else {
                let result = match method {
                    "eth_chainId" => json!("0x4"),
                    "eth_accounts" => json!(["0x2000000000000000000000000000000000000002"]),
                    "eth_getBalance" => json!("0xde0b6b3a7640000"),
                    "eth_call" => json!(
                        "0x0000000000000000000000000000000000000000000000000000000000000001"
                    ),
                    "eth_sendTransaction" => json!(
                        "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa"
                    ),
                    _ => Value::Null,
                };
                json!({"jsonrpc": "2.0", "id": id, "result": result})
            };

            let response =
                Response::from_string(payload.to_string()).with_status_code(StatusCode(200));
            let _ = req.respond(response);
        }
    });

    (addr, join)
}

pub fn proxy_config(base_url: String) -> AssistAdapterConfig {
    AssistAdapterConfig {
        provider_proxy_url: Some(base_url),
        rpc_timeout_ms: 5_000,
        ..AssistAdapterConfig::default()
    }
}

pub fn methods(log: &RpcLog) -> Vec<String> {
    log.lock()
        .expect("rpc log lock")
        .iter()
        .filter_map(|r| r.get("method").and_then(Value::as_str).map(str::to_owned))
        .collect()
}
