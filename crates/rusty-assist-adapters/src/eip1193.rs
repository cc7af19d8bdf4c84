use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use alloy::json_abi::{Function, StateMutability};
use alloy::primitives::{keccak256, Address, U256};
use async_trait::async_trait;
use serde_json::{json, Map, Value};

use rusty_assist_core::{
    encode_calldata, HostPort, InvocationPort, MethodHandle, PortError, ProviderHandle,
    ProviderPort,
};

use crate::AssistAdapterConfig;

/// Wallet provider speaking EIP-1193 style JSON-RPC, or answering
/// deterministically when no endpoint is configured.
#[derive(Debug, Clone)]
pub struct Eip1193Adapter {
    mode: ProviderMode,
    state: Arc<Mutex<ProviderState>>,
    ambient: Option<ProviderHandle>,
}

#[derive(Debug, Clone)]
enum ProviderMode {
    Deterministic,
    Proxy(ProxyRuntime),
}

#[derive(Debug, Clone)]
struct ProxyRuntime {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Clone)]
struct ProviderState {
    accounts: Vec<Address>,
    chain_id: u64,
    balance: U256,
    enabled: bool,
    reject_sends: bool,
    sent: Vec<Value>,
    request_seq: u64,
}

impl Default for Eip1193Adapter {
    fn default() -> Self {
        Self::with_config(AssistAdapterConfig::default())
    }
}

impl Eip1193Adapter {
    pub fn with_config(config: AssistAdapterConfig) -> Self {
        let mode = match config.provider_proxy_url {
            Some(ref base_url) => {
                let timeout = Duration::from_millis(config.rpc_timeout_ms);
                match reqwest::Client::builder().timeout(timeout).build() {
                    Ok(client) => ProviderMode::Proxy(ProxyRuntime {
                        base_url: base_url.clone(),
                        client,
                    }),
                    Err(e) => {
                        tracing::warn!(error = %e, "proxy client unavailable, using deterministic provider");
                        ProviderMode::Deterministic
                    }
                }
            }
            None => ProviderMode::Deterministic,
        };

        Self {
            mode,
            state: Arc::new(Mutex::new(ProviderState {
                accounts: config.accounts.clone(),
                chain_id: config.chain_id,
                balance: config.balance,
                enabled: true,
                reject_sends: false,
                sent: Vec::new(),
                request_seq: 0,
            })),
            ambient: config.ambient_provider(),
        }
    }

    pub fn is_proxy(&self) -> bool {
        matches!(self.mode, ProviderMode::Proxy(_))
    }

    fn lock(&self) -> Result<MutexGuard<'_, ProviderState>, PortError> {
        self.state
            .lock()
            .map_err(|e| PortError::Transport(format!("provider lock poisoned: {e}")))
    }

    pub async fn accounts(&self) -> Result<Vec<Address>, PortError> {
        if !self.is_proxy() {
            return Ok(self.lock()?.accounts.clone());
        }
        let result = self.request("eth_accounts", json!([])).await?;
        let items = result
            .as_array()
            .ok_or_else(|| PortError::Transport("eth_accounts result must be array".to_owned()))?;
        items
            .iter()
            .map(|item| {
                item.as_str()
                    .ok_or_else(|| {
                        PortError::Transport("eth_accounts item must be string".to_owned())
                    })?
                    .parse::<Address>()
                    .map_err(|e| PortError::Validation(format!("invalid account: {e}")))
            })
            .collect()
    }

    pub async fn chain_id(&self) -> Result<u64, PortError> {
        if !self.is_proxy() {
            return Ok(self.lock()?.chain_id);
        }
        let result = self.request("eth_chainId", json!([])).await?;
        json_quantity_to_u64(&result)
    }

    pub async fn balance(&self, account: Address) -> Result<U256, PortError> {
        if !self.is_proxy() {
            return Ok(self.lock()?.balance);
        }
        let result = self
            .request("eth_getBalance", json!([account.to_string(), "latest"]))
            .await?;
        let raw = result
            .as_str()
            .ok_or_else(|| PortError::Transport("eth_getBalance result must be string".to_owned()))?;
        raw.parse::<U256>()
            .map_err(|e| PortError::Validation(format!("invalid balance {raw}: {e}")))
    }

    /// Whether the user has granted this dapp access to the wallet.
    pub fn is_enabled(&self) -> Result<bool, PortError> {
        Ok(self.lock()?.enabled)
    }

    /// Transactions accepted in deterministic mode, oldest first.
    pub fn sent_transactions(&self) -> Result<Vec<Value>, PortError> {
        Ok(self.lock()?.sent.clone())
    }

    pub fn debug_inject_accounts(&self, accounts: Vec<Address>) -> Result<(), PortError> {
        self.lock()?.accounts = accounts;
        Ok(())
    }

    pub fn debug_inject_chain_id(&self, chain_id: u64) -> Result<(), PortError> {
        self.lock()?.chain_id = chain_id;
        Ok(())
    }

    pub fn debug_inject_balance(&self, balance: U256) -> Result<(), PortError> {
        self.lock()?.balance = balance;
        Ok(())
    }

    pub fn debug_set_enabled(&self, enabled: bool) -> Result<(), PortError> {
        self.lock()?.enabled = enabled;
        Ok(())
    }

    pub fn debug_reject_sends(&self, reject: bool) -> Result<(), PortError> {
        self.lock()?.reject_sends = reject;
        Ok(())
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value, PortError> {
        let proxy = match &self.mode {
            ProviderMode::Proxy(proxy) => proxy,
            ProviderMode::Deterministic => {
                return Err(PortError::NotImplemented("eip1193 proxy runtime not enabled"))
            }
        };
        let id = {
            let mut g = self.lock()?;
            g.request_seq = g.request_seq.saturating_add(1);
            g.request_seq
        };

        let payload = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        tracing::debug!(method, id, "eip1193 proxy request");
        let response = proxy
            .client
            .post(&proxy.base_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| PortError::Transport(format!("eip1193 proxy request failed: {e}")))?;
        let status = response.status();
        let body: Value = response
            .json()
            .await
            .map_err(|e| PortError::Transport(format!("eip1193 proxy json decode failed: {e}")))?;
        if !status.is_success() {
            return Err(PortError::Transport(format!(
                "eip1193 proxy status {status}: {body}"
            )));
        }
        if let Some(err) = body.get("error") {
            return Err(PortError::Transport(format!(
                "eip1193 proxy returned error: {err}"
            )));
        }
        body.get("result")
            .cloned()
            .ok_or_else(|| PortError::Transport("eip1193 proxy missing result".to_owned()))
    }

    async fn invoke(
        &self,
        handle: &MethodHandle,
        entry: &Function,
        args: Vec<Value>,
    ) -> Result<Value, PortError> {
        match entry.state_mutability {
            StateMutability::Pure | StateMutability::View => {
                self.call(handle, &args, None, None).await
            }
            StateMutability::NonPayable | StateMutability::Payable => {
                self.send_contract_transaction(handle, &args, &json!({}))
                    .await
            }
        }
    }
}

fn bound_function(handle: &MethodHandle) -> Result<&Function, PortError> {
    handle
        .function
        .as_ref()
        .ok_or_else(|| PortError::NotFound(format!("contract has no method named {}", handle.name)))
}

fn json_quantity_to_u64(value: &Value) -> Result<u64, PortError> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| PortError::Validation(format!("invalid quantity: {n}"))),
        Value::String(s) => {
            let parsed = match s.strip_prefix("0x") {
                Some(hex) => u64::from_str_radix(hex, 16),
                None => s.parse(),
            };
            parsed.map_err(|e| PortError::Validation(format!("invalid quantity {s}: {e}")))
        }
        other => Err(PortError::Validation(format!("invalid quantity: {other}"))),
    }
}

#[async_trait]
impl ProviderPort for Eip1193Adapter {
    async fn call(
        &self,
        handle: &MethodHandle,
        args: &[Value],
        tx_object: Option<&Value>,
        default_block: Option<&Value>,
    ) -> Result<Value, PortError> {
        let data = encode_calldata(bound_function(handle)?, args)?;
        if !self.is_proxy() {
            let mut seed = Vec::new();
            if let Some(contract) = handle.contract {
                seed.extend_from_slice(contract.as_slice());
            }
            seed.extend_from_slice(&data);
            return Ok(json!(keccak256(seed).to_string()));
        }

        let mut call: Map<String, Value> = tx_object
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        if let Some(contract) = handle.contract {
            call.insert("to".to_owned(), json!(contract.to_string()));
        }
        call.insert("data".to_owned(), json!(data.to_string()));
        let block = default_block.cloned().unwrap_or_else(|| json!("latest"));
        self.request("eth_call", json!([Value::Object(call), block]))
            .await
    }

    async fn send_contract_transaction(
        &self,
        handle: &MethodHandle,
        args: &[Value],
        tx_object: &Value,
    ) -> Result<Value, PortError> {
        let data = encode_calldata(bound_function(handle)?, args)?;
        let mut tx = tx_object.as_object().cloned().unwrap_or_default();
        if let Some(contract) = handle.contract {
            tx.insert("to".to_owned(), json!(contract.to_string()));
        }
        tx.insert("data".to_owned(), json!(data.to_string()));
        self.send_transaction(&Value::Object(tx)).await
    }

    async fn send_transaction(&self, tx_object: &Value) -> Result<Value, PortError> {
        if self.is_proxy() {
            return self
                .request("eth_sendTransaction", json!([tx_object]))
                .await;
        }

        let mut g = self.lock()?;
        if g.reject_sends {
            return Err(PortError::Transport(
                "user rejected transaction".to_owned(),
            ));
        }
        let mut seed = tx_object.to_string().into_bytes();
        seed.extend_from_slice(&(g.sent.len() as u64).to_be_bytes());
        g.sent.push(tx_object.clone());
        Ok(json!(keccak256(seed).to_string()))
    }
}

/// Both generations reach the node through the same JSON-RPC calls.
#[async_trait]
impl InvocationPort for Eip1193Adapter {
    async fn legacy_invoke(
        &self,
        handle: &MethodHandle,
        entry: &Function,
        args: Vec<Value>,
    ) -> Result<Value, PortError> {
        self.invoke(handle, entry, args).await
    }

    async fn modern_invoke(
        &self,
        handle: &MethodHandle,
        entry: &Function,
        args: Vec<Value>,
    ) -> Result<Value, PortError> {
        self.invoke(handle, entry, args).await
    }
}

impl HostPort for Eip1193Adapter {
    fn ambient_provider(&self) -> Option<ProviderHandle> {
        self.ambient.clone()
    }
}
