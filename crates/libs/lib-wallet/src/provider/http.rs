//! # HTTP Provider
//!
//! JSON-RPC 2.0 gateway to a wallet node over HTTP.
//!
//! A plain HTTP endpoint cannot push events, so `accountsChanged` and
//! `chainChanged` are emulated: while at least one handler is subscribed a
//! background task polls `eth_accounts` and `eth_chainId` and emits on change.
//! The first successful poll only records a baseline.
//!
//! ## Availability
//!
//! The provider is available when a URL is configured and the last request
//! reached the node. A transport failure flips it to unavailable until the
//! next successful request (the poller keeps probing).
//!
//! ## Error mapping
//!
//! | Failure | Result |
//! |---------|--------|
//! | no URL configured | `ProviderUnavailable` |
//! | connect/timeout | `Provider { code: 4900 }` |
//! | body is not JSON | `Provider { code: -32700 }` |
//! | JSON-RPC `error` object | `Provider { code, message }` verbatim |

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use super::{methods, EventHandler, ListenerId, ListenerRegistry, ProviderEvent, ProviderEventKind, WalletProvider};
use crate::config::WalletConfig;
use crate::error::{ProviderError, Result, WalletError};

// region: --- Wire types

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

// endregion: --- Wire types

struct Shared {
    client: Client,
    url: Option<String>,
    next_id: AtomicU64,
    reachable: AtomicBool,
    listeners: ListenerRegistry,
    poll_interval: Duration,
    poller: Mutex<Option<JoinHandle<()>>>,
}

impl Shared {
    async fn call(&self, method: &str, params: Vec<Value>) -> Result<Value> {
        let url = self.url.as_deref().ok_or(WalletError::ProviderUnavailable)?;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        let response = match self.client.post(url).json(&body).send().await {
            Ok(response) => response,
            Err(e) => {
                if self.reachable.swap(false, Ordering::Relaxed) {
                    warn!(url, error = %e, "Wallet node unreachable");
                }
                return Err(WalletError::provider(
                    ProviderError::DISCONNECTED,
                    format!("Provider disconnected: {}", e),
                ));
            }
        };
        self.reachable.store(true, Ordering::Relaxed);

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| WalletError::provider(ProviderError::DISCONNECTED, format!("Failed to read response: {}", e)))?;

        let parsed: RpcResponse = match serde_json::from_str(&text) {
            Ok(parsed) => parsed,
            Err(_) if !status.is_success() => {
                return Err(WalletError::provider(
                    ProviderError::INTERNAL,
                    format!("Wallet node returned HTTP {}", status),
                ));
            }
            Err(e) => {
                return Err(WalletError::provider(
                    ProviderError::PARSE_ERROR,
                    format!("Failed to parse response: {}", e),
                ));
            }
        };

        debug!(method, id, "JSON-RPC call completed");

        match parsed {
            RpcResponse { error: Some(err), .. } => Err(WalletError::provider(err.code, err.message)),
            RpcResponse { result: Some(result), .. } => Ok(result),
            RpcResponse { .. } => Err(WalletError::InvalidResponse(format!(
                "{} reply carried neither result nor error",
                method
            ))),
        }
    }

    async fn poll_accounts(&self) -> Option<Vec<String>> {
        let value = self.call(methods::ACCOUNTS, Vec::new()).await.ok()?;
        serde_json::from_value(value).ok()
    }

    async fn poll_chain(&self) -> Option<String> {
        let value = self.call(methods::CHAIN_ID, Vec::new()).await.ok()?;
        value.as_str().map(str::to_ascii_lowercase)
    }
}

/// Poll until the provider is dropped. Holds only a weak reference between ticks.
async fn poll_loop(shared: Weak<Shared>, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut last_accounts: Option<Vec<String>> = None;
    let mut last_chain: Option<String> = None;

    loop {
        ticker.tick().await;

        let Some(shared) = shared.upgrade() else {
            break;
        };
        if shared.listeners.is_empty() {
            continue;
        }

        if let Some(accounts) = shared.poll_accounts().await {
            if last_accounts.as_ref().is_some_and(|last| *last != accounts) {
                shared.listeners.emit(&ProviderEvent::AccountsChanged(accounts.clone()));
            }
            last_accounts = Some(accounts);
        }

        if let Some(chain) = shared.poll_chain().await {
            if last_chain.as_ref().is_some_and(|last| *last != chain) {
                shared.listeners.emit(&ProviderEvent::ChainChanged(chain.clone()));
            }
            last_chain = Some(chain);
        }
    }
}

/// JSON-RPC over HTTP wallet provider.
pub struct HttpProvider {
    shared: Arc<Shared>,
}

impl HttpProvider {
    /// Create a gateway for `url`. `None` models a host with no provider installed.
    pub fn new(url: Option<String>, request_timeout: Duration, poll_interval: Duration) -> Self {
        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            shared: Arc::new(Shared {
                client,
                url,
                next_id: AtomicU64::new(0),
                reachable: AtomicBool::new(true),
                listeners: ListenerRegistry::new(),
                poll_interval,
                poller: Mutex::new(None),
            }),
        }
    }

    pub fn from_config(config: &WalletConfig) -> Self {
        Self::new(config.provider_url.clone(), config.request_timeout, config.poll_interval)
    }

    fn ensure_poller(&self) {
        let mut poller = self.shared.poller.lock();
        if poller.as_ref().is_some_and(|task| !task.is_finished()) || self.shared.url.is_none() {
            return;
        }

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let weak = Arc::downgrade(&self.shared);
                *poller = Some(handle.spawn(poll_loop(weak, self.shared.poll_interval)));
            }
            Err(_) => warn!("No tokio runtime; account and chain changes will not be observed"),
        }
    }
}

impl Drop for HttpProvider {
    fn drop(&mut self) {
        if let Some(task) = self.shared.poller.lock().take() {
            task.abort();
        }
    }
}

#[async_trait]
impl WalletProvider for HttpProvider {
    fn is_available(&self) -> bool {
        self.shared.url.is_some() && self.shared.reachable.load(Ordering::Relaxed)
    }

    async fn request(&self, method: &str, params: Vec<Value>) -> Result<Value> {
        if !self.is_available() {
            // The poller flips reachability back once the node answers again
            self.ensure_poller();
            return Err(WalletError::ProviderUnavailable);
        }
        self.shared.call(method, params).await
    }

    fn subscribe(&self, kind: ProviderEventKind, handler: EventHandler) -> ListenerId {
        let id = self.shared.listeners.add(kind, handler);
        self.ensure_poller();
        id
    }

    fn unsubscribe(&self, kind: ProviderEventKind, id: ListenerId) -> bool {
        self.shared.listeners.remove(kind, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::State;
    use axum::routing::post;
    use axum::{Json, Router};

    const ALICE: &str = "0xabc0000000000000000000000000000000000001";

    #[derive(Default)]
    struct Node {
        accounts: Mutex<Vec<String>>,
        chain_id: Mutex<String>,
        reject_prompt: AtomicBool,
    }

    async fn handle(State(node): State<Arc<Node>>, Json(req): Json<Value>) -> Json<Value> {
        let id = req["id"].clone();
        let reply = match req["method"].as_str().unwrap_or_default() {
            "eth_requestAccounts" if node.reject_prompt.load(Ordering::SeqCst) => {
                json!({"jsonrpc": "2.0", "id": id, "error": {"code": 4001, "message": "User rejected the request."}})
            }
            "eth_requestAccounts" | "eth_accounts" => {
                json!({"jsonrpc": "2.0", "id": id, "result": *node.accounts.lock()})
            }
            "eth_chainId" => json!({"jsonrpc": "2.0", "id": id, "result": *node.chain_id.lock()}),
            "eth_getBalance" => json!({"jsonrpc": "2.0", "id": id, "result": "0xde0b6b3a7640000"}),
            _ => json!({"jsonrpc": "2.0", "id": id, "error": {"code": -32601, "message": "Method not found"}}),
        };
        Json(reply)
    }

    async fn spawn_node(node: Arc<Node>) -> String {
        let app = Router::new().route("/", post(handle)).with_state(node);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn provider(url: Option<String>) -> HttpProvider {
        HttpProvider::new(url, Duration::from_secs(2), Duration::from_millis(20))
    }

    fn test_node() -> Arc<Node> {
        let node = Node::default();
        *node.accounts.lock() = vec![ALICE.to_string()];
        *node.chain_id.lock() = "0x1".to_string();
        Arc::new(node)
    }

    #[tokio::test]
    async fn test_request_returns_result() {
        let url = spawn_node(test_node()).await;
        let provider = provider(Some(url));

        assert!(provider.is_available());
        assert_eq!(provider.request(methods::CHAIN_ID, vec![]).await, Ok(json!("0x1")));
        assert_eq!(
            provider.request(methods::GET_BALANCE, vec![json!(ALICE), json!("latest")]).await,
            Ok(json!("0xde0b6b3a7640000"))
        );
    }

    #[tokio::test]
    async fn test_rpc_error_is_passed_through() {
        let node = test_node();
        node.reject_prompt.store(true, Ordering::SeqCst);
        let provider = provider(Some(spawn_node(node).await));

        let err = provider.request(methods::REQUEST_ACCOUNTS, vec![]).await.unwrap_err();
        assert_eq!(err, WalletError::provider(4001, "User rejected the request."));
        assert!(err.is_user_rejection());

        let err = provider.request("eth_sign", vec![]).await.unwrap_err();
        assert_eq!(err, WalletError::provider(-32601, "Method not found"));
    }

    #[tokio::test]
    async fn test_missing_url_is_unavailable() {
        let provider = provider(None);
        assert!(!provider.is_available());
        assert_eq!(
            provider.request(methods::ACCOUNTS, vec![]).await,
            Err(WalletError::ProviderUnavailable)
        );
    }

    #[tokio::test]
    async fn test_unreachable_node_maps_to_disconnected() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let provider = provider(Some(url));
        let err = provider.request(methods::CHAIN_ID, vec![]).await.unwrap_err();
        assert!(matches!(err, WalletError::Provider(ProviderError { code: 4900, .. })));
        assert!(!provider.is_available());

        // Once marked unavailable, requests agree with is_available()
        assert_eq!(
            provider.request(methods::CHAIN_ID, vec![]).await,
            Err(WalletError::ProviderUnavailable)
        );
    }

    #[tokio::test]
    async fn test_unavailable_node_recovers_when_it_answers_again() {
        // Arrange
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let provider = provider(Some(format!("http://{}", addr)));
        assert!(provider.request(methods::CHAIN_ID, vec![]).await.is_err());
        assert!(!provider.is_available());

        // Act
        let app = Router::new().route("/", post(handle)).with_state(test_node());
        let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        assert_eq!(
            provider.request(methods::CHAIN_ID, vec![]).await,
            Err(WalletError::ProviderUnavailable)
        );

        // Assert
        tokio::time::timeout(Duration::from_secs(2), async {
            while !provider.is_available() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();
        assert_eq!(provider.request(methods::CHAIN_ID, vec![]).await, Ok(json!("0x1")));
    }

    #[tokio::test]
    async fn test_polling_emits_changes_after_baseline() {
        let node = test_node();
        let provider = provider(Some(spawn_node(node.clone()).await));

        let (tx, rx) = async_channel::unbounded();
        for kind in ProviderEventKind::ALL {
            let tx = tx.clone();
            provider.subscribe(kind, Arc::new(move |event| {
                let _ = tx.try_send(event);
            }));
        }

        // Let the baseline poll land before changing anything
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(rx.is_empty());

        *node.chain_id.lock() = "0x89".to_string();
        let event = tokio::time::timeout(Duration::from_secs(2), rx.recv()).await.unwrap().unwrap();
        assert_eq!(event, ProviderEvent::ChainChanged("0x89".to_string()));

        node.accounts.lock().clear();
        let event = tokio::time::timeout(Duration::from_secs(2), rx.recv()).await.unwrap().unwrap();
        assert_eq!(event, ProviderEvent::AccountsChanged(vec![]));
    }
}
