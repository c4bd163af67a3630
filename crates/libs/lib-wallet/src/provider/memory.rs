//! # In-Memory Provider
//!
//! A scriptable wallet provider living in the same process. It behaves like a
//! browser extension that has been pre-loaded with accounts: `eth_requestAccounts`
//! authorizes the origin, `eth_accounts` only reveals accounts once authorized,
//! and the `set_*` methods push `accountsChanged`/`chainChanged` like the real thing.
//!
//! Used by the CLI demo mode and as the test double for the session controller.
//!
//! ```rust
//! use lib_wallet::provider::memory::MemoryProvider;
//!
//! let provider = MemoryProvider::new()
//!     .with_accounts(["0xabc0000000000000000000000000000000000001"])
//!     .with_chain("0x1");
//! provider.set_balance("0x1", "0xabc0000000000000000000000000000000000001", 10u64.pow(18));
//! ```

use async_trait::async_trait;
use num_bigint::BigUint;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::Semaphore;

use super::{
    methods, EventHandler, ListenerId, ListenerRegistry, ProviderEvent, ProviderEventKind, WalletProvider,
};
use crate::error::{ProviderError, Result, WalletError};

#[derive(Default)]
struct MemoryState {
    installed: bool,
    authorized: bool,
    accounts: Vec<String>,
    chain_id: String,
    /// Keyed by (chain id, lowercase account)
    balances: HashMap<(String, String), BigUint>,
    failures: HashMap<String, VecDeque<ProviderError>>,
    holds: HashMap<String, Arc<Semaphore>>,
    calls: Vec<(String, Vec<Value>)>,
}

/// Scriptable in-process provider.
pub struct MemoryProvider {
    state: Mutex<MemoryState>,
    listeners: ListenerRegistry,
}

impl Default for MemoryProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryProvider {
    /// Installed provider on chain `0x1` with no accounts.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MemoryState {
                installed: true,
                chain_id: "0x1".to_string(),
                ..Default::default()
            }),
            listeners: ListenerRegistry::new(),
        }
    }

    /// Provider that is not installed at all.
    pub fn uninstalled() -> Self {
        let provider = Self::new();
        provider.state.lock().installed = false;
        provider
    }

    pub fn with_accounts<I, S>(self, accounts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.state.lock().accounts = accounts.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_chain(self, chain_id: impl Into<String>) -> Self {
        self.state.lock().chain_id = chain_id.into();
        self
    }

    /// Treat the origin as already authorized, as after a previous page load.
    pub fn pre_authorized(self) -> Self {
        self.state.lock().authorized = true;
        self
    }

    pub fn set_installed(&self, installed: bool) {
        self.state.lock().installed = installed;
    }

    /// Replace the wallet's accounts; emits `accountsChanged` when the origin is authorized.
    pub fn set_accounts<I, S>(&self, accounts: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let visible = {
            let mut state = self.state.lock();
            state.accounts = accounts.into_iter().map(Into::into).collect();
            state.authorized.then(|| state.accounts.clone())
        };

        if let Some(accounts) = visible {
            self.emit(ProviderEvent::AccountsChanged(accounts));
        }
    }

    /// Withdraw the origin's authorization; emits an empty `accountsChanged`.
    pub fn revoke(&self) {
        let was_authorized = std::mem::replace(&mut self.state.lock().authorized, false);
        if was_authorized {
            self.emit(ProviderEvent::AccountsChanged(Vec::new()));
        }
    }

    /// Switch networks; emits `chainChanged`.
    pub fn set_chain(&self, chain_id: impl Into<String>) {
        let chain_id = chain_id.into();
        self.state.lock().chain_id = chain_id.clone();
        self.emit(ProviderEvent::ChainChanged(chain_id));
    }

    pub fn set_balance(&self, chain_id: &str, account: &str, wei: impl Into<BigUint>) {
        self.state
            .lock()
            .balances
            .insert((chain_id.to_ascii_lowercase(), account.to_ascii_lowercase()), wei.into());
    }

    /// Make the next call of `method` fail with `error`. Failures queue up in order.
    pub fn fail_next(&self, method: &str, error: ProviderError) {
        self.state
            .lock()
            .failures
            .entry(method.to_string())
            .or_default()
            .push_back(error);
    }

    /// Park every call of `method` until [`release`](Self::release) is called.
    pub fn hold(&self, method: &str) {
        self.state
            .lock()
            .holds
            .insert(method.to_string(), Arc::new(Semaphore::new(0)));
    }

    /// Let parked and future calls of `method` proceed.
    pub fn release(&self, method: &str) {
        if let Some(gate) = self.state.lock().holds.remove(method) {
            gate.close();
        }
    }

    /// Push a raw event to subscribers.
    pub fn emit(&self, event: ProviderEvent) -> usize {
        self.listeners.emit(&event)
    }

    /// Every request received so far, in order.
    pub fn calls(&self) -> Vec<(String, Vec<Value>)> {
        self.state.lock().calls.clone()
    }

    pub fn call_count(&self, method: &str) -> usize {
        self.state.lock().calls.iter().filter(|(m, _)| m == method).count()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    fn respond(&self, method: &str, params: &[Value]) -> Result<Value> {
        let mut state = self.state.lock();

        if let Some(error) = state.failures.get_mut(method).and_then(VecDeque::pop_front) {
            return Err(WalletError::Provider(error));
        }

        match method {
            methods::REQUEST_ACCOUNTS => {
                state.authorized = true;
                Ok(json!(state.accounts))
            }
            methods::ACCOUNTS => {
                if state.authorized {
                    Ok(json!(state.accounts))
                } else {
                    Ok(json!([]))
                }
            }
            methods::CHAIN_ID => Ok(json!(state.chain_id)),
            methods::GET_BALANCE => {
                let account = params
                    .first()
                    .and_then(Value::as_str)
                    .ok_or_else(|| WalletError::provider(-32602, "eth_getBalance expects an address"))?
                    .to_ascii_lowercase();
                let key = (state.chain_id.to_ascii_lowercase(), account);
                let wei = state.balances.get(&key).cloned().unwrap_or_default();
                Ok(json!(format!("0x{:x}", wei)))
            }
            other => Err(WalletError::provider(
                ProviderError::UNSUPPORTED_METHOD,
                format!("The provider does not support {}", other),
            )),
        }
    }
}

#[async_trait]
impl WalletProvider for MemoryProvider {
    fn is_available(&self) -> bool {
        self.state.lock().installed
    }

    async fn request(&self, method: &str, params: Vec<Value>) -> Result<Value> {
        let gate = {
            let mut state = self.state.lock();
            if !state.installed {
                return Err(WalletError::ProviderUnavailable);
            }
            state.calls.push((method.to_string(), params.clone()));
            state.holds.get(method).cloned()
        };

        if let Some(gate) = gate {
            // Resolves once the gate is closed by `release`
            let _ = gate.acquire().await;
        }

        self.respond(method, &params)
    }

    fn subscribe(&self, kind: ProviderEventKind, handler: EventHandler) -> ListenerId {
        self.listeners.add(kind, handler)
    }

    fn unsubscribe(&self, kind: ProviderEventKind, id: ListenerId) -> bool {
        self.listeners.remove(kind, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const ALICE: &str = "0xabc0000000000000000000000000000000000001";

    #[tokio::test]
    async fn test_accounts_hidden_until_authorized() {
        let provider = MemoryProvider::new().with_accounts([ALICE]);

        let probe = provider.request(methods::ACCOUNTS, vec![]).await.unwrap();
        assert_eq!(probe, json!([]));

        let granted = provider.request(methods::REQUEST_ACCOUNTS, vec![]).await.unwrap();
        assert_eq!(granted, json!([ALICE]));

        let probe = provider.request(methods::ACCOUNTS, vec![]).await.unwrap();
        assert_eq!(probe, json!([ALICE]));
    }

    #[tokio::test]
    async fn test_balance_is_chain_relative() {
        let provider = MemoryProvider::new().with_chain("0x1");
        provider.set_balance("0x1", ALICE, 255u64);

        let params = vec![json!(ALICE), json!("latest")];
        let mainnet = provider.request(methods::GET_BALANCE, params.clone()).await.unwrap();
        assert_eq!(mainnet, json!("0xff"));

        provider.set_chain("0x89");
        let polygon = provider.request(methods::GET_BALANCE, params).await.unwrap();
        assert_eq!(polygon, json!("0x0"));
    }

    #[tokio::test]
    async fn test_uninstalled_rejects_requests() {
        let provider = MemoryProvider::uninstalled();
        assert!(!provider.is_available());
        assert_eq!(
            provider.request(methods::CHAIN_ID, vec![]).await,
            Err(WalletError::ProviderUnavailable)
        );
        assert!(provider.calls().is_empty());
    }

    #[tokio::test]
    async fn test_queued_failure_applies_once() {
        let provider = MemoryProvider::new();
        provider.fail_next(methods::CHAIN_ID, ProviderError::new(-32603, "boom"));

        assert_eq!(
            provider.request(methods::CHAIN_ID, vec![]).await,
            Err(WalletError::provider(-32603, "boom"))
        );
        assert_eq!(provider.request(methods::CHAIN_ID, vec![]).await, Ok(json!("0x1")));
        assert_eq!(provider.call_count(methods::CHAIN_ID), 2);
    }

    #[tokio::test]
    async fn test_hold_parks_until_release() {
        let provider = Arc::new(MemoryProvider::new());
        provider.hold(methods::CHAIN_ID);

        let pending = tokio::spawn({
            let provider = provider.clone();
            async move { provider.request(methods::CHAIN_ID, vec![]).await }
        });

        while provider.call_count(methods::CHAIN_ID) == 0 {
            tokio::task::yield_now().await;
        }
        assert!(!pending.is_finished());

        provider.release(methods::CHAIN_ID);
        assert_eq!(pending.await.unwrap(), Ok(json!("0x1")));
    }

    #[test]
    fn test_account_events_only_after_authorization() {
        let provider = MemoryProvider::new().with_accounts([ALICE]);
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = seen.clone();
        provider.subscribe(
            ProviderEventKind::AccountsChanged,
            Arc::new(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );

        provider.set_accounts([ALICE]);
        assert_eq!(seen.load(Ordering::SeqCst), 0);

        let provider = provider.pre_authorized();
        provider.set_accounts([ALICE]);
        provider.revoke();
        provider.revoke();
        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }
}
