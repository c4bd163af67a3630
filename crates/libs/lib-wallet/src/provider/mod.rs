//! # Provider Gateway
//!
//! Thin capability-detection and request-dispatch wrapper around an injected
//! wallet provider. The gateway holds no session state and performs no retries:
//! failures are surfaced verbatim and retry policy belongs to the controller.
//!
//! ## Implementations
//!
//! - [`http::HttpProvider`]: JSON-RPC over HTTP; change events are emulated by polling
//! - [`memory::MemoryProvider`]: in-process, scriptable provider for demos and tests
//!
//! ## Contract
//!
//! - [`WalletProvider::is_available`] is evaluated on every call and never cached by callers
//! - [`WalletProvider::request`] fails with [`ProviderUnavailable`](crate::error::WalletError::ProviderUnavailable) when
//!   no provider is present and with [`Provider`](crate::error::WalletError::Provider) on provider-side rejection
//! - `accountsChanged` carries an ordered, possibly empty list of accounts;
//!   `chainChanged` carries a single hex chain id. No ordering between the two is assumed.

use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::error::Result;

pub mod http;
mod listeners;
pub mod memory;

pub use listeners::ListenerRegistry;

/// JSON-RPC method names used by the session.
pub mod methods {
    /// Prompting account request
    pub const REQUEST_ACCOUNTS: &str = "eth_requestAccounts";
    /// Non-prompting account probe
    pub const ACCOUNTS: &str = "eth_accounts";
    pub const CHAIN_ID: &str = "eth_chainId";
    pub const GET_BALANCE: &str = "eth_getBalance";
}

/// Event names a provider can push.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderEventKind {
    AccountsChanged,
    ChainChanged,
}

impl ProviderEventKind {
    pub const ALL: [ProviderEventKind; 2] = [ProviderEventKind::AccountsChanged, ProviderEventKind::ChainChanged];

    /// EIP-1193 event name
    pub fn event_name(&self) -> &'static str {
        match self {
            ProviderEventKind::AccountsChanged => "accountsChanged",
            ProviderEventKind::ChainChanged => "chainChanged",
        }
    }
}

impl fmt::Display for ProviderEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.event_name())
    }
}

/// Payload pushed by a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
    /// Accounts exposed to this origin; index 0 is the active account
    AccountsChanged(Vec<String>),
    /// Newly selected chain id (hex)
    ChainChanged(String),
}

impl ProviderEvent {
    pub fn kind(&self) -> ProviderEventKind {
        match self {
            ProviderEvent::AccountsChanged(_) => ProviderEventKind::AccountsChanged,
            ProviderEvent::ChainChanged(_) => ProviderEventKind::ChainChanged,
        }
    }
}

/// Token returned by [`WalletProvider::subscribe`], used to deregister the handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub(crate) u64);

/// Callback invoked by the provider for a subscribed event.
pub type EventHandler = Arc<dyn Fn(ProviderEvent) + Send + Sync>;

/// Capability surface of an injected wallet provider.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Whether a provider is present right now.
    fn is_available(&self) -> bool;

    /// Forward a JSON-RPC style call.
    async fn request(&self, method: &str, params: Vec<Value>) -> Result<Value>;

    /// Register `handler` for `kind` events.
    fn subscribe(&self, kind: ProviderEventKind, handler: EventHandler) -> ListenerId;

    /// Deregister a handler. Returns `false` if it was not registered.
    fn unsubscribe(&self, kind: ProviderEventKind, id: ListenerId) -> bool;
}
