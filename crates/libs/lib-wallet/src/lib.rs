//! # Wallet Session Library
//!
//! Negotiates a connection to an injected wallet provider, tracks its live
//! account and network, and keeps a balance view in sync with provider events.
//!
//! ## Modules
//!
//! - **[`provider`]**: Provider Gateway (`WalletProvider` trait, HTTP and in-memory gateways)
//! - **[`session`]**: Pure session state machine
//! - **[`controller`]**: Async controller owning a session for one presentation surface
//! - **[`rpc`]**: Typed wrappers over the JSON-RPC calls the session issues
//! - **[`error`]**: Error taxonomy
//! - **[`config`]**: Environment configuration
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use lib_wallet::provider::memory::MemoryProvider;
//! use lib_wallet::SessionController;
//!
//! # async fn run() -> lib_wallet::Result<()> {
//! let provider = Arc::new(MemoryProvider::new().with_accounts(["0xabc0000000000000000000000000000000000001"]));
//! let controller = SessionController::mount(provider).await;
//!
//! let mut updates = controller.subscribe();
//! controller.connect().await?;
//! updates.changed().await.ok();
//! println!("{:?}", updates.borrow().status);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod controller;
pub mod error;
pub mod provider;
pub mod rpc;
pub mod session;

pub use config::{init_config, wallet_config, ProviderKind, WalletConfig};
pub use controller::{SessionController, SessionHandle};
pub use error::{ProviderError, Result, WalletError};
pub use provider::{ProviderEvent, ProviderEventKind, WalletProvider};
pub use session::Session;
