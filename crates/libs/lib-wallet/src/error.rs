//! # Wallet Session Errors
//!
//! Error taxonomy for every failure path of the session controller and the
//! provider gateway.
//!
//! ## Error Categories
//!
//! 1. **Connection lifecycle** - move the session to `Error`
//!    - [`ProviderUnavailable`](WalletError::ProviderUnavailable): no provider injected
//!    - [`UserRejected`](WalletError::UserRejected): prompt declined (code `4001`)
//!    - [`Provider`](WalletError::Provider): any other provider-side rejection
//!    - [`InvalidResponse`](WalletError::InvalidResponse): reply of the wrong shape
//!
//! 2. **Caller errors** - state untouched
//!    - [`AlreadyConnecting`](WalletError::AlreadyConnecting): connect already in flight
//!    - [`Superseded`](WalletError::Superseded): a disconnect overtook this connect
//!    - [`SessionClosed`](WalletError::SessionClosed): the session was unmounted
//!
//! 3. **Secondary** - never change `status`
//!    - [`BalanceFetchFailed`](WalletError::BalanceFetchFailed)
//!
//! ## Usage Example
//!
//! ```rust
//! use lib_wallet::error::{ProviderError, WalletError};
//!
//! let err: WalletError = ProviderError::new(4001, "User rejected the request.").into();
//! assert!(err.is_user_rejection());
//! assert!(err.is_retryable());
//! ```

use std::fmt;
use thiserror::Error;

/// Where users can get a wallet when none is detected
pub const INSTALL_URL: &str = "https://metamask.io/download/";

/// Convenience type alias for `Result<T, WalletError>`.
pub type Result<T> = std::result::Result<T, WalletError>;

/// Error object returned by a provider for a rejected request.
///
/// Codes follow EIP-1193 / JSON-RPC 2.0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderError {
    pub code: i64,
    pub message: String,
}

impl ProviderError {
    /// The user rejected the request
    pub const USER_REJECTED: i64 = 4001;
    /// The requested account or method is not authorized by the user
    pub const UNAUTHORIZED: i64 = 4100;
    /// The provider does not support the method
    pub const UNSUPPORTED_METHOD: i64 = 4200;
    /// The provider is disconnected from all chains
    pub const DISCONNECTED: i64 = 4900;
    /// Invalid JSON received by the server
    pub const PARSE_ERROR: i64 = -32700;
    /// Internal JSON-RPC error
    pub const INTERNAL: i64 = -32603;

    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn is_user_rejection(&self) -> bool {
        self.code == Self::USER_REJECTED
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code {})", self.message, self.code)
    }
}

/// Errors surfaced by the wallet session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletError {
    /// No wallet provider is injected into the host.
    #[error("Wallet provider unavailable: install a wallet extension ({}) to continue", INSTALL_URL)]
    ProviderUnavailable,

    /// The user declined the connection prompt.
    #[error("User rejected connection")]
    UserRejected,

    /// Any other provider-side rejection.
    #[error("Provider error: {0}")]
    Provider(ProviderError),

    /// The provider answered with a payload of the wrong shape.
    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),

    /// A connect attempt is already in flight.
    #[error("A connection attempt is already in progress")]
    AlreadyConnecting,

    /// The session was disconnected while this connect attempt was in flight.
    #[error("Connection attempt superseded by a disconnect")]
    Superseded,

    /// The session was unmounted; its results are discarded.
    #[error("Wallet session has been unmounted")]
    SessionClosed,

    /// Balance lookup failed; the connection itself is unaffected.
    #[error("Failed to fetch balance: {0}")]
    BalanceFetchFailed(String),
}

impl WalletError {
    /// Shorthand for [`WalletError::Provider`].
    pub fn provider(code: i64, message: impl Into<String>) -> Self {
        WalletError::Provider(ProviderError::new(code, message))
    }

    pub fn is_user_rejection(&self) -> bool {
        match self {
            WalletError::UserRejected => true,
            WalletError::Provider(err) => err.is_user_rejection(),
            _ => false,
        }
    }

    /// Whether calling the same operation again can succeed without outside change.
    ///
    /// `ProviderUnavailable` needs a provider to appear first. `AlreadyConnecting`
    /// and `SessionClosed` should not be retried at all.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            WalletError::ProviderUnavailable | WalletError::AlreadyConnecting | WalletError::SessionClosed
        )
    }
}

impl From<ProviderError> for WalletError {
    fn from(err: ProviderError) -> Self {
        if err.is_user_rejection() {
            WalletError::UserRejected
        } else {
            WalletError::Provider(err)
        }
    }
}
