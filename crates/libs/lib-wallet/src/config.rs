//! # Wallet Session Configuration
//!
//! Configuration loaded from environment variables and validated on startup so
//! a misconfigured session fails fast.
//!
//! ## Global Config Access
//!
//! Use [`wallet_config()`] to access the global configuration instance:
//!
//! ```rust,no_run
//! use lib_wallet::config::wallet_config;
//!
//! let config = wallet_config();
//! let timeout = config.request_timeout;
//! ```
//!
//! The config must be initialized once at application startup using [`init_config()`].
//!
//! ## Variables
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | `WALLET_PROVIDER` | `http` | `http` or `memory` gateway |
//! | `WALLET_PROVIDER_URL` | unset | JSON-RPC endpoint; unset means no provider |
//! | `WALLET_REQUEST_TIMEOUT_MS` | `10000` | Per-request timeout |
//! | `WALLET_POLL_INTERVAL_MS` | `2000` | Account/chain polling period |
//! | `WALLET_BALANCE_REFRESH_SECS` | `0` | Periodic balance refresh, `0` disables |

use lib_utils::envs::{get_env, get_env_or, get_env_parse_or};
use std::str::FromStr;
use std::sync::OnceLock;
use std::time::Duration;

/// Which provider gateway backs the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    /// JSON-RPC over HTTP with polled change events
    Http,
    /// In-process scriptable provider
    Memory,
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "http" => Ok(ProviderKind::Http),
            "memory" => Ok(ProviderKind::Memory),
            other => Err(format!("WALLET_PROVIDER must be 'http' or 'memory', got '{}'", other)),
        }
    }
}

/// Session configuration loaded from environment variables.
#[derive(Clone, Debug)]
pub struct WalletConfig {
    pub provider: ProviderKind,

    /// JSON-RPC endpoint for [`ProviderKind::Http`]
    pub provider_url: Option<String>,

    /// Upper bound for a single provider request
    ///
    /// Valid range: 100ms - 120s
    pub request_timeout: Duration,

    /// How often the HTTP gateway polls `eth_accounts`/`eth_chainId` to emit change events
    ///
    /// Valid range: 100ms - 60s
    pub poll_interval: Duration,

    /// Periodic balance refresh for the connected account, `None` when disabled
    ///
    /// Valid range: 1s - 1h
    pub balance_refresh_interval: Option<Duration>,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Http,
            provider_url: None,
            request_timeout: Duration::from_millis(10_000),
            poll_interval: Duration::from_millis(2_000),
            balance_refresh_interval: None,
        }
    }
}

impl WalletConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, String> {
        let provider = get_env_or("WALLET_PROVIDER", "http").parse()?;

        let provider_url = get_env("WALLET_PROVIDER_URL")
            .ok()
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty());

        let request_timeout_ms: u64 = get_env_parse_or("WALLET_REQUEST_TIMEOUT_MS", 10_000)
            .map_err(|_| "WALLET_REQUEST_TIMEOUT_MS must be a valid number".to_string())?;

        let poll_interval_ms: u64 = get_env_parse_or("WALLET_POLL_INTERVAL_MS", 2_000)
            .map_err(|_| "WALLET_POLL_INTERVAL_MS must be a valid number".to_string())?;

        let balance_refresh_secs: u64 = get_env_parse_or("WALLET_BALANCE_REFRESH_SECS", 0)
            .map_err(|_| "WALLET_BALANCE_REFRESH_SECS must be a valid number".to_string())?;

        Ok(Self {
            provider,
            provider_url,
            request_timeout: Duration::from_millis(request_timeout_ms),
            poll_interval: Duration::from_millis(poll_interval_ms),
            balance_refresh_interval: (balance_refresh_secs > 0)
                .then(|| Duration::from_secs(balance_refresh_secs)),
        })
    }

    /// Validate configuration values against operating limits.
    pub fn validate(&self) -> Result<(), String> {
        let timeout_ms = self.request_timeout.as_millis();
        if !(100..=120_000).contains(&timeout_ms) {
            return Err("WALLET_REQUEST_TIMEOUT_MS must be between 100 and 120000".to_string());
        }

        let poll_ms = self.poll_interval.as_millis();
        if !(100..=60_000).contains(&poll_ms) {
            return Err("WALLET_POLL_INTERVAL_MS must be between 100 and 60000".to_string());
        }

        if let Some(interval) = self.balance_refresh_interval {
            if interval.as_secs() > 3_600 {
                return Err("WALLET_BALANCE_REFRESH_SECS must be at most 3600 (1 hour)".to_string());
            }
        }

        if let Some(url) = &self.provider_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(format!("WALLET_PROVIDER_URL must be an http(s) URL, got '{}'", url));
            }
        }

        Ok(())
    }
}

/// Global configuration instance (initialized once at startup).
static CONFIG: OnceLock<WalletConfig> = OnceLock::new();

/// Initialize the global configuration.
///
/// # Errors
///
/// Returns an error if:
/// - Environment variables are malformed
/// - Configuration validation fails
/// - Config has already been initialized
pub fn init_config() -> Result<&'static WalletConfig, String> {
    let config = WalletConfig::from_env()?;
    config.validate()?;

    CONFIG
        .set(config)
        .map_err(|_| "Config has already been initialized".to_string())?;

    Ok(wallet_config())
}

/// Get a reference to the global configuration.
///
/// Falls back to [`WalletConfig::default`] when [`init_config()`] was never called.
pub fn wallet_config() -> &'static WalletConfig {
    CONFIG.get_or_init(WalletConfig::default)
}
