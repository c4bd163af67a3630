//! Typed wrappers over the raw provider requests the session issues.
//!
//! Every reply is validated here so the session only ever stores lowercase
//! 20-byte addresses and well-formed hex chain ids.

use lib_utils::validation::{normalize_address, validate_chain_id};
use num_bigint::BigUint;
use serde_json::{json, Value};
use shared::utils::parse_hex_quantity;

use crate::error::{Result, WalletError};
use crate::provider::{methods, WalletProvider};

/// Prompt the user for account access (`eth_requestAccounts`).
pub async fn request_accounts(provider: &dyn WalletProvider) -> Result<Vec<String>> {
    let value = provider.request(methods::REQUEST_ACCOUNTS, Vec::new()).await?;
    parse_accounts(value)
}

/// Accounts already authorized for this origin, without prompting (`eth_accounts`).
pub async fn accounts(provider: &dyn WalletProvider) -> Result<Vec<String>> {
    let value = provider.request(methods::ACCOUNTS, Vec::new()).await?;
    parse_accounts(value)
}

/// Currently selected chain (`eth_chainId`).
pub async fn chain_id(provider: &dyn WalletProvider) -> Result<String> {
    let value = provider.request(methods::CHAIN_ID, Vec::new()).await?;
    let raw = value
        .as_str()
        .ok_or_else(|| WalletError::InvalidResponse(format!("eth_chainId returned {}", value)))?;
    normalize_chain_id(raw)
}

/// Balance of `address` at the latest block (`eth_getBalance`).
pub async fn get_balance(provider: &dyn WalletProvider, address: &str) -> Result<BigUint> {
    let value = provider
        .request(methods::GET_BALANCE, vec![json!(address), json!("latest")])
        .await?;
    let raw = value
        .as_str()
        .ok_or_else(|| WalletError::InvalidResponse(format!("eth_getBalance returned {}", value)))?;
    parse_hex_quantity(raw).map_err(WalletError::InvalidResponse)
}

/// Decode an account list reply.
pub fn parse_accounts(value: Value) -> Result<Vec<String>> {
    let raw: Vec<String> = serde_json::from_value(value)
        .map_err(|e| WalletError::InvalidResponse(format!("expected a list of accounts: {}", e)))?;
    normalize_accounts(raw)
}

/// Validate and lowercase every account, preserving order.
pub fn normalize_accounts(raw: Vec<String>) -> Result<Vec<String>> {
    raw.iter()
        .map(|account| normalize_address(account).map_err(WalletError::InvalidResponse))
        .collect()
}

/// Validate a hex chain id and lowercase it.
pub fn normalize_chain_id(raw: &str) -> Result<String> {
    let lowered = raw.trim().to_ascii_lowercase();
    validate_chain_id(&lowered).map_err(WalletError::InvalidResponse)?;
    Ok(lowered)
}
