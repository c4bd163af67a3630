//! Known EVM networks, keyed by chain id.

use std::borrow::Cow;

/// Chain ids and their display names.
pub const NETWORKS: &[(u64, &str)] = &[
    (0x1, "Ethereum Mainnet"),
    (0x5, "Goerli Testnet"),
    (0xaa36a7, "Sepolia Testnet"),
    (0x89, "Polygon Mainnet"),
    (0x13881, "Mumbai Testnet"),
    (0xa4b1, "Arbitrum One"),
    (0xa, "Optimism"),
];

/// Parse a hex chain id (`"0x89"`) into its numeric value.
pub fn parse_chain_id(chain_id: &str) -> Option<u64> {
    let digits = chain_id
        .strip_prefix("0x")
        .or_else(|| chain_id.strip_prefix("0X"))?;
    u64::from_str_radix(digits, 16).ok()
}

/// Human-readable name for a chain id.
///
/// Unknown or malformed ids fall back to `"Chain ID: {chain_id}"` with the raw value.
///
/// ```rust
/// use shared::networks::network_name;
///
/// assert_eq!(network_name("0x1"), "Ethereum Mainnet");
/// assert_eq!(network_name("0x999999"), "Chain ID: 0x999999");
/// ```
pub fn network_name(chain_id: &str) -> Cow<'static, str> {
    parse_chain_id(chain_id)
        .and_then(|id| NETWORKS.iter().find(|(known, _)| *known == id))
        .map(|(_, name)| Cow::Borrowed(*name))
        .unwrap_or_else(|| Cow::Owned(format!("Chain ID: {}", chain_id)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_networks() {
        assert_eq!(network_name("0x1"), "Ethereum Mainnet");
        assert_eq!(network_name("0xaa36a7"), "Sepolia Testnet");
        assert_eq!(network_name("0x89"), "Polygon Mainnet");
        assert_eq!(network_name("0xa4b1"), "Arbitrum One");
    }

    #[test]
    fn test_lookup_ignores_leading_zeros_and_case() {
        assert_eq!(network_name("0x01"), "Ethereum Mainnet");
        assert_eq!(network_name("0xAA36A7"), "Sepolia Testnet");
    }

    #[test]
    fn test_unknown_network_fallback() {
        assert_eq!(network_name("0x999999"), "Chain ID: 0x999999");
        assert_eq!(network_name("mainnet"), "Chain ID: mainnet");
    }

    #[test]
    fn test_parse_chain_id() {
        assert_eq!(parse_chain_id("0x89"), Some(137));
        assert_eq!(parse_chain_id("137"), None);
        assert_eq!(parse_chain_id("0x"), None);
    }
}
