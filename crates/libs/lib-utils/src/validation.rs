//! # Validation Utilities
//!
//! Input validation helpers for values coming back from wallet providers.

/// Validate a 20-byte hex address (`0x` followed by 40 hex digits, any case).
pub fn validate_hex_address(address: &str) -> Result<(), String> {
    let digits = address
        .strip_prefix("0x")
        .ok_or_else(|| format!("Address must start with 0x: {}", address))?;

    if digits.len() != 40 {
        return Err(format!("Address must have 40 hex digits, got {}", digits.len()));
    }

    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(format!("Address contains non-hex characters: {}", address));
    }

    Ok(())
}

/// Validate and lowercase an address.
///
/// Providers may return checksummed (mixed-case) addresses; sessions compare
/// and store the lowercase form.
pub fn normalize_address(address: &str) -> Result<String, String> {
    let trimmed = address.trim();
    validate_hex_address(trimmed)?;
    Ok(trimmed.to_ascii_lowercase())
}

/// Validate a hex chain id such as `"0x1"` or `"0xaa36a7"`.
pub fn validate_chain_id(chain_id: &str) -> Result<(), String> {
    let digits = chain_id
        .strip_prefix("0x")
        .ok_or_else(|| format!("Chain id must start with 0x: {}", chain_id))?;

    if digits.is_empty() || digits.len() > 16 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(format!("Invalid chain id: {}", chain_id));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_address_lowercases_checksummed() {
        let checksummed = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";
        assert_eq!(
            normalize_address(checksummed).unwrap(),
            "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed"
        );
    }

    #[test]
    fn test_validate_hex_address_rejects_bad_input() {
        assert!(validate_hex_address("5aaeb6053f3e94c9b9a09f33669435e7ef1beaed").is_err());
        assert!(validate_hex_address("0x1234").is_err());
        assert!(validate_hex_address("0xzzzzb6053f3e94c9b9a09f33669435e7ef1beaed").is_err());
    }

    #[test]
    fn test_validate_chain_id() {
        assert!(validate_chain_id("0x1").is_ok());
        assert!(validate_chain_id("0xAA36A7").is_ok());
        assert!(validate_chain_id("1").is_err());
        assert!(validate_chain_id("0x").is_err());
        assert!(validate_chain_id("0xnope").is_err());
    }
}
