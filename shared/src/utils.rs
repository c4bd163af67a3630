//! # Shared Utility Functions
//!
//! Pure display helpers used by the session core and presentation adapters.
//!
//! ## Address Formatting
//!
//! - [`format_address`] - Format address with ellipsis (first N and last M characters)
//! - [`truncate_address`] - `format_address` with the EVM defaults (`0x` + 4, last 4)
//!
//! ## Amounts
//!
//! - [`parse_hex_quantity`] - Parse a JSON-RPC hex quantity (`"0x1bc16d674ec80000"`)
//! - [`format_wei`] - Render wei as native units with 4 fractional digits
//!
//! The formatted strings are for display only. Keep arithmetic on [`BigUint`].
//!
//! ## Usage
//!
//! ```rust
//! use num_bigint::BigUint;
//! use shared::utils::{format_wei, truncate_address};
//!
//! let address = "0x1234567890abcdef1234567890abcdef12345678";
//! assert_eq!(truncate_address(address), "0x1234...5678");
//! assert_eq!(format_wei(&BigUint::from(1_234_500_000_000_000_000u64)), "1.2345");
//! ```

use num_bigint::BigUint;
use num_traits::ToPrimitive;

/// Decimals of the native currency (1 ETH = 10^18 wei)
pub const WEI_DECIMALS: u32 = 18;

/// Fractional digits shown by [`format_wei`]
pub const DISPLAY_DECIMALS: u32 = 4;

/// Ticker appended by [`format_balance`]
pub const NATIVE_SYMBOL: &str = "ETH";

/// Format a wallet address by showing the first `prefix_len` and last `suffix_len` characters.
///
/// If the address is shorter than `prefix_len + suffix_len`, it is returned as-is.
///
/// # Examples
///
/// ```rust
/// use shared::utils::format_address;
///
/// let addr = "0x1234567890abcdef1234567890abcdef12345678";
/// assert_eq!(format_address(addr, 6, 4), "0x1234...5678");
/// assert_eq!(format_address(addr, 4, 4), "0x12...5678");
/// assert_eq!(format_address("0xabc", 6, 4), "0xabc");
/// ```
pub fn format_address(address: &str, prefix_len: usize, suffix_len: usize) -> String {
    let address_len = address.len();

    // Also guards individual lengths exceeding the address so slicing cannot panic
    if address_len <= prefix_len + suffix_len
        || prefix_len >= address_len
        || suffix_len >= address_len
        || !address.is_ascii()
    {
        return address.to_string();
    }

    let prefix = &address[..prefix_len];
    let suffix = &address[address_len - suffix_len..];

    format!("{}...{}", prefix, suffix)
}

/// Format an EVM address with a 6-character prefix (`0x` plus 4 hex digits) and 4-character suffix.
///
/// # Examples
///
/// ```rust
/// use shared::utils::truncate_address;
///
/// assert_eq!(
///     truncate_address("0x1234567890abcdef1234567890abcdef12345678"),
///     "0x1234...5678"
/// );
/// ```
pub fn truncate_address(address: &str) -> String {
    format_address(address, 6, 4)
}

/// Parse a JSON-RPC hex quantity into an arbitrary-precision integer.
///
/// Accepts an optional `0x`/`0X` prefix. Empty digit strings are rejected.
pub fn parse_hex_quantity(value: &str) -> Result<BigUint, String> {
    let digits = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value);

    if digits.is_empty() {
        return Err(format!("Empty hex quantity: {:?}", value));
    }

    BigUint::parse_bytes(digits.as_bytes(), 16)
        .ok_or_else(|| format!("Invalid hex quantity: {:?}", value))
}

/// Format a wei amount as native units with exactly 4 fractional digits.
///
/// Rounds half away from zero at the fourth digit, so `1.23455` shows as `1.2346`.
pub fn format_wei(wei: &BigUint) -> String {
    let step = BigUint::from(10u32).pow(WEI_DECIMALS - DISPLAY_DECIMALS);
    let half = &step / 2u32;
    let units = (wei + &half) / &step;

    let scale = BigUint::from(10u32).pow(DISPLAY_DECIMALS);
    let whole = &units / &scale;
    let fraction = (&units % &scale).to_u32().unwrap_or(0);

    format!("{}.{:0width$}", whole, fraction, width = DISPLAY_DECIMALS as usize)
}

/// Format a wei amount with the native ticker (e.g. `"1.2345 ETH"`).
pub fn format_balance(wei: &BigUint) -> String {
    format!("{} {}", format_wei(wei), NATIVE_SYMBOL)
}
