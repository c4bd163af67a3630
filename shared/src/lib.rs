//! # Shared Session Types and Display Helpers
//!
//! This library defines the contract between the wallet session core and any
//! presentation adapter that renders it.
//!
//! ## Structure
//!
//! - **[`dto`]**: Data Transfer Objects
//!   - **[`dto::session`]**: `SessionStatus` and the immutable `SessionSnapshot`
//! - **[`networks`]**: Static chain-id to network-name table
//! - **[`utils`]**: Pure formatting functions
//!   - **[`utils::truncate_address`]**: Shorten an address for display
//!   - **[`utils::format_wei`]**: Render a wei amount with 4 fractional digits
//!
//! ## Wire Format
//!
//! Snapshots serialize to JSON with `serde`:
//! - Field names are **snake_case**
//! - `None` fields are omitted
//! - `balance_wei` is a base-10 string so it survives JSON number limits
//!
//! ## Usage
//!
//! ```rust
//! use shared::networks::network_name;
//! use shared::utils::truncate_address;
//!
//! assert_eq!(network_name("0x1"), "Ethereum Mainnet");
//! assert_eq!(
//!     truncate_address("0x1234567890abcdef1234567890abcdef12345678"),
//!     "0x1234...5678"
//! );
//! ```

pub mod dto;
pub mod networks;
pub mod utils;

pub use dto::*;
pub use utils::*;
