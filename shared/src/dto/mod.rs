//! # Data Transfer Objects (DTOs)
//!
//! Structures handed from the session controller to presentation adapters.
//!
//! ## Module Organization
//!
//! - [`session`] - Session status and snapshot
//!
//! ## Serialization Format
//!
//! - **Field naming**: snake_case (default serde behavior)
//! - **Optional fields**: Omitted when `None` using `#[serde(skip_serializing_if = "Option::is_none")]`
//! - **Enums**: Serialize to lowercase strings using `#[serde(rename_all = "lowercase")]`
//!
//! ## Example JSON
//!
//! ```text
//! {
//!   "status": "connected",
//!   "account": "0xabc0000000000000000000000000000000000001",
//!   "chain_id": "0x1",
//!   "balance_wei": "1234500000000000000"
//! }
//! ```

pub mod session;

pub use session::*;
