//! # Utilities Library
//!
//! Shared utility functions for environment variables, time, and address validation.

pub mod envs;
pub mod time;
pub mod validation;

// Re-export commonly used functions
pub use envs::{get_env, get_env_flag, get_env_or, get_env_parse, get_env_parse_or};
pub use time::{format_time, now_utc};
pub use validation::{normalize_address, validate_chain_id, validate_hex_address};
