//! # Environment Variables
//!
//! Utilities for reading and parsing environment variables.

use std::env;
use std::str::FromStr;

/// Get an environment variable by name.
pub fn get_env(name: &'static str) -> Result<String, Error> {
    env::var(name).map_err(|_| Error::MissingEnv(name))
}

/// Get and parse an environment variable.
pub fn get_env_parse<T: FromStr>(name: &'static str) -> Result<T, Error> {
    let val = get_env(name)?;
    val.trim().parse::<T>().map_err(|_| Error::WrongFormat(name))
}

/// Get an environment variable, falling back to `default` when unset.
pub fn get_env_or(name: &'static str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable, falling back to `default` when unset.
///
/// A variable that is set but malformed is still an error.
pub fn get_env_parse_or<T: FromStr>(name: &'static str, default: T) -> Result<T, Error> {
    match get_env_parse(name) {
        Err(Error::MissingEnv(_)) => Ok(default),
        other => other,
    }
}

/// Read a `1`/`0` style flag (`true`/`false`/`yes`/`no` also accepted).
pub fn get_env_flag(name: &'static str, default: bool) -> bool {
    match env::var(name) {
        Ok(v) => matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"),
        Err(_) => default,
    }
}

// region:    --- Error
#[derive(Debug, PartialEq, Eq)]
pub enum Error {
    MissingEnv(&'static str),
    WrongFormat(&'static str),
}

impl std::fmt::Display for Error {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(fmt, "{self:?}")
    }
}

impl std::error::Error for Error {}
// endregion: --- Error

#[cfg(test)]
mod tests {
    use super::*;

    // Each test owns its variable names; the process environment is shared across test threads.

    #[test]
    fn test_get_env_parse_or_default_when_missing() {
        env::remove_var("LIB_UTILS_TEST_MISSING");
        assert_eq!(get_env_parse_or("LIB_UTILS_TEST_MISSING", 42u64), Ok(42));
    }

    #[test]
    fn test_get_env_parse_or_rejects_malformed() {
        env::set_var("LIB_UTILS_TEST_MALFORMED", "forty-two");
        assert_eq!(
            get_env_parse_or("LIB_UTILS_TEST_MALFORMED", 42u64),
            Err(Error::WrongFormat("LIB_UTILS_TEST_MALFORMED"))
        );
    }

    #[test]
    fn test_get_env_flag() {
        env::set_var("LIB_UTILS_TEST_FLAG_ON", "1");
        env::set_var("LIB_UTILS_TEST_FLAG_OFF", "0");
        assert!(get_env_flag("LIB_UTILS_TEST_FLAG_ON", false));
        assert!(!get_env_flag("LIB_UTILS_TEST_FLAG_OFF", true));
        assert!(get_env_flag("LIB_UTILS_TEST_FLAG_UNSET", true));
    }
}
