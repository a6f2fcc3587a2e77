//! Small helpers for reading configuration values.
//!
//! All lookups go through a caller-supplied closure so configuration can
//! be loaded from the process environment in `main` and from plain maps
//! in tests.

use std::str::FromStr;

use crate::error::ConfigError;

/// Fetch a required, non-empty value.
pub fn required<F>(lookup: &F, var: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(var)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(var))
}

/// Parse an optional value, returning `None` when it is unset or blank.
pub fn optional_parse<F, T>(lookup: &F, var: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(var).map(|v| v.trim().to_string()) {
        None => Ok(None),
        Some(v) if v.is_empty() => Ok(None),
        Some(v) => v.parse().map(Some).map_err(|e: T::Err| ConfigError::Invalid {
            var,
            reason: e.to_string(),
            value: v,
        }),
    }
}

/// Parse an optional value, falling back to `default` when unset.
pub fn parse_or<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    Ok(optional_parse(lookup, var)?.unwrap_or(default))
}

/// Split a comma-separated list, dropping blank entries.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
