//! Environment variable helpers

use std::str::FromStr;

/// Read an environment variable, falling back to `default` when unset or empty
pub fn env_or(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Parse an environment variable into `T`
///
/// Returns `Ok(None)` when the variable is unset and `Err` with a readable
/// message when it is set but cannot be parsed.
pub fn env_parse<T>(key: &str) -> Result<Option<T>, String>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| format!("{key}={raw:?} is invalid: {e}")),
        _ => Ok(None),
    }
}

/// Interpret an environment variable as a boolean switch
///
/// `1`, `true`, `yes` and `on` (case-insensitive) are truthy.
pub fn env_flag(key: &str) -> bool {
    std::env::var(key).is_ok_and(|v| {
        matches!(
            v.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
}
