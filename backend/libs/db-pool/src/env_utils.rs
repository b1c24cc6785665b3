//! Environment variable parsing helpers
//!
//! Missing or unparsable values fall back to the supplied default instead of
//! failing, so a typo in an optional knob never keeps a service from booting.

use std::str::FromStr;

/// Parse an environment variable, falling back to `default` when it is unset
/// or cannot be parsed.
///
/// # Example
/// ```ignore
/// let port: u16 = parse_env_with_default("APP_PORT", 8080);
/// ```
pub fn parse_env_with_default<T: FromStr>(key: &str, default: T) -> T {
    parse_env_optional(key).unwrap_or(default)
}

/// Parse an environment variable, returning `None` when unset or invalid.
pub fn parse_env_optional<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

/// Parse a boolean flag. Accepts `true/false`, `1/0`, `yes/no` (case-insensitive).
pub fn parse_env_flag(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(value) => match value.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => true,
            "false" | "0" | "no" => false,
            _ => default,
        },
        Err(_) => default,
    }
}
