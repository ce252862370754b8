use std::num::NonZeroU32;
use std::time::Duration;

pub fn non_empty(raw: String) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Parse a strictly positive count such as a page size.
pub fn parse_non_zero(raw: &str) -> Result<NonZeroU32, String> {
    raw.trim()
        .parse::<NonZeroU32>()
        .map_err(|err| format!("expected a positive integer: {err}"))
}

/// Parse a human duration (`"750ms"`, `"2s"`). `"off"`, `"none"` and `"0"`
/// disable the timeout.
pub fn parse_timeout(raw: &str) -> Result<Option<Duration>, String> {
    let trimmed = raw.trim();
    match trimmed.to_ascii_lowercase().as_str() {
        "off" | "none" | "0" => Ok(None),
        _ => humantime::parse_duration(trimmed)
            .map(Some)
            .map_err(|err| err.to_string()),
    }
}
