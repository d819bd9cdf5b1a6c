//! API warnings.
//!
//! The cloud controller reports non-fatal advisories in one or more
//! `X-Cf-Warnings` response headers. Each header value is a comma separated
//! list of URL-encoded messages.

use percent_encoding::percent_decode_str;
use reqwest::header::HeaderMap;

/// Header carrying cloud controller warnings.
pub const WARNINGS_HEADER: &str = "X-Cf-Warnings";

/// Ordered list of warnings collected across one or more API calls.
pub type Warnings = Vec<String>;

/// Extract every warning from a response's headers, in header order.
pub fn from_headers(headers: &HeaderMap) -> Warnings {
    headers
        .get_all(WARNINGS_HEADER)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(decode_header_value)
        .collect()
}

/// Split and decode a single `X-Cf-Warnings` header value.
pub fn decode_header_value(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|part| {
            let spaced = part.trim().replace('+', " ");
            percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
        })
        .filter(|warning| !warning.is_empty())
        .collect()
}
