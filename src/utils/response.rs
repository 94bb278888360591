//! Helpers for turning transport replies into `Response` records.

use std::collections::HashMap;

use http::{header, HeaderMap};
use serde_json::Value as JsonValue;

/// Standard content types
pub mod content_type {
    pub const APPLICATION_JSON: &str = "application/json";
}

/// Collect response headers into a plain map.
///
/// Headers whose value is not valid UTF-8 are skipped. Repeated headers keep
/// the last value.
pub fn collect_headers(headers: &HeaderMap) -> HashMap<String, String> {
    headers
        .iter()
        .filter_map(|(name, value)| match value.to_str() {
            Ok(v) => Some((name.as_str().to_string(), v.to_string())),
            Err(_) => {
                log::debug!("Skipping non UTF-8 response header '{name}'");
                None
            }
        })
        .collect()
}

/// Decode a response body into a structured value.
///
/// Empty bodies become `null`. Bodies that do not parse as JSON are kept as
/// a JSON string (lossy UTF-8), whatever the declared content type.
pub fn parse_body(headers: &HeaderMap, body: &[u8]) -> JsonValue {
    if body.iter().all(u8::is_ascii_whitespace) {
        return JsonValue::Null;
    }

    match serde_json::from_slice::<JsonValue>(body) {
        Ok(value) => value,
        Err(e) => {
            if is_json(headers) {
                log::warn!("Response declared JSON but failed to parse: {e}");
            }
            JsonValue::String(String::from_utf8_lossy(body).into_owned())
        }
    }
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with(content_type::APPLICATION_JSON))
}
