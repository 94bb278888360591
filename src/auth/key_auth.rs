use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use validator::Validate;

use crate::{
    core::{IntegratorError, Request},
    utils::request,
};

use super::API_KEY;

/// Header carrying the API key. Keys are always sent as this header, never
/// as a query parameter.
pub const API_KEY_HEADER: &str = "apikey";

#[derive(Clone, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
struct Credentials {
    #[serde(rename = "apiKey")]
    #[validate(length(min = 1))]
    api_key: String,
}

/// API key authentication.
#[derive(Clone)]
pub struct KeyAuth {
    credentials: Credentials,
}

impl TryFrom<JsonValue> for KeyAuth {
    type Error = IntegratorError;

    fn try_from(value: JsonValue) -> Result<Self, Self::Error> {
        let credentials = super::parse_credentials(API_KEY, value)?;
        Ok(Self { credentials })
    }
}

impl fmt::Debug for KeyAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyAuth")
            .field("header", &API_KEY_HEADER)
            .field("key", &"<redacted>")
            .finish()
    }
}

impl KeyAuth {
    pub(super) fn apply(&self, req: &mut Request) {
        request::set_header(
            &mut req.headers,
            API_KEY_HEADER,
            self.credentials.api_key.clone(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::HttpMethod;
    use serde_json::json;

    #[test]
    fn test_key_sent_as_header_only() {
        let auth = KeyAuth::try_from(json!({ "apiKey": "k-123" })).unwrap();
        let mut req = Request::new(HttpMethod::GET)
            .with_header("ApiKey", "caller-value")
            .with_query("q", "x");

        auth.apply(&mut req);

        assert_eq!(req.headers.len(), 1);
        assert_eq!(req.headers.get(API_KEY_HEADER).map(String::as_str), Some("k-123"));
        assert_eq!(req.query.len(), 1);
        assert!(!req.query.contains_key(API_KEY_HEADER));
    }

    #[test]
    fn test_config_validation() {
        assert!(KeyAuth::try_from(json!({ "apiKey": "" })).is_err());
        assert!(KeyAuth::try_from(json!({ "api_key": "k" })).is_err());
        assert!(KeyAuth::try_from(json!({ "apiKey": "k", "token": "t" })).is_err());
    }
}
