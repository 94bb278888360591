use std::fmt;

use base64::{engine::general_purpose, Engine as _};
use http::header;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use validator::Validate;

use crate::{
    core::{IntegratorError, Request},
    utils::request,
};

use super::BASIC;

#[derive(Clone, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
struct Credentials {
    #[validate(length(min = 1))]
    username: String,
    password: String,
}

/// HTTP Basic authentication: `Authorization: Basic base64(username:password)`.
#[derive(Clone)]
pub struct BasicAuth {
    credentials: Credentials,
}

impl TryFrom<JsonValue> for BasicAuth {
    type Error = IntegratorError;

    fn try_from(value: JsonValue) -> Result<Self, Self::Error> {
        let credentials = super::parse_credentials(BASIC, value)?;
        Ok(Self { credentials })
    }
}

impl fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuth")
            .field("username", &self.credentials.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl BasicAuth {
    fn header_value(&self) -> String {
        let raw = format!(
            "{}:{}",
            self.credentials.username, self.credentials.password
        );
        format!("Basic {}", general_purpose::STANDARD.encode(raw))
    }

    pub(super) fn apply(&self, req: &mut Request) {
        request::set_header(
            &mut req.headers,
            header::AUTHORIZATION.as_str(),
            self.header_value(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::HttpMethod;
    use serde_json::json;

    #[test]
    fn test_encodes_credentials() {
        let auth = BasicAuth::try_from(json!({ "username": "svc", "password": "secret" })).unwrap();
        let mut req = Request::new(HttpMethod::GET).with_header("authorization", "stale");

        auth.apply(&mut req);

        // base64("svc:secret")
        assert_eq!(
            request::get_req_header_value(&req.headers, "Authorization"),
            Some("Basic c3ZjOnNlY3JldA==")
        );
        assert_eq!(req.headers.len(), 1);
    }

    #[test]
    fn test_config_validation() {
        assert!(BasicAuth::try_from(json!({ "username": "", "password": "p" })).is_err());
        assert!(BasicAuth::try_from(json!({ "username": "u" })).is_err());
        assert!(BasicAuth::try_from(json!({ "token": "t" })).is_err());
    }

    #[test]
    fn test_debug_redacts_password() {
        let auth = BasicAuth::try_from(json!({ "username": "svc", "password": "secret" })).unwrap();
        let debug = format!("{auth:?}");
        assert!(debug.contains("svc"));
        assert!(!debug.contains("secret"));
    }
}
