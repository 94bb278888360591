//! Authentication provider resolution.
//!
//! An `AuthDescriptor` arrives as untyped data (a tag plus a credentials
//! object). `resolve` turns it into the closed `AuthProvider` enum, checking
//! that the tag is known and that the credentials carry exactly the fields
//! of that tag's variant. Authenticating is pure data transformation; no
//! I/O happens here.

pub mod basic_auth;
pub mod bearer_auth;
pub mod key_auth;

use serde_json::Value as JsonValue;

use crate::{
    config::AuthDescriptor,
    core::{IntegratorError, IntegratorResult, Request},
};

pub use basic_auth::BasicAuth;
pub use bearer_auth::BearerAuth;
pub use key_auth::KeyAuth;

pub const BASIC: &str = "basic";
pub const OAUTH: &str = "oauth";
pub const API_KEY: &str = "apiKey";

/// Strategy that turns a bare endpoint and request into an authenticated one.
#[derive(Clone, Debug)]
pub enum AuthProvider {
    Basic(BasicAuth),
    OAuth(BearerAuth),
    ApiKey(KeyAuth),
}

/// Resolve a descriptor into its provider.
///
/// # Errors
/// `UnsupportedAuthType` for an unknown tag; `Serialization`/`Validation`
/// when the credentials do not match the tag's shape.
pub fn resolve(descriptor: &AuthDescriptor) -> IntegratorResult<AuthProvider> {
    let credentials = descriptor.credentials.clone();
    match descriptor.kind.as_str() {
        BASIC => Ok(AuthProvider::Basic(BasicAuth::try_from(credentials)?)),
        OAUTH => Ok(AuthProvider::OAuth(BearerAuth::try_from(credentials)?)),
        API_KEY => Ok(AuthProvider::ApiKey(KeyAuth::try_from(credentials)?)),
        other => Err(IntegratorError::UnsupportedAuthType(other.to_string())),
    }
}

impl AuthProvider {
    pub fn kind(&self) -> &'static str {
        match self {
            AuthProvider::Basic(_) => BASIC,
            AuthProvider::OAuth(_) => OAUTH,
            AuthProvider::ApiKey(_) => API_KEY,
        }
    }

    /// Produce the authenticated endpoint and a copy of the request carrying
    /// the credential. The caller's request is left untouched.
    pub fn authenticate(&self, endpoint: &str, request: &Request) -> (String, Request) {
        let mut augmented = request.clone();
        match self {
            AuthProvider::Basic(auth) => auth.apply(&mut augmented),
            AuthProvider::OAuth(auth) => auth.apply(&mut augmented),
            AuthProvider::ApiKey(auth) => auth.apply(&mut augmented),
        }
        (endpoint.to_string(), augmented)
    }
}

/// Parse a credentials object, rejecting `null` before serde gets a chance
/// to report a less useful message.
pub(crate) fn parse_credentials<T>(kind: &str, value: JsonValue) -> IntegratorResult<T>
where
    T: serde::de::DeserializeOwned + validator::Validate,
{
    if value.is_null() {
        return Err(IntegratorError::Validation(format!(
            "missing credentials for {kind} authentication"
        )));
    }
    let credentials: T = serde_json::from_value(value).map_err(|e| {
        IntegratorError::serialization_error(&format!("Invalid {kind} credentials"), e)
    })?;
    credentials.validate()?;
    Ok(credentials)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::HttpMethod;
    use serde_json::json;

    #[test]
    fn test_resolve_known_kinds() {
        assert_eq!(resolve(&AuthDescriptor::basic("u", "p")).unwrap().kind(), BASIC);
        assert_eq!(resolve(&AuthDescriptor::oauth("t")).unwrap().kind(), OAUTH);
        assert_eq!(resolve(&AuthDescriptor::api_key("k")).unwrap().kind(), API_KEY);
    }

    #[test]
    fn test_resolve_unknown_kind() {
        let descriptor = AuthDescriptor {
            kind: "digest".to_string(),
            credentials: json!({ "token": "t" }),
        };
        assert!(matches!(
            resolve(&descriptor),
            Err(IntegratorError::UnsupportedAuthType(tag)) if tag == "digest"
        ));
    }

    #[test]
    fn test_resolve_rejects_mixed_credentials() {
        // Two variants populated at once
        let descriptor = AuthDescriptor {
            kind: OAUTH.to_string(),
            credentials: json!({ "token": "t", "apiKey": "k" }),
        };
        assert!(resolve(&descriptor).is_err());

        let descriptor = AuthDescriptor {
            kind: API_KEY.to_string(),
            credentials: JsonValue::Null,
        };
        assert!(matches!(
            resolve(&descriptor),
            Err(IntegratorError::Validation(_))
        ));
    }

    #[test]
    fn test_authenticate_keeps_endpoint_and_caller_request() {
        let request = Request::new(HttpMethod::GET).with_header("Accept", "application/json");
        let provider = resolve(&AuthDescriptor::oauth("t-1")).unwrap();

        let (endpoint, augmented) = provider.authenticate("https://a.example.com/x?y=1", &request);

        assert_eq!(endpoint, "https://a.example.com/x?y=1");
        assert_eq!(augmented.headers.len(), 2);
        assert_eq!(request.headers.len(), 1);
    }
}
