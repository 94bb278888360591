//! Request and response records shared by every stage.
//!
//! The same `Response` shape is used for a single service reply and for the
//! combined result of an integration.

use std::{collections::HashMap, fmt};

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

#[allow(clippy::upper_case_acronyms)]
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HttpMethod {
    #[default]
    GET,
    POST,
    PUT,
    DELETE,
}

impl HttpMethod {
    /// Whether the method carries a request body on the wire.
    pub fn has_body(&self) -> bool {
        matches!(self, HttpMethod::POST | HttpMethod::PUT | HttpMethod::DELETE)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let method = match self {
            HttpMethod::GET => "GET",
            HttpMethod::POST => "POST",
            HttpMethod::PUT => "PUT",
            HttpMethod::DELETE => "DELETE",
        };
        write!(f, "{}", method)
    }
}

impl From<HttpMethod> for http::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::GET => http::Method::GET,
            HttpMethod::POST => http::Method::POST,
            HttpMethod::PUT => http::Method::PUT,
            HttpMethod::DELETE => http::Method::DELETE,
        }
    }
}

impl std::str::FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::GET),
            "POST" => Ok(HttpMethod::POST),
            "PUT" => Ok(HttpMethod::PUT),
            "DELETE" => Ok(HttpMethod::DELETE),
            other => Err(format!("unsupported method '{other}'")),
        }
    }
}

/// Caller-supplied request, dispatched to every service of an integration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Request {
    #[serde(default)]
    pub method: HttpMethod,
    /// Header names keep the case the caller gave them.
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub body: JsonValue,
    #[serde(default)]
    pub query: HashMap<String, String>,
}

impl Request {
    pub fn new(method: HttpMethod) -> Self {
        Self {
            method,
            ..Default::default()
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: JsonValue) -> Self {
        self.body = body;
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub status: u16,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub body: JsonValue,
}

impl Response {
    pub fn new(status: u16, body: JsonValue) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body,
        }
    }

    pub fn ok(body: JsonValue) -> Self {
        Self::new(200, body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_method_parse_and_display() {
        assert_eq!("post".parse::<HttpMethod>(), Ok(HttpMethod::POST));
        assert_eq!(HttpMethod::DELETE.to_string(), "DELETE");
        assert!("PATCH".parse::<HttpMethod>().is_err());
        assert_eq!(http::Method::from(HttpMethod::PUT), http::Method::PUT);
    }

    #[test]
    fn test_request_deserialize_defaults() {
        let req: Request = serde_json::from_value(json!({ "method": "POST" })).unwrap();
        assert_eq!(req.method, HttpMethod::POST);
        assert!(req.headers.is_empty());
        assert!(req.query.is_empty());
        assert!(req.body.is_null());
    }

    #[test]
    fn test_header_case_preserved() {
        let req = Request::new(HttpMethod::GET).with_header("X-Trace-Id", "abc");
        assert_eq!(req.headers.get("X-Trace-Id").map(String::as_str), Some("abc"));
        assert!(req.headers.get("x-trace-id").is_none());
    }
}
