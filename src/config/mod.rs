use std::collections::HashSet;
use std::fs;
use std::{fmt, str::FromStr, time::Duration};

use log::{debug, trace};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use validator::{Validate, ValidationError};

use crate::{
    auth,
    core::{IntegrationRegistry, IntegratorError, IntegratorResult},
};

#[derive(Default, Debug, Serialize, Deserialize, Validate)]
#[validate(schema(function = "Config::validate_integration_ids"))]
pub struct Config {
    #[serde(default)]
    #[validate(nested)]
    pub weaver: Weaver,

    #[serde(default)]
    #[validate(nested)]
    pub http: HttpClient,

    #[validate(length(min = 1))]
    #[validate(nested)]
    pub integrations: Vec<Integration>,
}

// Config file load and validation
impl Config {
    pub fn load_from_yaml<P>(path: P) -> IntegratorResult<Self>
    where
        P: AsRef<std::path::Path> + fmt::Display,
    {
        let conf_str = fs::read_to_string(&path).map_err(|e| {
            IntegratorError::Configuration(format!("Unable to read conf file from {path}: {e}"))
        })?;
        debug!("Conf file read from {path}");
        Self::from_yaml(&conf_str)
    }

    pub fn from_yaml(conf_str: &str) -> IntegratorResult<Self> {
        trace!("Read conf file: {conf_str}");
        let doc: serde_yaml::Value = serde_yaml::from_str(conf_str)
            .map_err(|e| IntegratorError::serialization_error("Unable to parse yaml conf", e))?;
        Self::check_flow_modes(&doc)?;

        let conf: Config = serde_yaml::from_value(doc)
            .map_err(|e| IntegratorError::serialization_error("Unable to parse yaml conf", e))?;

        trace!("Loaded conf: {conf:?}");

        conf.validate()?;

        Ok(conf)
    }

    pub fn to_yaml(&self) -> IntegratorResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Build the immutable integration set shared by every execute call.
    pub fn build_registry(&self) -> IntegratorResult<IntegrationRegistry> {
        IntegrationRegistry::new(self.integrations.clone())
    }

    /// Reject unknown `flow` values with `UnknownFlowMode` before typed parsing.
    fn check_flow_modes(doc: &serde_yaml::Value) -> IntegratorResult<()> {
        let integrations = doc
            .get("integrations")
            .and_then(serde_yaml::Value::as_sequence);

        for flow in integrations
            .into_iter()
            .flatten()
            .filter_map(|integration| integration.get("flow"))
            .filter_map(serde_yaml::Value::as_str)
        {
            flow.parse::<FlowMode>()?;
        }
        Ok(())
    }

    fn validate_integration_ids(&self) -> Result<(), ValidationError> {
        let mut seen = HashSet::new();
        for integration in &self.integrations {
            if !seen.insert(integration.id.as_str()) {
                let mut err = ValidationError::new("duplicate_integration_id");
                err.add_param("id".into(), &integration.id);
                return Err(err);
            }
        }
        Ok(())
    }
}

/// Orchestrator-wide settings
#[derive(Clone, Default, Debug, Serialize, Deserialize, Validate)]
pub struct Weaver {
    /// Deadline for a whole execute call, in seconds.
    #[validate(range(min = 1))]
    pub timeout: Option<u64>,
    #[serde(default)]
    pub failure_mode: FailureMode,
    /// Propagate response headers into the sequential aggregate.
    #[serde(default)]
    pub merge_headers: bool,
    #[validate(nested)]
    pub log: Option<Log>,
}

impl Weaver {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout.map(Duration::from_secs)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
pub struct Log {
    #[validate(length(min = 1))]
    pub path: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
pub struct HttpClient {
    /// Per-request timeout, in seconds.
    #[serde(default = "HttpClient::default_timeout")]
    #[validate(range(min = 1))]
    pub timeout: u64,
    /// Transport-level retries on connection failure.
    #[serde(default)]
    #[validate(range(max = 10))]
    pub retries: u32,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self {
            timeout: Self::default_timeout(),
            retries: 0,
        }
    }
}

impl HttpClient {
    fn default_timeout() -> u64 {
        10
    }
}

#[derive(Clone, Copy, Default, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureMode {
    /// Abort the whole call on the first service failure.
    #[default]
    FailFast,
    /// Leave failed services out of the aggregate.
    BestEffort,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FlowMode {
    Sequential,
    Parallel,
}

impl FlowMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlowMode::Sequential => "sequential",
            FlowMode::Parallel => "parallel",
        }
    }
}

impl fmt::Display for FlowMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FlowMode {
    type Err = IntegratorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sequential" => Ok(FlowMode::Sequential),
            "parallel" => Ok(FlowMode::Parallel),
            other => Err(IntegratorError::UnknownFlowMode(other.to_string())),
        }
    }
}

impl TryFrom<String> for FlowMode {
    type Error = IntegratorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FlowMode> for String {
    fn from(flow: FlowMode) -> Self {
        flow.as_str().to_string()
    }
}

/// A named, ordered collection of services plus a flow mode.
#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
pub struct Integration {
    #[validate(length(min = 1))]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Declaration order drives both dispatch and sequential merge order.
    #[serde(default)]
    #[validate(nested)]
    pub services: Vec<Service>,
    pub flow: FlowMode,
}

#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
#[validate(schema(function = "Service::validate_authentication"))]
pub struct Service {
    #[validate(length(min = 1))]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[validate(url)]
    pub endpoint: String,
    pub authentication: AuthDescriptor,
}

impl Service {
    fn validate_authentication(&self) -> Result<(), ValidationError> {
        auth::resolve(&self.authentication).map(|_| ()).map_err(|e| {
            let code = match e {
                IntegratorError::UnsupportedAuthType(_) => "unsupported_auth_type",
                _ => "invalid_credentials",
            };
            let mut err = ValidationError::new(code);
            err.add_param("service".into(), &self.id);
            err.add_param("reason".into(), &e.to_string());
            err
        })
    }
}

/// Authentication descriptor as it appears in external data.
///
/// The tag and credential shape are checked when the descriptor is resolved
/// into an `AuthProvider`; the typed constructors always produce a resolvable
/// descriptor.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthDescriptor {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub credentials: JsonValue,
}

impl fmt::Debug for AuthDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthDescriptor")
            .field("kind", &self.kind)
            .field("credentials", &"<redacted>")
            .finish()
    }
}

impl AuthDescriptor {
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            kind: auth::BASIC.to_string(),
            credentials: json!({ "username": username.into(), "password": password.into() }),
        }
    }

    pub fn oauth(token: impl Into<String>) -> Self {
        Self {
            kind: auth::OAUTH.to_string(),
            credentials: json!({ "token": token.into() }),
        }
    }

    pub fn api_key(key: impl Into<String>) -> Self {
        Self {
            kind: auth::API_KEY.to_string(),
            credentials: json!({ "apiKey": key.into() }),
        }
    }
}
