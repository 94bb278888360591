//! Unified error handling for Weaver
//!
//! Every stage of an execute call (lookup, authentication, transport,
//! combination) reports through `IntegratorError`, so callers get a single
//! descriptive error naming the stage and, where relevant, the service.

use std::{fmt, time::Duration};

/// Unified error types for integration execution
#[derive(Debug)]
pub enum IntegratorError {
    /// No loaded integration has the requested identifier
    IntegrationNotFound(String),

    /// Authentication descriptor tag is not basic, oauth or apiKey
    UnsupportedAuthType(String),

    /// Flow value is not sequential or parallel
    UnknownFlowMode(String),

    /// Connection-level failure talking to a service
    Transport(String),

    /// A request or the whole execute call exceeded its deadline
    Timeout(Duration),

    /// The caller cancelled the execute call
    Cancelled,

    /// A per-service step failed; wraps the stage error
    ServiceExecutionFailed {
        service_id: String,
        cause: Box<IntegratorError>,
    },

    /// Configuration-related errors
    Configuration(String),

    /// Validation errors
    Validation(String),

    /// (De)serialization errors
    Serialization(String),

    /// File and other I/O errors
    Io(std::io::Error),
}

impl IntegratorError {
    pub fn serialization_error(context: &str, err: impl fmt::Display) -> Self {
        IntegratorError::Serialization(format!("{context}: {err}"))
    }

    pub fn service_failed(service_id: impl Into<String>, cause: IntegratorError) -> Self {
        IntegratorError::ServiceExecutionFailed {
            service_id: service_id.into(),
            cause: Box::new(cause),
        }
    }

    /// Innermost error, looking through `ServiceExecutionFailed` wrappers.
    pub fn root_cause(&self) -> &IntegratorError {
        match self {
            IntegratorError::ServiceExecutionFailed { cause, .. } => cause.root_cause(),
            other => other,
        }
    }

    /// Identifier of the failing service, if the error is service-scoped.
    pub fn service_id(&self) -> Option<&str> {
        match self {
            IntegratorError::ServiceExecutionFailed { service_id, .. } => Some(service_id),
            _ => None,
        }
    }
}

impl fmt::Display for IntegratorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntegratorError::IntegrationNotFound(id) => write!(f, "Integration not found: {id}"),
            IntegratorError::UnsupportedAuthType(tag) => {
                write!(f, "Unsupported authentication type: {tag}")
            }
            IntegratorError::UnknownFlowMode(flow) => write!(f, "Unknown flow mode: {flow}"),
            IntegratorError::Transport(cause) => write!(f, "Transport error: {cause}"),
            IntegratorError::Timeout(after) => write!(f, "Timed out after {after:?}"),
            IntegratorError::Cancelled => write!(f, "Execution cancelled"),
            IntegratorError::ServiceExecutionFailed { service_id, cause } => {
                write!(f, "Service '{service_id}' failed: {cause}")
            }
            IntegratorError::Configuration(msg) => write!(f, "Configuration error: {msg}"),
            IntegratorError::Validation(msg) => write!(f, "Validation error: {msg}"),
            IntegratorError::Serialization(msg) => write!(f, "Serialization error: {msg}"),
            IntegratorError::Io(err) => write!(f, "I/O error: {err}"),
        }
    }
}

impl std::error::Error for IntegratorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            IntegratorError::ServiceExecutionFailed { cause, .. } => Some(cause.as_ref()),
            IntegratorError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for IntegratorError {
    fn from(err: std::io::Error) -> Self {
        IntegratorError::Io(err)
    }
}

impl From<validator::ValidationErrors> for IntegratorError {
    fn from(err: validator::ValidationErrors) -> Self {
        IntegratorError::Validation(err.to_string())
    }
}

impl From<serde_json::Error> for IntegratorError {
    fn from(err: serde_json::Error) -> Self {
        IntegratorError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for IntegratorError {
    fn from(err: serde_yaml::Error) -> Self {
        IntegratorError::Serialization(err.to_string())
    }
}

/// Result type alias for integration operations
pub type IntegratorResult<T> = std::result::Result<T, IntegratorError>;

#[macro_export]
macro_rules! config_error {
    ($msg:expr) => {
        $crate::core::IntegratorError::Configuration($msg.to_string())
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::core::IntegratorError::Configuration(format!($fmt, $($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_cause_unwraps_service_failure() {
        let err = IntegratorError::service_failed(
            "s1",
            IntegratorError::UnsupportedAuthType("digest".to_string()),
        );
        assert_eq!(err.service_id(), Some("s1"));
        assert!(matches!(
            err.root_cause(),
            IntegratorError::UnsupportedAuthType(tag) if tag == "digest"
        ));
        assert!(err.to_string().contains("Service 's1' failed"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: IntegratorError = io_error.into();
        assert!(matches!(err, IntegratorError::Io(_)));
        assert!(err.service_id().is_none());

        let err = config_error!("duplicate integration id '{}'", "a");
        assert_eq!(
            err.to_string(),
            "Configuration error: duplicate integration id 'a'"
        );
    }
}
