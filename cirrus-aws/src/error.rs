//! Error types for client auto-configuration.

use cirrus_config::ConfigError;
use cirrus_container::{BoxError, ContainerError};
use thiserror::Error;

/// Result type for auto-configuration.
pub type Result<T> = std::result::Result<T, AutoConfigureError>;

/// Failure of a single dynamic call.
#[derive(Debug, Error)]
pub enum InvocationError {
    /// The target has no operation with that name.
    #[error("{type_name} has no operation '{operation}'")]
    NoSuchOperation { type_name: String, operation: String },

    /// The type has no static operation with that name.
    #[error("{type_name} has no static operation '{operation}'")]
    NoSuchStaticOperation { type_name: String, operation: String },

    /// The type is not available.
    #[error("Type not found: {0}")]
    TypeNotFound(String),

    /// Arguments do not fit the operation's shape.
    #[error("Invalid arguments for '{operation}': {message}")]
    InvalidArgument { operation: String, message: String },

    /// The operation ran and failed.
    #[error("{type_name}.{operation} failed: {cause}")]
    Failed {
        type_name: String,
        operation: String,
        #[source]
        cause: BoxError,
    },
}

impl InvocationError {
    pub fn invalid_argument(operation: &str, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            operation: operation.to_string(),
            message: message.into(),
        }
    }

    pub fn failed(type_name: &str, operation: &str, cause: impl Into<BoxError>) -> Self {
        Self::Failed {
            type_name: type_name.to_string(),
            operation: operation.to_string(),
            cause: cause.into(),
        }
    }

    /// The operation or type simply is not there.
    pub fn is_absent(&self) -> bool {
        matches!(
            self,
            Self::NoSuchOperation { .. } | Self::NoSuchStaticOperation { .. } | Self::TypeNotFound(_)
        )
    }
}

/// A client type name outside the SDK's service package namespace.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("'{type_name}' is not inside package prefix '{expected_prefix}'")]
pub struct MalformedTypeName {
    pub type_name: String,
    pub expected_prefix: String,
}

/// Auto-configuration errors.
#[derive(Debug, Error)]
pub enum AutoConfigureError {
    /// The client is switched off through its `enabled` property.
    #[error("Client '{0}' is disabled")]
    ClientDisabled(String),

    /// An optional SDK type is not available.
    #[error("Type not found: {0}")]
    TypeNotFound(String),

    /// Key derivation failed.
    #[error(transparent)]
    MalformedTypeName(#[from] MalformedTypeName),

    /// A discovered builder does not follow the SDK naming convention.
    #[error("Client type could not be determined for builder '{0}'")]
    ClientTypeNotDetermined(String),

    /// A builder could not be created or built.
    #[error("Failed to set up client '{client}': {source}")]
    Invocation {
        client: String,
        #[source]
        source: InvocationError,
    },

    /// A builder call produced something other than what was asked for.
    #[error("Unexpected result from '{operation}' while setting up '{client}': expected {expected}")]
    UnexpectedResult {
        client: String,
        operation: String,
        expected: &'static str,
    },

    /// Discovery resources could not be read.
    #[error("Unable to load builder catalog from '{location}': {source}")]
    Catalog {
        location: String,
        #[source]
        source: std::io::Error,
    },

    /// A configuration table could not be bound.
    #[error("Invalid client properties at '{key}': {message}")]
    Properties { key: String, message: String },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Container(#[from] ContainerError),
}

impl AutoConfigureError {
    pub fn invocation(client: &str, source: InvocationError) -> Self {
        match source {
            InvocationError::TypeNotFound(name) => Self::TypeNotFound(name),
            other => Self::Invocation {
                client: client.to_string(),
                source: other,
            },
        }
    }

    /// Whether bootstrap must stop. Optional absence and disabled clients
    /// are skipped instead.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::ClientDisabled(_) | Self::TypeNotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatality() {
        assert!(!AutoConfigureError::ClientDisabled("a".into()).is_fatal());
        assert!(!AutoConfigureError::TypeNotFound("a".into()).is_fatal());
        assert!(AutoConfigureError::ClientTypeNotDetermined("a".into()).is_fatal());
        assert!(
            AutoConfigureError::from(MalformedTypeName {
                type_name: "x.Y".into(),
                expected_prefix: "com.".into(),
            })
            .is_fatal()
        );
    }

    #[test]
    fn test_type_not_found_stays_optional() {
        let err = AutoConfigureError::invocation(
            "com.example.Client",
            InvocationError::TypeNotFound("com.example.ClientBuilder".into()),
        );
        assert!(matches!(err, AutoConfigureError::TypeNotFound(_)));
    }

    #[test]
    fn test_failed_keeps_cause() {
        let err = InvocationError::failed("Builder", "build", "boom");
        assert!(err.to_string().contains("boom"));
        assert!(std::error::Error::source(&err).is_some());
        assert!(!err.is_absent());
    }
}
