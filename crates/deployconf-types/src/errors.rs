//! Error types for deployment-configuration tooling

use thiserror::Error;

/// Main error type for deployconf operations
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DeployConfError {
    /// Document shape errors (missing fields, wrong types, unknown enum values)
    #[error("Schema error: {message}")]
    Schema { message: String },

    /// Engine/phase exclusivity and other structural invariants
    #[error("Invariant violation: {message}")]
    InvariantViolation { message: String },

    /// Values outside their allowed range
    #[error("Invalid parameter: {message}")]
    InvalidParameter { message: String },

    /// A required field is absent
    #[error("Missing field: {message}")]
    MissingField { message: String },

    /// Lookup failures (family, model, hardware, configuration)
    #[error("Not found: {message}")]
    NotFound { message: String },

    /// Entity already present under the same key
    #[error("Already exists: {message}")]
    AlreadyExists { message: String },

    /// I/O errors
    #[error("I/O error: {message}")]
    IO { message: String },

    /// Serialization/deserialization errors
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// Whole-document validation failure, every problem collected
    #[error("Validation failed: {}", errors.join("; "))]
    Validation { errors: Vec<String> },

    /// Tool configuration errors (CLI config, vendor registry)
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Internal errors (should not happen in normal operation)
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DeployConfError {
    /// Create a schema error
    pub fn schema(message: impl Into<String>) -> Self {
        Self::Schema {
            message: message.into(),
        }
    }

    /// Create an invariant violation error
    pub fn invariant(message: impl Into<String>) -> Self {
        Self::InvariantViolation {
            message: message.into(),
        }
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(message: impl Into<String>) -> Self {
        Self::MissingField {
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create an already exists error
    pub fn already_exists(message: impl Into<String>) -> Self {
        Self::AlreadyExists {
            message: message.into(),
        }
    }

    /// Create an I/O error
    pub fn io(message: impl Into<String>) -> Self {
        Self::IO {
            message: message.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Create a validation error from collected messages
    pub fn validation(errors: Vec<String>) -> Self {
        Self::Validation { errors }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Errors raised while constructing or checking the document tree.
    /// These are never retried or coerced.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::Schema { .. }
                | Self::InvariantViolation { .. }
                | Self::InvalidParameter { .. }
                | Self::MissingField { .. }
                | Self::Validation { .. }
        )
    }

    /// Check if this error came from the filesystem or a parser
    pub fn is_io(&self) -> bool {
        matches!(self, Self::IO { .. } | Self::Serialization { .. })
    }

    /// Individual messages, one per problem
    pub fn messages(&self) -> Vec<String> {
        match self {
            Self::Validation { errors } => errors.clone(),
            other => vec![other.to_string()],
        }
    }
}

impl From<std::io::Error> for DeployConfError {
    fn from(err: std::io::Error) -> Self {
        Self::io(err.to_string())
    }
}

impl From<serde_json::Error> for DeployConfError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for DeployConfError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::serialization(err.to_string())
    }
}

impl From<toml::de::Error> for DeployConfError {
    fn from(err: toml::de::Error) -> Self {
        Self::config(err.to_string())
    }
}

impl From<toml::ser::Error> for DeployConfError {
    fn from(err: toml::ser::Error) -> Self {
        Self::serialization(err.to_string())
    }
}
