//! Configuration error types

use thiserror::Error;

/// Errors raised while resolving or validating configuration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A field the invoked tool needs was never provided
    #[error("{field} is required but was not set")]
    MissingRequired { field: &'static str },

    /// A field was provided but could not be interpreted
    #[error("{field} has invalid value {value:?}: {reason}")]
    MalformedValue {
        field: &'static str,
        value: String,
        reason: String,
    },
}

/// Discriminant of [`ConfigError`] without its payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigErrorKind {
    MissingRequired,
    MalformedValue,
}

impl ConfigError {
    pub fn kind(&self) -> ConfigErrorKind {
        match self {
            ConfigError::MissingRequired { .. } => ConfigErrorKind::MissingRequired,
            ConfigError::MalformedValue { .. } => ConfigErrorKind::MalformedValue,
        }
    }

    /// Name of the input the error refers to
    pub fn field(&self) -> &'static str {
        match self {
            ConfigError::MissingRequired { field } | ConfigError::MalformedValue { field, .. } => {
                *field
            }
        }
    }

    pub(crate) fn malformed(field: &'static str, value: &str, reason: impl Into<String>) -> Self {
        ConfigError::MalformedValue {
            field,
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
