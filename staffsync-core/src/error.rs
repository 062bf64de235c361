//! Error types for staffsync-core.

use std::path::PathBuf;

use thiserror::Error;

/// Caller-supplied input that cannot be accepted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Intake requires both a name and an email.
    #[error("Name and email are required")]
    NameAndEmailRequired,

    /// A change event arrived without the record payload its operation needs.
    #[error("{operation} event is missing {field}")]
    MissingPayload {
        operation: &'static str,
        field: &'static str,
    },
}

/// All errors that can arise while building a [`crate::StaffsyncConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required setting is absent or blank.
    #[error("missing required configuration value: {key}")]
    Missing { key: &'static str },

    /// A setting is present but unusable.
    #[error("invalid configuration value for {key}: {message}")]
    Invalid { key: &'static str, message: String },

    /// The config file could not be read.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parse error on load: includes file path and line context from serde_yaml.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}
