//! Error types for configuration parsing and validation.

use std::path::PathBuf;

use thiserror::Error;

use crate::probe::UnknownPlatform;

/// Error type for configuration operations.
///
/// Covers errors from parsing, validation, and file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("Failed to read config file '{}': {source}", path.display())]
    FileRead {
        /// Path to the config file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse the TOML configuration.
    #[error("Failed to parse TOML config: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Failed to write configuration file (for init command).
    #[error("Failed to write config file '{}': {source}", path.display())]
    FileWrite {
        /// Path to the config file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Missing required field that must be provided by CLI or config file.
    #[error("Missing required field: {field}. {hint}")]
    MissingRequired {
        /// Name of the missing field
        field: &'static str,
        /// Hint for how to provide the value
        hint: &'static str,
    },

    /// A device address is blank.
    #[error("Invalid device address '{0}': must not be empty")]
    InvalidAddress(String),

    /// Invalid prompt regex pattern.
    #[error("Invalid regex pattern '{pattern}': {source}")]
    InvalidRegex {
        /// The invalid pattern
        pattern: String,
        /// Underlying regex error
        #[source]
        source: regex::Error,
    },

    /// Invalid duration value (zero or too large).
    #[error("Invalid duration for {field}: {reason}")]
    InvalidDuration {
        /// Name of the field
        field: &'static str,
        /// Reason for invalidity
        reason: String,
    },

    /// Invalid concurrency value.
    #[error("Invalid concurrency: must be greater than 0")]
    InvalidConcurrency,

    /// Detection list names a platform that does not exist.
    #[error(transparent)]
    UnknownPlatform(#[from] UnknownPlatform),

    /// The export command is configured but empty.
    #[error("Invalid export command: must contain at least the program")]
    EmptyCommand,
}

/// Well-known field names for `MissingRequired` errors.
///
/// Use these constants for compile-time safety when matching field names.
pub mod field {
    /// The device address list.
    pub const DEVICES: &str = "devices";
    /// The SSH user name.
    pub const USERNAME: &str = "username";
    /// Password or key file.
    pub const AUTHENTICATION: &str = "password or key_file";
}

impl ConfigError {
    /// Creates a `MissingRequired` error for a required field.
    #[must_use]
    pub const fn missing(field: &'static str, hint: &'static str) -> Self {
        Self::MissingRequired { field, hint }
    }
}
