//! Error types for remote shell operations.

use std::path::PathBuf;

use thiserror::Error;

/// Error type for remote command channel operations.
///
/// Distinguishes rejected credentials (never worth retrying within a cycle)
/// from slowness and transport failures (the next cycle may succeed).
#[derive(Debug, Error)]
pub enum ShellError {
    /// The device rejected the supplied credentials or enable secret.
    #[error("Authentication rejected for user '{username}'")]
    Authentication {
        /// User name that was rejected.
        username: String,
    },

    /// A connect, login, or read deadline expired.
    #[error("Timed out while {stage}")]
    Timeout {
        /// What the channel was doing when the deadline expired.
        stage: &'static str,
    },

    /// Transport-level failure (refused, reset, protocol error).
    #[error("Connection error: {0}")]
    Connection(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The channel closed or failed while a command was running.
    #[error("Command '{command}' failed: {reason}")]
    Command {
        /// The command being run.
        command: String,
        /// Why it failed.
        reason: String,
    },

    /// The private key file could not be read or decoded.
    #[error("Failed to load key file {}: {source}", path.display())]
    KeyLoad {
        /// Path of the key file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl ShellError {
    /// Returns true for failures caused by credentials or key material.
    #[must_use]
    pub const fn is_authentication(&self) -> bool {
        matches!(self, Self::Authentication { .. } | Self::KeyLoad { .. })
    }

    /// Returns true if the failure was a deadline expiring.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
