//! Per-address probe failures.

use thiserror::Error;

use crate::shell::ShellError;

/// Terminal failure of one device probe.
///
/// Every variant is local to one address: the topology builder records the
/// address as failed and carries on with the rest of the batch.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// No echo reply.
    #[error("Device did not answer ping")]
    Unreachable,

    /// Login or enable secret rejected. Not retried within the cycle.
    #[error("Authentication failed: {0}")]
    Authentication(#[source] ShellError),

    /// Connect or command deadline expired. Retried next cycle.
    #[error("Timed out: {0}")]
    Timeout(#[source] ShellError),

    /// Any other session failure.
    #[error("Session failed: {0}")]
    Session(#[source] ShellError),

    /// Reachable, but no detection probe matched.
    #[error("Device type not detected")]
    Undetected,
}

impl ProbeError {
    /// Short machine-friendly label used in structured logs.
    #[must_use]
    pub const fn outcome(&self) -> &'static str {
        match self {
            Self::Unreachable => "unreachable",
            Self::Authentication(_) => "auth_failed",
            Self::Timeout(_) => "timeout",
            Self::Session(_) => "session_failed",
            Self::Undetected => "undetected",
        }
    }
}

impl From<ShellError> for ProbeError {
    fn from(error: ShellError) -> Self {
        if error.is_authentication() {
            Self::Authentication(error)
        } else if error.is_timeout() {
            Self::Timeout(error)
        } else {
            Self::Session(error)
        }
    }
}
