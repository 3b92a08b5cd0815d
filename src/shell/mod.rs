//! Remote command channel to network devices.
//!
//! This module provides types and traits for:
//! - Login material ([`Credentials`])
//! - Opening interactive sessions ([`Connector`])
//! - Running commands and reading until the prompt ([`Session`])
//! - Production SSH implementation ([`SshConnector`], [`SshSession`])
//!
//! A session is single-use: it is opened for one device in one discovery
//! pass and must be closed by the caller on every exit path.

mod error;
mod ssh;


pub use error::ShellError;
pub use ssh::{DEFAULT_PROMPT_PATTERN, SshConnector, SshSession, clean_output};

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use regex::Regex;

use crate::topology::DeviceAddress;

/// Login material shared by every device in a run.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    /// SSH user name.
    pub username: String,
    /// SSH password, if password authentication is used.
    pub password: Option<String>,
    /// Enable secret for privileged mode.
    pub secret: Option<String>,
    /// Private key file, if public key authentication is used.
    pub key_file: Option<PathBuf>,
}

impl Credentials {
    /// Creates password-based credentials.
    #[must_use]
    pub fn with_password(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: Some(password.into()),
            ..Self::default()
        }
    }

    /// Sets the enable secret.
    #[must_use]
    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(secret.into());
        self
    }

    /// Sets the private key file.
    #[must_use]
    pub fn with_key_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.key_file = Some(path.into());
        self
    }
}

// Secrets stay out of logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("secret", &self.secret.as_ref().map(|_| "***"))
            .field("key_file", &self.key_file)
            .finish()
    }
}

/// Opens interactive sessions to devices.
pub trait Connector: Send + Sync {
    /// Session type produced by this connector.
    type Session: Session;

    /// Opens a logged-in interactive session to `address`.
    ///
    /// The whole exchange (transport, authentication, first prompt) must
    /// finish within `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`ShellError::Authentication`] for rejected credentials,
    /// [`ShellError::Timeout`] if the deadline expires, or another
    /// [`ShellError`] for transport failures.
    fn open_session(
        &self,
        address: &DeviceAddress,
        credentials: &Credentials,
        timeout: Duration,
    ) -> impl std::future::Future<Output = Result<Self::Session, ShellError>> + Send;
}

/// An open interactive session.
pub trait Session: Send {
    /// Runs one command and returns its output.
    ///
    /// Output is read until the last line matches `prompt`; the echoed
    /// command and trailing prompt are stripped.
    ///
    /// # Errors
    ///
    /// Returns [`ShellError::Timeout`] if the prompt does not appear within
    /// `read_timeout`, or [`ShellError::Command`] if the channel fails.
    fn run(
        &mut self,
        command: &str,
        prompt: &Regex,
        read_timeout: Duration,
    ) -> impl std::future::Future<Output = Result<String, ShellError>> + Send;

    /// Switches to privileged (enable) mode using `secret`.
    ///
    /// # Errors
    ///
    /// Returns [`ShellError::Authentication`] if the secret is rejected.
    fn enter_privileged(
        &mut self,
        secret: &str,
        prompt: &Regex,
        read_timeout: Duration,
    ) -> impl std::future::Future<Output = Result<(), ShellError>> + Send;

    /// Closes the session. Never fails; problems are logged.
    fn close(self) -> impl std::future::Future<Output = ()> + Send;
}

/// Scripted connector and session for tests.
#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// How a mock connection attempt ends.
    #[derive(Debug, Clone)]
    pub enum MockDevice {
        /// Session opens; commands answer from the map.
        Responds(HashMap<String, String>),
        /// Credentials are rejected.
        RejectsLogin,
        /// Login never completes.
        TimesOut,
    }

    /// A connector that serves canned command output per address.
    #[derive(Debug, Default)]
    pub struct MockConnector {
        devices: HashMap<String, MockDevice>,
        opened: Arc<AtomicUsize>,
        closed: Arc<AtomicUsize>,
        privileged: Arc<AtomicUsize>,
    }

    impl MockConnector {
        /// Creates a connector with no devices (every open fails).
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Adds a device answering the given commands.
        #[must_use]
        pub fn with_device(mut self, address: &str, responses: &[(&str, &str)]) -> Self {
            let map = responses
                .iter()
                .map(|(cmd, out)| ((*cmd).to_string(), (*out).to_string()))
                .collect();
            self.devices
                .insert(address.to_string(), MockDevice::Responds(map));
            self
        }

        /// Adds a device with a specific failure behavior.
        #[must_use]
        pub fn with_behavior(mut self, address: &str, behavior: MockDevice) -> Self {
            self.devices.insert(address.to_string(), behavior);
            self
        }

        /// Number of sessions opened so far.
        #[must_use]
        pub fn opened(&self) -> usize {
            self.opened.load(Ordering::SeqCst)
        }

        /// Number of sessions closed so far.
        #[must_use]
        pub fn closed(&self) -> usize {
            self.closed.load(Ordering::SeqCst)
        }

        /// Number of successful enable-mode switches.
        #[must_use]
        pub fn privileged(&self) -> usize {
            self.privileged.load(Ordering::SeqCst)
        }
    }

    impl Connector for MockConnector {
        type Session = MockSession;

        async fn open_session(
            &self,
            address: &DeviceAddress,
            credentials: &Credentials,
            _timeout: Duration,
        ) -> Result<MockSession, ShellError> {
            match self.devices.get(address.as_str()) {
                Some(MockDevice::Responds(responses)) => {
                    self.opened.fetch_add(1, Ordering::SeqCst);
                    Ok(MockSession {
                        responses: responses.clone(),
                        closed: Arc::clone(&self.closed),
                        privileged: Arc::clone(&self.privileged),
                    })
                }
                Some(MockDevice::RejectsLogin) => Err(ShellError::Authentication {
                    username: credentials.username.clone(),
                }),
                Some(MockDevice::TimesOut) => Err(ShellError::Timeout { stage: "connecting" }),
                None => Err(ShellError::Connection("no such mock device".into())),
            }
        }
    }

    /// Session returned by [`MockConnector`].
    #[derive(Debug)]
    pub struct MockSession {
        responses: HashMap<String, String>,
        closed: Arc<AtomicUsize>,
        privileged: Arc<AtomicUsize>,
    }

    impl Session for MockSession {
        async fn run(
            &mut self,
            command: &str,
            _prompt: &Regex,
            _read_timeout: Duration,
        ) -> Result<String, ShellError> {
            self.responses
                .get(command)
                .cloned()
                .ok_or_else(|| ShellError::Command {
                    command: command.to_string(),
                    reason: "no scripted response".to_string(),
                })
        }

        async fn enter_privileged(
            &mut self,
            secret: &str,
            _prompt: &Regex,
            _read_timeout: Duration,
        ) -> Result<(), ShellError> {
            if secret.is_empty() {
                return Err(ShellError::Authentication {
                    username: "enable".to_string(),
                });
            }
            self.privileged.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn close(self) {
            self.closed.fetch_add(1, Ordering::SeqCst);
        }
    }
}
