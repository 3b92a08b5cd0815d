//! Production remote shell over SSH using russh.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use russh::client::{self, Handle, Msg};
use russh::{Channel, ChannelMsg, Disconnect, Pty};

use super::{Connector, Credentials, Session, ShellError};
use crate::topology::DeviceAddress;

/// Prompt pattern used when none is configured.
///
/// Matched against the last line of output: a non-blank token ending in
/// `>` (user mode), `#` (privileged) or `$`, optionally followed by a space.
pub const DEFAULT_PROMPT_PATTERN: &str = r"^\S[^\r\n]{0,63}[>#$]\s*$";

/// Pager marker printed when output fills the terminal.
const PAGER_MARKER: &str = "--More--";

/// Password prompt shown by `enable`.
const PASSWORD_PROMPT: &str = "password:";

/// Sent once after login. Devices that reject it still answer with a prompt.
const DISABLE_PAGING_COMMAND: &str = "terminal length 0";

const PTY_COLUMNS: u32 = 511;
const PTY_ROWS: u32 = 24;

/// Host key policy: devices are addressed by IP and rarely carry stable,
/// distributable host keys, so every key is accepted.
struct AcceptAnyHostKey;

#[async_trait]
impl client::Handler for AcceptAnyHostKey {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        _server_public_key: &russh_keys::key::PublicKey,
    ) -> Result<bool, Self::Error> {
        Ok(true)
    }
}

/// SSH connector backed by russh.
///
/// Opens a PTY-backed interactive shell, the way an operator's terminal
/// would, because several network operating systems refuse exec requests.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use argus_topo::shell::{Connector, Credentials, Session, SshConnector, DEFAULT_PROMPT_PATTERN};
/// use argus_topo::topology::DeviceAddress;
/// use regex::Regex;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let prompt = Regex::new(DEFAULT_PROMPT_PATTERN)?;
/// let connector = SshConnector::new(22, prompt.clone());
/// let credentials = Credentials::with_password("admin", "secret");
/// let mut session = connector
///     .open_session(&DeviceAddress::new("10.0.0.1"), &credentials, Duration::from_secs(20))
///     .await?;
/// let version = session.run("show version", &prompt, Duration::from_secs(20)).await;
/// session.close().await;
/// println!("{}", version?);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct SshConnector {
    port: u16,
    prompt: Regex,
    config: Arc<client::Config>,
}

impl SshConnector {
    /// Creates a connector for the given SSH port.
    ///
    /// `prompt` is used to recognize the first prompt after login.
    #[must_use]
    pub fn new(port: u16, prompt: Regex) -> Self {
        Self {
            port,
            prompt,
            config: Arc::new(client::Config::default()),
        }
    }

    /// Returns the SSH port.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    async fn establish(
        &self,
        address: &DeviceAddress,
        credentials: &Credentials,
    ) -> Result<SshSession, ShellError> {
        let mut handle = client::connect(
            Arc::clone(&self.config),
            (address.as_str(), self.port),
            AcceptAnyHostKey,
        )
        .await
        .map_err(transport_error)?;

        if !authenticate(&mut handle, credentials).await? {
            return Err(ShellError::Authentication {
                username: credentials.username.clone(),
            });
        }

        let channel = handle
            .channel_open_session()
            .await
            .map_err(transport_error)?;
        channel
            .request_pty(false, "vt100", PTY_COLUMNS, PTY_ROWS, 0, 0, &[(Pty::ECHO, 1)])
            .await
            .map_err(transport_error)?;
        channel
            .request_shell(false)
            .await
            .map_err(transport_error)?;

        let mut session = SshSession { handle, channel };
        let prompt = &self.prompt;
        session
            .read_until("login banner", |buffer| prompt.is_match(&buffer.last_line()))
            .await?;

        // A banner line can pass for a prompt when it ends at a packet
        // boundary; the echo of this command marks where the shell really is.
        session.send_line(DISABLE_PAGING_COMMAND).await?;
        session
            .read_until("disabling paging", |buffer| {
                synced_to_prompt(buffer, DISABLE_PAGING_COMMAND, prompt)
            })
            .await?;
        Ok(session)
    }
}

impl Connector for SshConnector {
    type Session = SshSession;

    async fn open_session(
        &self,
        address: &DeviceAddress,
        credentials: &Credentials,
        timeout: Duration,
    ) -> Result<SshSession, ShellError> {
        tokio::time::timeout(timeout, self.establish(address, credentials))
            .await
            .map_err(|_| ShellError::Timeout { stage: "connecting" })?
    }
}

impl std::fmt::Debug for SshConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SshConnector")
            .field("port", &self.port)
            .field("prompt", &self.prompt.as_str())
            .finish_non_exhaustive()
    }
}

/// Tries key authentication, then password authentication.
///
/// Returns `Ok(false)` when the device rejected every method offered.
async fn authenticate(
    handle: &mut Handle<AcceptAnyHostKey>,
    credentials: &Credentials,
) -> Result<bool, ShellError> {
    if let Some(path) = &credentials.key_file {
        let key = russh_keys::load_secret_key(path, None).map_err(|e| ShellError::KeyLoad {
            path: path.clone(),
            source: Box::new(e),
        })?;
        let accepted = handle
            .authenticate_publickey(credentials.username.clone(), Arc::new(key))
            .await
            .map_err(transport_error)?;
        if accepted {
            return Ok(true);
        }
    }

    if let Some(password) = &credentials.password {
        return handle
            .authenticate_password(credentials.username.clone(), password.clone())
            .await
            .map_err(transport_error);
    }

    Ok(false)
}

fn transport_error(error: russh::Error) -> ShellError {
    match error {
        russh::Error::ConnectionTimeout => ShellError::Timeout { stage: "negotiating" },
        other => ShellError::Connection(Box::new(other)),
    }
}

/// An interactive SSH shell on one device.
pub struct SshSession {
    handle: Handle<AcceptAnyHostKey>,
    channel: Channel<Msg>,
}

impl std::fmt::Debug for SshSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SshSession")
            .field("channel", &self.channel.id())
            .finish_non_exhaustive()
    }
}

impl SshSession {
    async fn send_line(&self, line: &str) -> Result<(), ShellError> {
        self.send(line, line).await
    }

    /// Sends `line` but reports failures under `label` (used for secrets).
    async fn send(&self, line: &str, label: &str) -> Result<(), ShellError> {
        let payload = format!("{line}\n");
        self.channel
            .data(payload.as_bytes())
            .await
            .map_err(|e| ShellError::Command {
                command: label.to_string(),
                reason: e.to_string(),
            })
    }

    /// Reads output until `done` accepts the bytes received so far.
    ///
    /// Pager prompts are answered with a space and removed from the buffer.
    /// The output is decoded once, when `done` is satisfied.
    async fn read_until<F>(&mut self, context: &'static str, done: F) -> Result<String, ShellError>
    where
        F: Fn(&ReadBuffer) -> bool + Send,
    {
        let mut buffer = ReadBuffer::default();

        loop {
            match self.channel.wait().await {
                Some(ChannelMsg::Data { data } | ChannelMsg::ExtendedData { data, .. }) => {
                    buffer.extend(&data[..]);
                }
                Some(ChannelMsg::Eof | ChannelMsg::Close) | None => {
                    return Err(ShellError::Command {
                        command: context.to_string(),
                        reason: "channel closed".to_string(),
                    });
                }
                Some(_) => continue,
            }

            if buffer.strip_pager() {
                self.channel
                    .data(&b" "[..])
                    .await
                    .map_err(|e| ShellError::Command {
                        command: context.to_string(),
                        reason: e.to_string(),
                    })?;
                continue;
            }

            if done(&buffer) {
                return Ok(buffer.into_text());
            }
        }
    }
}

impl Session for SshSession {
    async fn run(
        &mut self,
        command: &str,
        prompt: &Regex,
        read_timeout: Duration,
    ) -> Result<String, ShellError> {
        self.send_line(command).await?;
        let raw = tokio::time::timeout(
            read_timeout,
            self.read_until("command output", |buffer| prompt.is_match(&buffer.last_line())),
        )
        .await
        .map_err(|_| ShellError::Timeout {
            stage: "reading command output",
        })??;

        tracing::trace!(command, bytes = raw.len(), "Command output received");
        Ok(clean_output(&raw, command, prompt))
    }

    async fn enter_privileged(
        &mut self,
        secret: &str,
        prompt: &Regex,
        read_timeout: Duration,
    ) -> Result<(), ShellError> {
        let rejected = || ShellError::Authentication {
            username: "enable".to_string(),
        };

        self.send_line("enable").await?;
        let tail = tokio::time::timeout(
            read_timeout,
            self.read_until("enable", |buffer| awaits_secret_or_prompt(buffer, prompt)),
        )
        .await
        .map_err(|_| ShellError::Timeout {
            stage: "entering privileged mode",
        })??;

        if last_line(&tail).to_ascii_lowercase().contains(PASSWORD_PROMPT) {
            self.send(secret, "<enable secret>").await?;
            let after = tokio::time::timeout(
                read_timeout,
                self.read_until("enable secret", |buffer| awaits_secret_or_prompt(buffer, prompt)),
            )
            .await
            .map_err(|_| ShellError::Timeout {
                stage: "sending enable secret",
            })??;

            if !last_line(&after).trim_end().ends_with('#') {
                return Err(rejected());
            }
            return Ok(());
        }

        if last_line(&tail).trim_end().ends_with('#') {
            Ok(())
        } else {
            Err(rejected())
        }
    }

    async fn close(self) {
        if let Err(e) = self.channel.eof().await {
            tracing::debug!(error = %e, "Failed to send EOF");
        }
        if let Err(e) = self
            .handle
            .disconnect(Disconnect::ByApplication, "", "English")
            .await
        {
            tracing::debug!(error = %e, "Failed to disconnect cleanly");
        }
    }
}

/// Returns the text after the last newline, without carriage returns.
pub(super) fn last_line(buffer: &str) -> &str {
    let tail = buffer.rsplit('\n').next().unwrap_or(buffer);
    tail.trim_end_matches('\r')
}

/// Raw bytes received from the shell during one read.
///
/// Packets may split a multi-byte character, so bytes are kept as received
/// and only the current last line is decoded while waiting.
#[derive(Debug, Default)]
pub(super) struct ReadBuffer {
    bytes: Vec<u8>,
}

impl ReadBuffer {
    pub(super) fn extend(&mut self, chunk: &[u8]) {
        self.bytes.extend_from_slice(chunk);
    }

    /// Returns the line being written, without carriage returns.
    pub(super) fn last_line(&self) -> String {
        let start = self
            .bytes
            .iter()
            .rposition(|b| *b == b'\n')
            .map_or(0, |at| at + 1);
        let tail = String::from_utf8_lossy(&self.bytes[start..]);
        tail.trim_end_matches('\r').to_string()
    }

    /// Returns true if `needle` was received anywhere in this read.
    pub(super) fn contains(&self, needle: &str) -> bool {
        let needle = needle.as_bytes();
        !needle.is_empty() && self.bytes.windows(needle.len()).any(|w| w == needle)
    }

    /// Removes a pager marker from the last line. Returns true if one was found.
    pub(super) fn strip_pager(&mut self) -> bool {
        if !self.last_line().contains(PAGER_MARKER) {
            return false;
        }
        let marker = PAGER_MARKER.as_bytes();
        if let Some(at) = self.bytes.windows(marker.len()).rposition(|w| w == marker) {
            self.bytes.truncate(at);
        }
        true
    }

    /// Decodes everything received.
    pub(super) fn into_text(self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}

/// Returns true once the echo of `command` was received and a prompt follows it.
pub(super) fn synced_to_prompt(buffer: &ReadBuffer, command: &str, prompt: &Regex) -> bool {
    buffer.contains(command) && prompt.is_match(&buffer.last_line())
}

fn awaits_secret_or_prompt(buffer: &ReadBuffer, prompt: &Regex) -> bool {
    let tail = buffer.last_line();
    tail.to_ascii_lowercase().contains(PASSWORD_PROMPT) || prompt.is_match(&tail)
}

/// Normalizes raw shell output for parsing.
///
/// Drops carriage returns and backspaces (left over from pager redraws),
/// the echoed command line, and a trailing prompt line.
///
/// ```
/// use argus_topo::shell::{clean_output, DEFAULT_PROMPT_PATTERN};
/// use regex::Regex;
///
/// let prompt = Regex::new(DEFAULT_PROMPT_PATTERN).unwrap();
/// let raw = "show clock\r\n*10:00:00.000 UTC Mon Jan 1 2024\r\nSW1#";
/// assert_eq!(clean_output(raw, "show clock", &prompt), "*10:00:00.000 UTC Mon Jan 1 2024");
/// ```
#[must_use]
pub fn clean_output(raw: &str, command: &str, prompt: &Regex) -> String {
    let normalized: String = raw.chars().filter(|c| *c != '\r' && *c != '\u{8}').collect();
    let mut lines: Vec<&str> = normalized.lines().collect();

    if lines
        .first()
        .is_some_and(|first| !command.is_empty() && first.trim_end().ends_with(command.trim()))
    {
        lines.remove(0);
    }

    if lines.last().is_some_and(|last| prompt.is_match(last)) {
        lines.pop();
    }

    lines.join("\n").trim_end().to_string()
}
