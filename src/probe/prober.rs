//! Per-address discovery: ping, log in, detect, collect.

use std::time::Duration;

use regex::Regex;

use super::platform::{NeighborSource, ProbeSet, detect, extract_hostname};
use super::{DeviceProbe, ProbeError, Reachability};
use crate::parser::{self, OutputKind};
use crate::shell::{Connector, Credentials, Session, ShellError};
use crate::topology::{
    DeviceAddress, DeviceRecord, NeighborLink, Protocol, UNKNOWN_HOSTNAME, short_name,
};

/// Model recorded when the detection output does not name one.
const UNKNOWN_MODEL: &str = "Unknown";

/// Session timing shared by every device.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Deadline for connecting and logging in.
    pub connect_timeout: Duration,
    /// Deadline for each command's output.
    pub command_timeout: Duration,
    /// Pattern recognizing the device prompt.
    pub prompt: Regex,
}

/// Production [`DeviceProbe`]: reachability check, then an interactive
/// session used for detection, hostname and neighbor collection.
///
/// The session is closed before [`DeviceProbe::probe`] returns, whatever
/// the outcome.
///
/// # Type Parameters
///
/// - `R`: reachability check (usually [`super::PingProber`])
/// - `C`: session connector (usually [`crate::shell::SshConnector`])
#[derive(Debug)]
pub struct DeviceProber<R, C> {
    reachability: R,
    connector: C,
    credentials: Credentials,
    probes: ProbeSet,
    settings: SessionSettings,
}

impl<R, C> DeviceProber<R, C>
where
    R: Reachability,
    C: Connector,
{
    /// Creates a prober.
    #[must_use]
    pub const fn new(
        reachability: R,
        connector: C,
        credentials: Credentials,
        probes: ProbeSet,
        settings: SessionSettings,
    ) -> Self {
        Self {
            reachability,
            connector,
            credentials,
            probes,
            settings,
        }
    }

    /// Returns the connector.
    #[must_use]
    pub const fn connector(&self) -> &C {
        &self.connector
    }

    async fn interrogate(
        &self,
        session: &mut C::Session,
        address: &DeviceAddress,
    ) -> Result<DeviceRecord, ProbeError> {
        let prompt = &self.settings.prompt;
        let timeout = self.settings.command_timeout;

        if let Some(secret) = self.credentials.secret.as_deref() {
            session.enter_privileged(secret, prompt, timeout).await?;
        }

        let detection = detect(session, &self.probes, prompt, timeout)
            .await
            .ok_or(ProbeError::Undetected)?;
        let descriptor = detection.probe.descriptor;
        tracing::debug!(%address, platform = %detection.probe.platform, "Platform detected");

        let hostname = if descriptor.hostname_command == descriptor.command {
            extract_hostname(&detection.output)
        } else {
            match session.run(descriptor.hostname_command, prompt, timeout).await {
                Ok(output) => extract_hostname(&output),
                Err(e) if e.is_timeout() => return Err(e.into()),
                Err(e) => {
                    tracing::debug!(%address, error = %e, "Hostname command failed");
                    None
                }
            }
        };
        let name = hostname
            .map(|h| short_name(&h))
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| UNKNOWN_HOSTNAME.to_string());

        let (protocol, neighbors) =
            collect_neighbors(session, descriptor.neighbor_sources, prompt, timeout).await?;

        Ok(DeviceRecord {
            short_name: name,
            address: address.clone(),
            device_type: descriptor.device_type,
            vendor: descriptor.vendor.to_string(),
            model: detection
                .model
                .unwrap_or_else(|| UNKNOWN_MODEL.to_string()),
            protocol,
            neighbors,
        })
    }
}

impl<R, C> DeviceProbe for DeviceProber<R, C>
where
    R: Reachability,
    C: Connector,
{
    async fn probe(&self, address: &DeviceAddress) -> Result<DeviceRecord, ProbeError> {
        if !self.reachability.is_reachable(address).await {
            return Err(ProbeError::Unreachable);
        }

        let mut session = self
            .connector
            .open_session(address, &self.credentials, self.settings.connect_timeout)
            .await?;

        let result = self.interrogate(&mut session, address).await;
        session.close().await;
        result
    }
}

/// Runs the neighbor sources in order and returns the first non-empty table.
///
/// A source is skipped when the device rejects it or reports the protocol
/// disabled. Empty primary output falls back to the source's alternate
/// command. A source that runs but finds no neighbors does not stop the
/// search; its protocol is reported only if no later source finds any.
/// When no source is usable the protocol is [`Protocol::None`].
///
/// # Errors
///
/// Only timeouts are returned; other command failures skip the source.
pub async fn collect_neighbors<S: Session>(
    session: &mut S,
    sources: &[NeighborSource],
    prompt: &Regex,
    timeout: Duration,
) -> Result<(Protocol, Vec<NeighborLink>), ProbeError> {
    let mut empty_protocol = None;

    for source in sources {
        match read_source(session, source, prompt, timeout).await? {
            Some(links) if !links.is_empty() => return Ok((source.protocol, links)),
            Some(_) => {
                tracing::debug!(protocol = %source.protocol, "No neighbors, trying next source");
                empty_protocol.get_or_insert(source.protocol);
            }
            None => {}
        }
    }

    Ok((empty_protocol.unwrap_or(Protocol::None), Vec::new()))
}

/// Reads one neighbor source. `None` means the source is not usable.
async fn read_source<S: Session>(
    session: &mut S,
    source: &NeighborSource,
    prompt: &Regex,
    timeout: Duration,
) -> Result<Option<Vec<NeighborLink>>, ProbeError> {
    let Some(primary) = run_optional(session, source.command, prompt, timeout).await? else {
        return Ok(None);
    };

    let links = match parser::classify(&primary) {
        OutputKind::Unsupported => return Ok(None),
        OutputKind::Data => parser::parse(&primary, source.grammar),
        OutputKind::Empty => Vec::new(),
    };
    if !links.is_empty() {
        return Ok(Some(links));
    }

    let Some((command, grammar)) = source.alternate else {
        return Ok(Some(links));
    };
    let Some(detail) = run_optional(session, command, prompt, timeout).await? else {
        return Ok(Some(links));
    };
    let links = match parser::classify(&detail) {
        OutputKind::Data => parser::parse(&detail, grammar),
        OutputKind::Unsupported | OutputKind::Empty => links,
    };
    Ok(Some(links))
}

/// Runs a command, mapping non-timeout failures to `None`.
async fn run_optional<S: Session>(
    session: &mut S,
    command: &str,
    prompt: &Regex,
    timeout: Duration,
) -> Result<Option<String>, ProbeError> {
    match session.run(command, prompt, timeout).await {
        Ok(output) => Ok(Some(output)),
        Err(e @ ShellError::Timeout { .. }) => Err(ProbeError::Timeout(e)),
        Err(e) => {
            tracing::debug!(command, error = %e, "Neighbor command failed");
            Ok(None)
        }
    }
}
