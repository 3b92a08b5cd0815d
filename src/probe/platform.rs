//! Known device platforms and device-type detection.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use regex::Regex;

use crate::parser::Grammar;
use crate::shell::Session;
use crate::topology::{DeviceType, Protocol};

/// Where a platform publishes its neighbor table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NeighborSource {
    /// Protocol recorded on the device when this source is used.
    pub protocol: Protocol,
    /// Primary (usually brief) command.
    pub command: &'static str,
    /// Grammar of the primary command's output.
    pub grammar: Grammar,
    /// Detail command and grammar tried when the primary output is empty.
    pub alternate: Option<(&'static str, Grammar)>,
}

const CISCO_LLDP: NeighborSource = NeighborSource {
    protocol: Protocol::Lldp,
    command: "show lldp neighbors",
    grammar: Grammar::Tabular,
    alternate: Some(("show lldp neighbors detail", Grammar::LldpDetail)),
};

// The brief CDP listing truncates device ids and abbreviates interfaces,
// so the detail listing is read directly.
const CISCO_CDP: NeighborSource = NeighborSource {
    protocol: Protocol::Cdp,
    command: "show cdp neighbors detail",
    grammar: Grammar::CdpDetail,
    alternate: None,
};

const CISCO_SOURCES: &[NeighborSource] = &[CISCO_LLDP, CISCO_CDP];

/// Fixed description of how to recognize and interrogate one platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeDescriptor {
    /// Command whose output identifies the platform.
    pub command: &'static str,
    /// Pattern the identifying output must match.
    pub device_pattern: &'static str,
    /// Vendor label recorded on the device.
    pub vendor: &'static str,
    /// Device type recorded on the device.
    pub device_type: DeviceType,
    /// Pattern capturing the model (group 1) in the identifying output.
    pub model_pattern: &'static str,
    /// Command printing the configured hostname.
    pub hostname_command: &'static str,
    /// Neighbor sources in preference order.
    pub neighbor_sources: &'static [NeighborSource],
}

/// A supported device platform.
///
/// [`Platform::DEFAULT_ORDER`] lists the more specific Cisco variants before
/// classic IOS, whose version banner pattern would also match them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    /// Cisco IOS XR.
    IosXr,
    /// Cisco NX-OS.
    Nxos,
    /// Cisco IOS / IOS XE.
    Ios,
    /// Fortinet `FortiOS`.
    Fortinet,
}

impl Platform {
    /// Detection order used when none is configured.
    pub const DEFAULT_ORDER: [Self; 4] = [Self::IosXr, Self::Nxos, Self::Ios, Self::Fortinet];

    /// Returns the configuration name of the platform.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::IosXr => "ios_xr",
            Self::Nxos => "nxos",
            Self::Ios => "ios",
            Self::Fortinet => "fortinet",
        }
    }

    /// Returns the detection descriptor for the platform.
    #[must_use]
    pub const fn descriptor(self) -> ProbeDescriptor {
        match self {
            Self::IosXr => ProbeDescriptor {
                command: "show version",
                device_pattern: r"IOS XR|IOS-XR",
                vendor: "Cisco",
                device_type: DeviceType::Xr,
                model_pattern: r"(?m)^cisco\s+(\S+)(?:\s+Series)?\s+\(",
                hostname_command: "show running-config hostname",
                neighbor_sources: CISCO_SOURCES,
            },
            Self::Nxos => ProbeDescriptor {
                command: "show version",
                device_pattern: r"NX-OS|Nexus Operating System",
                vendor: "Cisco",
                device_type: DeviceType::Nxos,
                model_pattern: r"(?m)^\s*cisco\s+(.+?)\s+[Cc]hassis",
                hostname_command: "show running-config | include hostname",
                neighbor_sources: CISCO_SOURCES,
            },
            Self::Ios => ProbeDescriptor {
                command: "show version",
                device_pattern: r"Cisco.*Software.*Version",
                vendor: "Cisco",
                device_type: DeviceType::Ios,
                model_pattern: r"(?m)^cisco\s+(\S+)\s+\(",
                hostname_command: "show running-config | include hostname",
                neighbor_sources: CISCO_SOURCES,
            },
            // TODO: parse `diagnose lldprx neighbor summary`; its column
            // layout puts the local port first, unlike the Cisco listings.
            Self::Fortinet => ProbeDescriptor {
                command: "get system status",
                device_pattern: r"Forti(?:Gate|OS|Switch|Wifi)",
                vendor: "Fortinet",
                device_type: DeviceType::Fortinet,
                model_pattern: r"(?m)^Version:\s*(\S+)",
                hostname_command: "get system status",
                neighbor_sources: &[],
            },
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a platform name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown platform '{0}' (expected one of: ios_xr, nxos, ios, fortinet)")]
pub struct UnknownPlatform(pub String);

impl FromStr for Platform {
    type Err = UnknownPlatform;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "ios_xr" | "xr" => Ok(Self::IosXr),
            "nxos" | "nx_os" => Ok(Self::Nxos),
            "ios" | "ios_xe" => Ok(Self::Ios),
            "fortinet" | "fortios" => Ok(Self::Fortinet),
            _ => Err(UnknownPlatform(s.to_string())),
        }
    }
}

/// A descriptor with its patterns compiled.
#[derive(Debug, Clone)]
pub struct DetectionProbe {
    /// Platform the probe identifies.
    pub platform: Platform,
    /// Static description.
    pub descriptor: ProbeDescriptor,
    device_pattern: Regex,
    model_pattern: Regex,
}

impl DetectionProbe {
    /// Compiles the descriptor of `platform`.
    ///
    /// # Errors
    ///
    /// Returns an error if a descriptor pattern does not compile.
    pub fn new(platform: Platform) -> Result<Self, regex::Error> {
        let descriptor = platform.descriptor();
        Ok(Self {
            platform,
            descriptor,
            device_pattern: Regex::new(descriptor.device_pattern)?,
            model_pattern: Regex::new(descriptor.model_pattern)?,
        })
    }

    /// Returns true if `output` identifies this platform.
    #[must_use]
    pub fn matches(&self, output: &str) -> bool {
        self.device_pattern.is_match(output)
    }

    /// Extracts the model from identifying output, if present.
    #[must_use]
    pub fn model(&self, output: &str) -> Option<String> {
        self.model_pattern
            .captures(output)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().to_string())
            .filter(|m| !m.is_empty())
    }
}

/// Ordered list of compiled detection probes.
#[derive(Debug, Clone)]
pub struct ProbeSet {
    probes: Vec<DetectionProbe>,
}

impl ProbeSet {
    /// Compiles the probes for `platforms`, keeping their order.
    ///
    /// # Errors
    ///
    /// Returns an error if a descriptor pattern does not compile.
    pub fn new(platforms: &[Platform]) -> Result<Self, regex::Error> {
        let probes = platforms
            .iter()
            .map(|p| DetectionProbe::new(*p))
            .collect::<Result<_, _>>()?;
        Ok(Self { probes })
    }

    /// Returns the probes in detection order.
    #[must_use]
    pub fn probes(&self) -> &[DetectionProbe] {
        &self.probes
    }

    /// Returns the platforms in detection order.
    pub fn platforms(&self) -> impl Iterator<Item = Platform> + '_ {
        self.probes.iter().map(|p| p.platform)
    }
}

/// Outcome of a successful detection.
#[derive(Debug, Clone)]
pub struct Detection<'a> {
    /// The probe that matched.
    pub probe: &'a DetectionProbe,
    /// Model extracted from the identifying output, if any.
    pub model: Option<String>,
    /// Output of the identifying command.
    pub output: String,
}

/// Runs detection probes in order and returns the first match.
///
/// Each distinct command runs at most once per call; probes sharing a
/// command reuse its output. A command that fails is treated as a
/// non-match. Returns `None` when nothing matches.
pub async fn detect<'a, S: Session>(
    session: &mut S,
    probes: &'a ProbeSet,
    prompt: &Regex,
    read_timeout: Duration,
) -> Option<Detection<'a>> {
    let mut outputs: HashMap<&'static str, Option<String>> = HashMap::new();

    for probe in probes.probes() {
        let command = probe.descriptor.command;
        if !outputs.contains_key(command) {
            let output = match session.run(command, prompt, read_timeout).await {
                Ok(output) => Some(output),
                Err(e) => {
                    tracing::debug!(platform = %probe.platform, command, error = %e, "Detection command failed");
                    None
                }
            };
            outputs.insert(command, output);
        }

        let Some(Some(output)) = outputs.get(command) else {
            continue;
        };
        if probe.matches(output) {
            return Some(Detection {
                probe,
                model: probe.model(output),
                output: output.clone(),
            });
        }
    }

    None
}

/// Extracts the configured hostname from command output.
///
/// Accepts `hostname NAME`, `switchname NAME` (older NX-OS),
/// `set hostname "NAME"` and `Hostname: NAME` forms. Returns `None` when no
/// declaration is present.
#[must_use]
pub fn extract_hostname(output: &str) -> Option<String> {
    output.lines().find_map(|line| {
        let line = line.trim();
        let line = strip_word(line, "set").map_or(line, str::trim_start);
        let rest = strip_word(line, "hostname").or_else(|| strip_word(line, "switchname"))?;
        let value = rest.trim_start_matches(|c: char| c == ':' || c.is_whitespace());
        let value = value.trim_matches('"');
        let name = value.split(|c: char| c == '"' || c.is_whitespace()).next()?;
        (!name.is_empty()).then(|| name.to_string())
    })
}

/// Strips a leading keyword (case-insensitive) that must be followed by
/// whitespace or `:`.
fn strip_word<'a>(line: &'a str, word: &str) -> Option<&'a str> {
    let len = word.len();
    if line.len() <= len || !line.is_char_boundary(len) {
        return None;
    }
    let (head, rest) = line.split_at(len);
    let boundary = rest.starts_with(|c: char| c == ':' || c.is_whitespace());
    (head.eq_ignore_ascii_case(word) && boundary).then_some(rest)
}
