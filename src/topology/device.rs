//! Core topology types for device and link representation.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Role words that show up in the name column of capability legends.
///
/// A "neighbor" whose normalized name equals one of these is parser noise.
const CAPABILITY_KEYWORDS: &[&str] = &[
    "Router",
    "Bridge",
    "Telephone",
    "WLAN",
    "Repeater",
    "Station",
];

/// Sentinel used when a device's hostname cannot be determined.
pub const UNKNOWN_HOSTNAME: &str = "Unknown";

/// An opaque host identifier (IP address or hostname).
///
/// Supplied by configuration and never interpreted beyond being handed to
/// the reachability prober and the remote shell connector.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceAddress(String);

impl DeviceAddress {
    /// Creates a new address from any string-like value.
    #[must_use]
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    /// Returns the address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DeviceAddress {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Platform classification of a probed device.
///
/// Serialized with the connection-driver names that downstream tooling
/// already reads from snapshot files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DeviceType {
    /// Cisco IOS / IOS XE.
    Ios,
    /// Cisco NX-OS.
    Nxos,
    /// Cisco IOS XR.
    Xr,
    /// Fortinet `FortiOS`.
    Fortinet,
    /// Not classified.
    #[default]
    Unknown,
}

impl DeviceType {
    /// Returns the wire name used in snapshot files.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ios => "cisco_ios",
            Self::Nxos => "cisco_nxos",
            Self::Xr => "cisco_xr",
            Self::Fortinet => "fortinet",
            Self::Unknown => "unknown",
        }
    }
}

impl From<String> for DeviceType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "cisco_ios" => Self::Ios,
            "cisco_nxos" => Self::Nxos,
            "cisco_xr" => Self::Xr,
            "fortinet" => Self::Fortinet,
            _ => Self::Unknown,
        }
    }
}

impl From<DeviceType> for String {
    fn from(value: DeviceType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Neighbor-discovery protocol the neighbor data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Protocol {
    /// Link Layer Discovery Protocol.
    Lldp,
    /// Cisco Discovery Protocol.
    Cdp,
    /// No usable neighbor-discovery protocol on the device.
    #[default]
    None,
}

impl Protocol {
    /// Returns the wire name used in snapshot files.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lldp => "LLDP",
            Self::Cdp => "CDP",
            Self::None => "None",
        }
    }
}

impl From<String> for Protocol {
    fn from(value: String) -> Self {
        match value.to_ascii_uppercase().as_str() {
            "LLDP" => Self::Lldp,
            "CDP" => Self::Cdp,
            _ => Self::None,
        }
    }
}

impl From<Protocol> for String {
    fn from(value: Protocol) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One adjacency as seen from the owning device.
///
/// Value type: two links are the same link when all three fields match.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NeighborLink {
    /// Domain-stripped name of the adjacent device.
    #[serde(rename = "name")]
    pub neighbor: String,
    /// Interface on the owning device.
    pub local_interface: String,
    /// Interface (port id) on the adjacent device.
    pub remote_interface: String,
}

impl NeighborLink {
    /// Creates a new link. The neighbor name is normalized.
    #[must_use]
    pub fn new(
        neighbor: &str,
        local_interface: impl Into<String>,
        remote_interface: impl Into<String>,
    ) -> Self {
        Self {
            neighbor: short_name(neighbor),
            local_interface: local_interface.into(),
            remote_interface: remote_interface.into(),
        }
    }
}

impl fmt::Display for NeighborLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} -> {})",
            self.neighbor, self.local_interface, self.remote_interface
        )
    }
}

/// A successfully probed device.
///
/// Built once by the device prober and owned by the snapshot that holds it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceRecord {
    /// Hostname with any domain suffix removed.
    pub short_name: String,
    /// Address the device was reached on.
    pub address: DeviceAddress,
    /// Detected platform.
    pub device_type: DeviceType,
    /// Vendor label from the matching detection probe.
    pub vendor: String,
    /// Model string extracted from the detection output.
    pub model: String,
    /// Protocol the neighbor list came from.
    pub protocol: Protocol,
    /// Adjacencies in the order the device reported them.
    pub neighbors: Vec<NeighborLink>,
}

impl DeviceRecord {
    /// Returns the number of distinct neighbor names.
    #[must_use]
    pub fn distinct_neighbor_count(&self) -> usize {
        let mut names: Vec<&str> = self.neighbors.iter().map(|n| n.neighbor.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        names.len()
    }
}

/// Normalizes a device name to its short form.
///
/// Keeps the first whitespace-separated token, drops everything from the
/// first `.` (domain suffix) and any trailing `(serial)` annotation that
/// NX-OS appends to CDP device ids.
///
/// ```
/// use argus_topo::topology::short_name;
///
/// assert_eq!(short_name("SW2.domain.local"), "SW2");
/// assert_eq!(short_name("N9K-1(FDO21120U8B)"), "N9K-1");
/// ```
#[must_use]
pub fn short_name(name: &str) -> String {
    let token = name.split_whitespace().next().unwrap_or_default();
    let token = token.split('.').next().unwrap_or_default();
    let token = token.split('(').next().unwrap_or_default();
    token.to_string()
}

/// Returns true if `name` is a capability-role keyword rather than a device.
#[must_use]
pub fn is_capability_keyword(name: &str) -> bool {
    CAPABILITY_KEYWORDS
        .iter()
        .any(|keyword| keyword.eq_ignore_ascii_case(name))
}
