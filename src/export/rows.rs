//! Flattened link rows and device role classification.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Serialize;

use crate::topology::TopologySnapshot;

/// One neighbor link flattened together with its owning device.
///
/// This is the row shape every export format consumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopologyRow {
    /// Owning device short name.
    pub device: String,
    /// Owning device address.
    pub ip: String,
    /// Adjacent device short name.
    pub neighbor: String,
    /// Interface on the owning device.
    pub local_interface: String,
    /// Interface on the adjacent device.
    pub remote_interface: String,
    /// Protocol the link was learned from.
    pub protocol: String,
}

/// Flattens a snapshot into rows, devices by name, links in reported order.
#[must_use]
pub fn rows(snapshot: &TopologySnapshot) -> Vec<TopologyRow> {
    snapshot
        .devices
        .values()
        .flat_map(|device| {
            device.neighbors.iter().map(|link| TopologyRow {
                device: device.short_name.clone(),
                ip: device.address.to_string(),
                neighbor: link.neighbor.clone(),
                local_interface: link.local_interface.clone(),
                remote_interface: link.remote_interface.clone(),
                protocol: device.protocol.to_string(),
            })
        })
        .collect()
}

/// Layout role of a device in the rendered graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Role {
    /// Adjacent to more than one distinct device.
    Distribution,
    /// Adjacent to at most one distinct device.
    Access,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Distribution => write!(f, "distribution"),
            Self::Access => write!(f, "access"),
        }
    }
}

/// Classifies every device name appearing in `rows` by degree.
///
/// Adjacency counts in both directions, so a neighbor that was never
/// probed itself is still classified. Parallel links to the same device
/// count once.
#[must_use]
pub fn classify_roles(rows: &[TopologyRow]) -> BTreeMap<String, Role> {
    let mut adjacency: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for row in rows {
        adjacency
            .entry(row.device.as_str())
            .or_default()
            .insert(row.neighbor.as_str());
        adjacency
            .entry(row.neighbor.as_str())
            .or_default()
            .insert(row.device.as_str());
    }

    adjacency
        .into_iter()
        .map(|(name, peers)| {
            let role = if peers.len() > 1 {
                Role::Distribution
            } else {
                Role::Access
            };
            (name.to_string(), role)
        })
        .collect()
}

/// Groups the neighbor names of each device, for the console summary.
#[must_use]
pub fn connections(rows: &[TopologyRow]) -> BTreeMap<&str, BTreeSet<&str>> {
    let mut map: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for row in rows {
        map.entry(row.device.as_str())
            .or_default()
            .insert(row.neighbor.as_str());
    }
    map
}
