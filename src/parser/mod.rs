//! Neighbor-discovery output parsing.
//!
//! This module turns the free text printed by `show lldp neighbors` /
//! `show cdp neighbors` style commands into [`NeighborLink`] lists:
//! - Brief, one-line-per-neighbor listings ([`Grammar::Tabular`])
//! - Detail listings made of per-neighbor blocks ([`Grammar::CdpDetail`],
//!   [`Grammar::LldpDetail`])
//! - Classification of raw output before parsing ([`classify`])
//!
//! Parsing is pure and never fails: lines or records that cannot be
//! understood are dropped, the rest is kept.

mod block;
mod tabular;


use std::fmt;

use crate::topology::NeighborLink;

use block::BlockMarkers;

/// Output markers meaning the command or protocol is not available.
const UNSUPPORTED_MARKERS: &[&str] = &[
    "invalid input",
    "is not enabled",
    "not enabled",
    "unknown command",
    "command fail",
    "incomplete command",
];

/// Output markers meaning the protocol runs but has no neighbors.
const EMPTY_MARKERS: &[&str] = &[
    "no lldp neighbors",
    "no cdp neighbors",
    "total entries displayed: 0",
    "total cdp entries displayed : 0",
];

/// Source grammar of a neighbor listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Grammar {
    /// Brief listing, one neighbor per line.
    Tabular,
    /// CDP detail listing, records start at `Device ID:`.
    CdpDetail,
    /// LLDP detail listing, records keyed by `System Name:`.
    LldpDetail,
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tabular => write!(f, "tabular"),
            Self::CdpDetail => write!(f, "cdp-detail"),
            Self::LldpDetail => write!(f, "lldp-detail"),
        }
    }
}

/// What a raw neighbor command response amounts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    /// The device rejected the command or the protocol is disabled.
    Unsupported,
    /// The protocol runs but reports nothing (blank or explicit marker).
    Empty,
    /// Something worth parsing.
    Data,
}

/// Parses raw command output into neighbor links using `grammar`.
///
/// Links are returned in document order. Neighbor names are domain-stripped
/// and capability-legend noise is removed.
#[must_use]
pub fn parse(raw: &str, grammar: Grammar) -> Vec<NeighborLink> {
    match grammar {
        Grammar::Tabular => tabular::parse(raw),
        Grammar::CdpDetail => block::parse(raw, &BlockMarkers::CDP),
        Grammar::LldpDetail => block::parse(raw, &BlockMarkers::LLDP),
    }
}

/// Classifies a raw neighbor command response.
///
/// Unsupported markers win over empty markers: a device that says
/// "LLDP is not enabled" has no neighbors, but the caller should try
/// another protocol rather than conclude the device is isolated.
#[must_use]
pub fn classify(raw: &str) -> OutputKind {
    let lowered = raw.to_ascii_lowercase();

    if UNSUPPORTED_MARKERS.iter().any(|m| lowered.contains(m)) {
        return OutputKind::Unsupported;
    }

    if lowered.trim().is_empty() || EMPTY_MARKERS.iter().any(|m| lowered.contains(m)) {
        return OutputKind::Empty;
    }

    OutputKind::Data
}
