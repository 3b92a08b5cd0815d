//! Brief neighbor listing grammar.
//!
//! ```text
//! Capability codes:
//!     (R) Router, (B) Bridge, (T) Telephone, (C) DOCSIS Cable Device
//!
//! Device ID           Local Intf     Hold-time  Capability      Port ID
//! SW2.domain.local    Gi0/1          120        B               Gi0/2
//!
//! Total entries displayed: 1
//! ```
//!
//! CDP brief listings abbreviate interfaces with a space (`Gig 0/1`), use
//! `X - Name` legend lines, and wrap long device ids onto their own line.

use crate::topology::{NeighborLink, is_capability_keyword, short_name};

/// Lines containing any of these (lowercased) are headers or legends.
const HEADER_MARKERS: &[&str] = &["capability codes", "device id", "device-id"];

/// Minimum number of fields in a neighbor line, device id included.
const MIN_FIELDS: usize = 4;

pub(super) fn parse(raw: &str) -> Vec<NeighborLink> {
    let mut links = Vec::new();
    let mut wrapped_name: Option<String> = None;

    for line in raw.lines() {
        let line = line.trim();
        if is_noise(line) {
            wrapped_name = None;
            continue;
        }

        let tokens: Vec<&str> = line.split_whitespace().collect();

        // Device id printed alone; the rest of the entry follows.
        if let [name] = tokens.as_slice() {
            wrapped_name = Some((*name).to_string());
            continue;
        }

        let name = wrapped_name.take();
        let fields = join_split_interfaces(name.as_deref().into_iter().chain(tokens));

        if let Some(link) = link_from_fields(&fields) {
            links.push(link);
        }
    }

    links
}

/// Returns true for blank lines, headers, legends and footers.
fn is_noise(line: &str) -> bool {
    if line.is_empty() || line.starts_with('(') {
        return true;
    }

    let lowered = line.to_ascii_lowercase();
    if HEADER_MARKERS.iter().any(|m| lowered.contains(m)) {
        return true;
    }
    if lowered.starts_with("total") && lowered.contains("entries") {
        return true;
    }

    // Legend continuation: "S - Switch, H - Host, I - IGMP"
    let mut words = line.split_whitespace();
    words.next().is_some_and(|code| code.len() <= 2) && words.next() == Some("-")
}

/// Rejoins interface names written as `Gig 0/1` into `Gig0/1`.
fn join_split_interfaces<'a>(tokens: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut fields: Vec<String> = Vec::new();

    for token in tokens {
        let joins_previous = fields.len() > 1
            && token.starts_with(|c: char| c.is_ascii_digit())
            && token.contains('/')
            && fields
                .last()
                .is_some_and(|prev| prev.chars().all(|c| c.is_ascii_alphabetic()) && prev.len() > 1);

        match fields.last_mut() {
            Some(prev) if joins_previous => prev.push_str(token),
            _ => fields.push(token.to_string()),
        }
    }

    fields
}

fn link_from_fields(fields: &[String]) -> Option<NeighborLink> {
    if fields.len() < MIN_FIELDS {
        return None;
    }

    let name = short_name(&fields[0]);
    if name.is_empty() || is_capability_keyword(&name) {
        return None;
    }

    let remote = &fields[fields.len() - 1];
    Some(NeighborLink::new(&name, fields[1].as_str(), remote.as_str()))
}
