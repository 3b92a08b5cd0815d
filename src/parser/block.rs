//! Detail (block-per-neighbor) listing grammar.
//!
//! Each neighbor is described by a group of `Label: value` lines. Field
//! order differs between platforms (IOS LLDP prints the system name last,
//! CDP prints the device id first), so a record is emitted as soon as name,
//! local interface and remote interface are all known.

use crate::topology::{NeighborLink, is_capability_keyword, short_name};

/// Line labels for one detail grammar. Matched case-insensitively as
/// prefixes of trimmed lines.
#[derive(Debug)]
pub(super) struct BlockMarkers {
    name: &'static [&'static str],
    local: &'static [&'static str],
    remote: &'static [&'static str],
}

impl BlockMarkers {
    pub(super) const CDP: Self = Self {
        name: &["Device ID:"],
        local: &["Interface:"],
        remote: &["Port ID (outgoing port):"],
    };

    pub(super) const LLDP: Self = Self {
        name: &["System Name:"],
        local: &[
            "Local Intf:",
            "Local Interface:",
            "Local Port id:",
            "Local Port:",
        ],
        remote: &["Port id:", "Remote Interface:"],
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Name,
    Local,
    Remote,
}

/// Fields collected so far for the record being read.
#[derive(Debug, Default)]
struct Pending {
    name: Option<String>,
    local: Option<String>,
    remote: Option<String>,
}

impl Pending {
    const fn slot(&mut self, field: Field) -> &mut Option<String> {
        match field {
            Field::Name => &mut self.name,
            Field::Local => &mut self.local,
            Field::Remote => &mut self.remote,
        }
    }

    /// Stores a field value. A field that is already set means the previous
    /// record ended without completing, so it is discarded first.
    fn set(&mut self, field: Field, value: &str) {
        let value = value.trim().trim_end_matches(',').trim();
        if value.is_empty() {
            return;
        }
        if self.slot(field).is_some() {
            *self = Self::default();
        }
        *self.slot(field) = Some(value.to_string());
    }

    /// Takes the record out if all three fields are known.
    fn take_complete(&mut self) -> Option<NeighborLink> {
        if self.name.is_none() || self.local.is_none() || self.remote.is_none() {
            return None;
        }
        let done = std::mem::take(self);
        let name = short_name(done.name.as_deref().unwrap_or_default());
        if name.is_empty() || is_capability_keyword(&name) {
            return None;
        }
        Some(NeighborLink::new(
            &name,
            done.local.unwrap_or_default(),
            done.remote.unwrap_or_default(),
        ))
    }
}

pub(super) fn parse(raw: &str, markers: &BlockMarkers) -> Vec<NeighborLink> {
    let mut links = Vec::new();
    let mut pending = Pending::default();

    for line in raw.lines() {
        let line = line.trim();

        if line.starts_with("---") {
            pending = Pending::default();
            continue;
        }

        for (field, value) in fields_in_line(line, markers) {
            pending.set(field, value);
        }

        if let Some(link) = pending.take_complete() {
            links.push(link);
        }
    }

    links
}

/// Extracts the labeled fields on one line.
///
/// Handles the CDP form that puts both interfaces on one line:
/// `Interface: Gi0/1,  Port ID (outgoing port): Gi0/2`.
fn fields_in_line<'a>(line: &'a str, markers: &BlockMarkers) -> Vec<(Field, &'a str)> {
    if let Some(value) = strip_any_prefix(line, markers.name) {
        return vec![(Field::Name, value)];
    }

    if let Some(rest) = strip_any_prefix(line, markers.local) {
        return match split_at_any(rest, markers.remote) {
            Some((local, remote)) => vec![(Field::Local, local), (Field::Remote, remote)],
            None => vec![(Field::Local, rest)],
        };
    }

    if let Some(value) = strip_any_prefix(line, markers.remote) {
        return vec![(Field::Remote, value)];
    }

    Vec::new()
}

fn strip_any_prefix<'a>(line: &'a str, prefixes: &[&str]) -> Option<&'a str> {
    prefixes.iter().find_map(|p| strip_prefix_ignore_case(line, p))
}

fn strip_prefix_ignore_case<'a>(line: &'a str, prefix: &str) -> Option<&'a str> {
    let len = prefix.len();
    if line.len() < len || !line.is_char_boundary(len) {
        return None;
    }
    line[..len]
        .eq_ignore_ascii_case(prefix)
        .then(|| &line[len..])
}

/// Splits `text` around the first occurrence of any marker.
fn split_at_any<'a>(text: &'a str, markers: &[&str]) -> Option<(&'a str, &'a str)> {
    let lowered = text.to_ascii_lowercase();
    markers.iter().find_map(|marker| {
        let at = lowered.find(&marker.to_ascii_lowercase())?;
        Some((&text[..at], &text[at + marker.len()..]))
    })
}
