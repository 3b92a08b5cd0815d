//! Topology change detection types and functions.

use std::collections::BTreeSet;
use std::fmt;

use crate::topology::{DeviceAddress, NeighborLink, TopologySnapshot};

/// One reason a discovery cycle counts as a topology change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeReason {
    /// There was no previous snapshot to compare against.
    NoBaseline,
    /// A device name appeared that the previous snapshot did not have.
    DeviceAdded {
        /// Short name of the new device.
        device: String,
    },
    /// A device present in both snapshots reports a different link set.
    LinksChanged {
        /// Short name of the device.
        device: String,
        /// Links present now but not before.
        added: Vec<NeighborLink>,
        /// Links present before but not now.
        removed: Vec<NeighborLink>,
    },
    /// A known device is missing because its address failed this cycle.
    DeviceUnreachable {
        /// Short name of the device.
        device: String,
        /// Address the device was last reached on.
        address: DeviceAddress,
    },
    /// A known device is missing although its address did not fail.
    ///
    /// Typically the address now answers with another hostname, or was
    /// dropped from the configured list.
    DeviceRemoved {
        /// Short name of the device.
        device: String,
    },
    /// An address failed this cycle that had not failed the cycle before.
    AddressDown {
        /// The failing address.
        address: DeviceAddress,
    },
    /// An address that failed last cycle produced a device again.
    AddressRecovered {
        /// The recovered address.
        address: DeviceAddress,
    },
    /// Every attempted address failed.
    TotalOutage,
}

impl ChangeReason {
    /// Returns a short machine-friendly label for structured logging.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::NoBaseline => "no_baseline",
            Self::DeviceAdded { .. } => "device_added",
            Self::LinksChanged { .. } => "links_changed",
            Self::DeviceUnreachable { .. } => "device_unreachable",
            Self::DeviceRemoved { .. } => "device_removed",
            Self::AddressDown { .. } => "address_down",
            Self::AddressRecovered { .. } => "address_recovered",
            Self::TotalOutage => "total_outage",
        }
    }
}

impl fmt::Display for ChangeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoBaseline => write!(f, "no previous topology to compare with"),
            Self::DeviceAdded { device } => write!(f, "new device {device}"),
            Self::LinksChanged {
                device,
                added,
                removed,
            } => {
                write!(f, "links of {device} changed")?;
                for link in added {
                    write!(f, "; +{link}")?;
                }
                for link in removed {
                    write!(f, "; -{link}")?;
                }
                Ok(())
            }
            Self::DeviceUnreachable { device, address } => {
                write!(f, "device {device} ({address}) is unreachable")
            }
            Self::DeviceRemoved { device } => write!(f, "device {device} disappeared"),
            Self::AddressDown { address } => write!(f, "address {address} stopped responding"),
            Self::AddressRecovered { address } => write!(f, "address {address} is reachable again"),
            Self::TotalOutage => write!(f, "no configured device is reachable"),
        }
    }
}

/// Outcome of comparing the current snapshot with the previous one.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChangeVerdict {
    /// Whether the cycle counts as a change worth exporting.
    pub changed: bool,
    /// Why, in evaluation order. Empty when unchanged.
    pub reasons: Vec<ChangeReason>,
}

impl ChangeVerdict {
    fn from_reasons(reasons: Vec<ChangeReason>) -> Self {
        Self {
            changed: !reasons.is_empty(),
            reasons,
        }
    }

    /// Returns true if the verdict includes a total outage.
    #[must_use]
    pub fn is_total_outage(&self) -> bool {
        self.reasons.contains(&ChangeReason::TotalOutage)
    }
}

/// Compares the current snapshot against the last known one.
///
/// This is a pure function; timestamps are ignored. Rules, in order:
///
/// 1. No `last` snapshot is a change.
/// 2. Device names present now but not before are changes.
/// 3. For devices in both, the neighbor links are compared as unordered
///    sets of `(name, local, remote)` triples.
/// 4. Devices that vanished are reported as unreachable when their last
///    address failed this cycle, as removed otherwise.
/// 5. Addresses that started or stopped failing are changes.
///
/// A total outage is always reported, even if the previous cycle was one
/// too.
#[must_use]
pub fn compare(current: &TopologySnapshot, last: Option<&TopologySnapshot>) -> ChangeVerdict {
    let mut reasons = Vec::new();

    match last {
        None => reasons.push(ChangeReason::NoBaseline),
        Some(last) => {
            diff_devices(&mut reasons, current, last);
            diff_connectivity(&mut reasons, current, last);
        }
    }

    if current.is_total_outage() {
        reasons.push(ChangeReason::TotalOutage);
    }

    ChangeVerdict::from_reasons(reasons)
}

/// Applies the device and link rules.
fn diff_devices(
    reasons: &mut Vec<ChangeReason>,
    current: &TopologySnapshot,
    last: &TopologySnapshot,
) {
    for (name, device) in &current.devices {
        let Some(previous) = last.devices.get(name) else {
            reasons.push(ChangeReason::DeviceAdded {
                device: name.clone(),
            });
            continue;
        };

        let now: BTreeSet<&NeighborLink> = device.neighbors.iter().collect();
        let before: BTreeSet<&NeighborLink> = previous.neighbors.iter().collect();
        if now != before {
            reasons.push(ChangeReason::LinksChanged {
                device: name.clone(),
                added: now.difference(&before).map(|l| (*l).clone()).collect(),
                removed: before.difference(&now).map(|l| (*l).clone()).collect(),
            });
        }
    }

    for (name, previous) in &last.devices {
        if current.devices.contains_key(name) {
            continue;
        }
        if current.failed_addresses.contains(&previous.address) {
            reasons.push(ChangeReason::DeviceUnreachable {
                device: name.clone(),
                address: previous.address.clone(),
            });
        } else {
            reasons.push(ChangeReason::DeviceRemoved {
                device: name.clone(),
            });
        }
    }
}

/// Applies the connectivity-transition rule.
///
/// Addresses already explained by [`ChangeReason::DeviceUnreachable`] are
/// not reported a second time.
fn diff_connectivity(
    reasons: &mut Vec<ChangeReason>,
    current: &TopologySnapshot,
    last: &TopologySnapshot,
) {
    let explained: BTreeSet<&DeviceAddress> = reasons
        .iter()
        .filter_map(|r| match r {
            ChangeReason::DeviceUnreachable { address, .. } => Some(address),
            _ => None,
        })
        .collect();

    let down: Vec<ChangeReason> = current
        .failed_addresses
        .iter()
        .filter(|a| !last.failed_addresses.contains(*a) && !explained.contains(a))
        .map(|a| ChangeReason::AddressDown { address: a.clone() })
        .collect();

    let reachable = current.reachable_addresses();
    let recovered = last
        .failed_addresses
        .iter()
        .filter(|a| reachable.contains(a))
        .map(|a| ChangeReason::AddressRecovered { address: a.clone() });

    reasons.extend(down);
    reasons.extend(recovered);
}

#[cfg(test)]
#[path = "change_tests.rs"]
mod tests;
