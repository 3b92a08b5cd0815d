//! Point-in-time topology capture.

use std::collections::{BTreeMap, BTreeSet};

use super::{DeviceAddress, DeviceRecord};

/// One discovery pass worth of topology.
///
/// Built in memory by the topology builder, then persisted and compared.
/// Never edited in place after construction; the next cycle produces a new
/// snapshot instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopologySnapshot {
    /// Sortable timestamp, unique per run (see [`crate::time::snapshot_timestamp`]).
    pub timestamp: String,
    /// Probed devices keyed by short name.
    pub devices: BTreeMap<String, DeviceRecord>,
    /// Addresses that produced no device record this cycle.
    pub failed_addresses: BTreeSet<DeviceAddress>,
}

impl TopologySnapshot {
    /// Creates an empty snapshot with the given timestamp.
    #[must_use]
    pub fn new(timestamp: impl Into<String>) -> Self {
        Self {
            timestamp: timestamp.into(),
            devices: BTreeMap::new(),
            failed_addresses: BTreeSet::new(),
        }
    }

    /// Adds a device record, keyed by its short name.
    ///
    /// Returns the rejected record if the name is already taken.
    ///
    /// # Errors
    ///
    /// Returns `Err(record)` when another device already owns the name.
    pub fn insert_device(&mut self, record: DeviceRecord) -> Result<(), DeviceRecord> {
        if self.devices.contains_key(&record.short_name) {
            return Err(record);
        }
        self.devices.insert(record.short_name.clone(), record);
        Ok(())
    }

    /// Marks an address as failed for this cycle.
    pub fn insert_failed(&mut self, address: DeviceAddress) {
        self.failed_addresses.insert(address);
    }

    /// Returns the addresses of every probed device.
    #[must_use]
    pub fn reachable_addresses(&self) -> BTreeSet<&DeviceAddress> {
        self.devices.values().map(|d| &d.address).collect()
    }

    /// Returns the total number of neighbor links across all devices.
    #[must_use]
    pub fn link_count(&self) -> usize {
        self.devices.values().map(|d| d.neighbors.len()).sum()
    }

    /// Returns true if no address produced a device but some were attempted.
    #[must_use]
    pub fn is_total_outage(&self) -> bool {
        self.devices.is_empty() && !self.failed_addresses.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::{DeviceType, NeighborLink, Protocol};

    fn record(name: &str, ip: &str) -> DeviceRecord {
        DeviceRecord {
            short_name: name.to_string(),
            address: DeviceAddress::new(ip),
            device_type: DeviceType::Ios,
            vendor: "Cisco".to_string(),
            model: "Unknown".to_string(),
            protocol: Protocol::Lldp,
            neighbors: vec![NeighborLink::new("SW9", "Gi0/1", "Gi0/2")],
        }
    }

    #[test]
    fn insert_device_rejects_duplicate_names() {
        let mut snapshot = TopologySnapshot::new("20240101_000000");
        snapshot.insert_device(record("SW1", "10.0.0.1")).unwrap();

        let rejected = snapshot.insert_device(record("SW1", "10.0.0.2")).unwrap_err();

        assert_eq!(rejected.address.as_str(), "10.0.0.2");
        assert_eq!(snapshot.devices["SW1"].address.as_str(), "10.0.0.1");
    }

    #[test]
    fn reachable_addresses_come_from_devices() {
        let mut snapshot = TopologySnapshot::new("t");
        snapshot.insert_device(record("SW1", "10.0.0.1")).unwrap();
        snapshot.insert_failed(DeviceAddress::new("10.0.0.2"));

        let reachable = snapshot.reachable_addresses();
        assert_eq!(reachable.len(), 1);
        assert!(reachable.contains(&DeviceAddress::new("10.0.0.1")));
    }

    #[test]
    fn total_outage_requires_attempted_addresses() {
        let empty = TopologySnapshot::new("t");
        assert!(!empty.is_total_outage());

        let mut all_failed = TopologySnapshot::new("t");
        all_failed.insert_failed(DeviceAddress::new("10.0.0.1"));
        assert!(all_failed.is_total_outage());
    }

    #[test]
    fn link_count_sums_neighbors() {
        let mut snapshot = TopologySnapshot::new("t");
        snapshot.insert_device(record("SW1", "10.0.0.1")).unwrap();
        snapshot.insert_device(record("SW2", "10.0.0.2")).unwrap();
        assert_eq!(snapshot.link_count(), 2);
    }
}
