//! Topology data model and snapshot assembly.
//!
//! This module provides:
//! - Device identity and adjacency types ([`DeviceAddress`], [`DeviceRecord`],
//!   [`NeighborLink`], [`DeviceType`], [`Protocol`])
//! - Name normalization ([`short_name`])
//! - One discovery pass worth of topology ([`TopologySnapshot`])
//! - Concurrent probing of an address list into a snapshot ([`TopologyBuilder`])

mod builder;
mod device;
mod snapshot;


pub use builder::TopologyBuilder;
pub use device::{
    DeviceAddress, DeviceRecord, DeviceType, NeighborLink, Protocol, UNKNOWN_HOSTNAME,
    is_capability_keyword, short_name,
};
pub use snapshot::TopologySnapshot;
