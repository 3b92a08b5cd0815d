//! Device probing: reachability, platform detection, and per-device
//! interrogation.
//!
//! This module provides types and traits for:
//! - Network-layer reachability ([`Reachability`], [`PingProber`])
//! - Known platforms and their detection probes ([`Platform`],
//!   [`ProbeDescriptor`], [`ProbeSet`], [`detect`])
//! - Turning one address into a device record ([`DeviceProbe`],
//!   [`DeviceProber`])

mod error;
mod platform;
mod prober;
mod reachability;

#[cfg(test)]
#[path = "prober_tests.rs"]
mod prober_tests;

pub use error::ProbeError;
pub use platform::{
    Detection, DetectionProbe, NeighborSource, Platform, ProbeDescriptor, ProbeSet,
    UnknownPlatform, detect, extract_hostname,
};
pub use prober::{DeviceProber, SessionSettings, collect_neighbors};
pub use reachability::{PingProber, Reachability};

use crate::topology::{DeviceAddress, DeviceRecord};

/// Turns one configured address into a device record.
///
/// The topology builder runs one probe per address, possibly concurrently;
/// implementations must not share mutable state between calls.
pub trait DeviceProbe: Send + Sync {
    /// Probes `address`.
    ///
    /// # Errors
    ///
    /// Returns a [`ProbeError`] describing the terminal failure state.
    fn probe(
        &self,
        address: &DeviceAddress,
    ) -> impl std::future::Future<Output = Result<DeviceRecord, ProbeError>> + Send;
}
