//! Concurrent per-address probing assembled into one snapshot.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use super::{DeviceAddress, DeviceRecord, TopologySnapshot};
use crate::probe::{DeviceProbe, ProbeError};

/// Runs a [`DeviceProbe`] against every configured address and assembles
/// the results into a [`TopologySnapshot`].
///
/// Probes run concurrently, at most `concurrency` at a time. One address
/// failing (or its task panicking) never affects the others. The snapshot
/// is assembled in configured address order after every probe finished, so
/// its content does not depend on completion order.
#[derive(Debug)]
pub struct TopologyBuilder<P> {
    probe: Arc<P>,
    concurrency: usize,
}

impl<P> TopologyBuilder<P>
where
    P: DeviceProbe + 'static,
{
    /// Creates a builder running at most `concurrency` probes at once.
    ///
    /// A concurrency of zero is treated as one.
    #[must_use]
    pub fn new(probe: P, concurrency: usize) -> Self {
        Self {
            probe: Arc::new(probe),
            concurrency: concurrency.max(1),
        }
    }

    /// Returns the probe.
    #[must_use]
    pub fn probe(&self) -> &P {
        &self.probe
    }

    /// Probes every address and returns the resulting snapshot.
    ///
    /// A device whose short name is already taken by an earlier address (in
    /// configured order) is logged and its address recorded as failed.
    pub async fn build(
        &self,
        addresses: &[DeviceAddress],
        timestamp: impl Into<String>,
    ) -> TopologySnapshot {
        let outcomes = self.probe_all(addresses).await;
        let mut snapshot = TopologySnapshot::new(timestamp);

        for (address, outcome) in addresses.iter().zip(outcomes) {
            match outcome {
                Some(Ok(record)) => record_device(&mut snapshot, record),
                Some(Err(error)) => {
                    log_failure(address, &error);
                    snapshot.insert_failed(address.clone());
                }
                None => {
                    tracing::error!(%address, outcome = "panicked", "Probe task aborted");
                    snapshot.insert_failed(address.clone());
                }
            }
        }

        tracing::info!(
            devices = snapshot.devices.len(),
            failed = snapshot.failed_addresses.len(),
            links = snapshot.link_count(),
            "Discovery finished"
        );
        snapshot
    }

    /// Spawns one task per address; returns outcomes indexed like `addresses`.
    ///
    /// `None` marks a task that did not complete (panic or cancellation).
    async fn probe_all(
        &self,
        addresses: &[DeviceAddress],
    ) -> Vec<Option<Result<DeviceRecord, ProbeError>>> {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();

        for (index, address) in addresses.iter().cloned().enumerate() {
            let probe = Arc::clone(&self.probe);
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                // The semaphore is never closed; on error run unbounded.
                let _permit = semaphore.acquire_owned().await.ok();
                (index, probe.probe(&address).await)
            });
        }

        let mut outcomes: Vec<Option<Result<DeviceRecord, ProbeError>>> =
            std::iter::repeat_with(|| None).take(addresses.len()).collect();

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, outcome)) => outcomes[index] = Some(outcome),
                Err(e) => tracing::warn!(error = %e, "Probe task failed to complete"),
            }
        }

        outcomes
    }
}

fn record_device(snapshot: &mut TopologySnapshot, record: DeviceRecord) {
    tracing::info!(
        address = %record.address,
        device = %record.short_name,
        device_type = %record.device_type,
        protocol = %record.protocol,
        neighbors = record.neighbors.len(),
        outcome = "probed",
        "Device probed"
    );

    if let Err(rejected) = snapshot.insert_device(record) {
        let owner = snapshot
            .devices
            .get(&rejected.short_name)
            .map(|d| d.address.to_string())
            .unwrap_or_default();
        tracing::warn!(
            address = %rejected.address,
            device = %rejected.short_name,
            kept = %owner,
            outcome = "duplicate",
            "Duplicate device name, keeping the earlier address"
        );
        snapshot.insert_failed(rejected.address);
    }
}

fn log_failure(address: &DeviceAddress, error: &ProbeError) {
    match error {
        ProbeError::Unreachable => {
            tracing::info!(%address, outcome = error.outcome(), "Device unreachable");
        }
        ProbeError::Undetected => {
            tracing::info!(%address, outcome = error.outcome(), "Device type not detected");
        }
        _ => {
            tracing::warn!(%address, outcome = error.outcome(), error = %error, "Device probe failed");
        }
    }
}
