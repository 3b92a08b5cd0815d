//! Periodic discovery loop.

use std::time::Duration;

use super::{ChangeVerdict, compare};
use crate::export::ExportHook;
use crate::probe::DeviceProbe;
use crate::store::{LoadResult, SnapshotStore};
use crate::time::{Clock, SystemClock, next_snapshot_timestamp};
use crate::topology::{DeviceAddress, TopologyBuilder, TopologySnapshot};

/// Topology monitor.
///
/// Runs one discovery cycle, compares it with the previous one, persists
/// it, and triggers the export hook when something changed. Cycles never
/// overlap; the loop owns the last known snapshot and only replaces it
/// between cycles.
///
/// # Type Parameters
///
/// * `P` - The [`DeviceProbe`] run for each address
/// * `S` - The [`SnapshotStore`] snapshots are persisted to
/// * `H` - The [`ExportHook`] run on change
/// * `C` - The [`Clock`] used for snapshot timestamps (defaults to [`SystemClock`])
pub struct TopologyMonitor<P, S, H, C = SystemClock> {
    builder: TopologyBuilder<P>,
    addresses: Vec<DeviceAddress>,
    store: S,
    hook: H,
    clock: C,
    interval: Duration,
    dry_run: bool,
    last: Option<TopologySnapshot>,
}

impl<P, S, H> TopologyMonitor<P, S, H, SystemClock>
where
    P: DeviceProbe + 'static,
    S: SnapshotStore,
    H: ExportHook,
{
    /// Creates a monitor using the system clock and no baseline.
    #[must_use]
    pub const fn new(
        builder: TopologyBuilder<P>,
        addresses: Vec<DeviceAddress>,
        store: S,
        hook: H,
        interval: Duration,
    ) -> Self {
        Self {
            builder,
            addresses,
            store,
            hook,
            clock: SystemClock,
            interval,
            dry_run: false,
            last: None,
        }
    }
}

impl<P, S, H, C> TopologyMonitor<P, S, H, C>
where
    P: DeviceProbe + 'static,
    S: SnapshotStore,
    H: ExportHook,
    C: Clock,
{
    /// Replaces the clock. Used to inject a mock clock in tests.
    #[must_use]
    pub fn with_clock<C2: Clock>(self, clock: C2) -> TopologyMonitor<P, S, H, C2> {
        TopologyMonitor {
            builder: self.builder,
            addresses: self.addresses,
            store: self.store,
            hook: self.hook,
            clock,
            interval: self.interval,
            dry_run: self.dry_run,
            last: self.last,
        }
    }

    /// When enabled, changes are logged but the export hook is not run.
    #[must_use]
    pub const fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Returns the configured interval between cycles.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Returns the last known snapshot, if any.
    #[must_use]
    pub const fn last(&self) -> Option<&TopologySnapshot> {
        self.last.as_ref()
    }

    /// Returns the snapshot store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Loads the most recent persisted snapshot as the comparison baseline.
    ///
    /// An empty or unreadable store leaves the monitor without a baseline,
    /// so the first cycle counts as a change.
    pub fn load_baseline(&mut self) {
        match self.store.load_latest() {
            LoadResult::Loaded(snapshot) => {
                tracing::info!(
                    timestamp = %snapshot.timestamp,
                    devices = snapshot.devices.len(),
                    "Loaded previous topology"
                );
                self.last = Some(snapshot);
            }
            LoadResult::NotFound => {
                tracing::info!("No previous topology found, starting fresh");
            }
            LoadResult::Corrupted { reason } => {
                tracing::warn!("Previous topology unreadable ({reason}), starting fresh");
            }
        }
    }

    /// Runs one discovery cycle and returns its verdict.
    ///
    /// Persistence and export failures are logged, never returned: the
    /// next cycle runs regardless.
    pub async fn run_cycle(&mut self) -> ChangeVerdict {
        let previous = self.last.as_ref().map(|s| s.timestamp.as_str());
        let timestamp = next_snapshot_timestamp(self.clock.now(), previous);

        tracing::info!(%timestamp, addresses = self.addresses.len(), "Checking topology");
        let current = self.builder.build(&self.addresses, timestamp).await;

        let verdict = compare(&current, self.last.as_ref());
        log_verdict(&verdict);

        match self.store.save(&current).await {
            Ok(path) => tracing::debug!(path = %path.display(), "Topology saved"),
            Err(e) => tracing::error!("Failed to save topology: {e}"),
        }

        if verdict.changed {
            self.export(&current).await;
        }

        self.last = Some(current);
        verdict
    }

    async fn export(&self, snapshot: &TopologySnapshot) {
        if self.dry_run {
            tracing::info!(timestamp = %snapshot.timestamp, "Dry-run: skipping export");
            return;
        }

        if let Err(e) = self.hook.export(snapshot).await {
            tracing::error!("Export failed: {e}");
        }
    }

    /// Runs cycles until `shutdown` completes.
    ///
    /// The shutdown future is polled during the sleep between cycles and
    /// while a cycle runs. Snapshot writes are atomic, so an interrupted
    /// cycle never leaves a partial file behind.
    pub async fn run<F>(mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tracing::info!(
            interval_secs = self.interval.as_secs(),
            addresses = self.addresses.len(),
            "Starting topology monitoring"
        );
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                biased;

                () = &mut shutdown => {
                    tracing::info!("Shutdown signal received, stopping...");
                    return;
                }

                verdict = self.run_cycle() => {
                    if verdict.changed {
                        tracing::warn!(reasons = verdict.reasons.len(), "Topology change detected");
                    }
                }
            }

            tokio::select! {
                biased;

                () = &mut shutdown => {
                    tracing::info!("Shutdown signal received, stopping...");
                    return;
                }

                () = tokio::time::sleep(self.interval) => {}
            }
        }
    }
}

fn log_verdict(verdict: &ChangeVerdict) {
    if !verdict.changed {
        tracing::info!("No topology change");
        return;
    }
    for reason in &verdict.reasons {
        tracing::warn!(kind = reason.kind(), "{reason}");
    }
}
