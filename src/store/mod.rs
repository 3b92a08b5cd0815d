//! Snapshot persistence for detecting changes across cycles and restarts.
//!
//! This module provides abstractions for storing topology snapshots and
//! finding the most recent one.

mod file;

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;

pub use file::{FileSnapshotStore, snapshot_file_name};

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::topology::TopologySnapshot;

/// Result of loading the latest snapshot from persistent storage.
///
/// Explicitly models all valid states to avoid ambiguity:
/// - Successfully loaded the latest snapshot
/// - No snapshot exists (first run)
/// - Snapshots exist but none could be read
#[derive(Debug, Clone)]
pub enum LoadResult {
    /// Successfully loaded the most recent snapshot.
    Loaded(TopologySnapshot),

    /// No snapshot exists (first run or emptied directory).
    NotFound,

    /// Snapshot files exist but none could be parsed.
    /// The monitor continues without a baseline.
    Corrupted {
        /// Reason for corruption (for logging/debugging).
        reason: String,
    },
}

impl LoadResult {
    /// Returns the loaded snapshot, or `None` for `NotFound`/`Corrupted`.
    #[must_use]
    pub fn into_snapshot(self) -> Option<TopologySnapshot> {
        match self {
            Self::Loaded(snapshot) => Some(snapshot),
            Self::NotFound | Self::Corrupted { .. } => None,
        }
    }

    /// Returns `true` if a snapshot was successfully loaded.
    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded(_))
    }
}

/// Errors that can occur during snapshot persistence operations.
///
/// Only covers write-side and listing errors; read-side issues are modeled
/// as [`LoadResult`] variants to allow graceful degradation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Failed to write the snapshot file.
    #[error("Failed to write snapshot file: {0}")]
    Write(#[source] io::Error),

    /// Failed to serialize the snapshot to JSON.
    #[error("Failed to serialize snapshot: {0}")]
    Serialize(#[source] serde_json::Error),

    /// Failed to list the snapshot directory.
    #[error("Failed to list snapshot directory {}: {source}", path.display())]
    List {
        /// Directory being listed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
}

/// Abstraction for persisting topology snapshots.
///
/// Implementations should:
/// - Use atomic writes so a crash never leaves a partial snapshot
/// - Handle an empty store gracefully (return `LoadResult::NotFound`)
/// - Order snapshots by their timestamp, not by storage metadata
pub trait SnapshotStore: Send + Sync {
    /// Loads the most recent snapshot.
    fn load_latest(&self) -> LoadResult;

    /// Persists a snapshot and returns where it was written.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be written.
    fn save(
        &self,
        snapshot: &TopologySnapshot,
    ) -> impl std::future::Future<Output = Result<PathBuf, StoreError>> + Send;
}

/// Mock snapshot store for testing.
#[cfg(test)]
pub mod mock {
    use super::*;
    use std::sync::RwLock;

    /// A mock implementation of [`SnapshotStore`] keeping snapshots in memory.
    #[derive(Debug)]
    pub struct MockSnapshotStore {
        load_result: LoadResult,
        saved: RwLock<Vec<TopologySnapshot>>,
        fail_saves: bool,
    }

    impl MockSnapshotStore {
        /// Creates a store whose latest snapshot is `snapshot`.
        #[must_use]
        pub fn with_loaded(snapshot: TopologySnapshot) -> Self {
            Self::from_result(LoadResult::Loaded(snapshot))
        }

        /// Creates an empty store.
        #[must_use]
        pub fn not_found() -> Self {
            Self::from_result(LoadResult::NotFound)
        }

        /// Creates a store whose every save fails.
        #[must_use]
        pub fn failing() -> Self {
            Self {
                fail_saves: true,
                ..Self::not_found()
            }
        }

        fn from_result(load_result: LoadResult) -> Self {
            Self {
                load_result,
                saved: RwLock::new(Vec::new()),
                fail_saves: false,
            }
        }

        /// Returns every saved snapshot in save order.
        ///
        /// # Panics
        ///
        /// Panics if the internal lock is poisoned (only in test code).
        #[must_use]
        pub fn saved(&self) -> Vec<TopologySnapshot> {
            self.saved.read().unwrap().clone()
        }
    }

    impl SnapshotStore for MockSnapshotStore {
        fn load_latest(&self) -> LoadResult {
            self.load_result.clone()
        }

        async fn save(&self, snapshot: &TopologySnapshot) -> Result<PathBuf, StoreError> {
            if self.fail_saves {
                return Err(StoreError::Write(io::Error::other("disk full")));
            }
            self.saved.write().unwrap().push(snapshot.clone());
            Ok(PathBuf::from(snapshot_file_name(&snapshot.timestamp)))
        }
    }
}
