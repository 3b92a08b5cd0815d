//! File-based snapshot persistence implementation.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::topology::{
    DeviceAddress, DeviceRecord, DeviceType, NeighborLink, Protocol, TopologySnapshot,
};

use super::{LoadResult, SnapshotStore, StoreError};

const FILE_PREFIX: &str = "topology_";
const FILE_EXTENSION: &str = ".json";

/// Returns the file name of the snapshot taken at `timestamp`.
///
/// ```
/// assert_eq!(
///     argus_topo::store::snapshot_file_name("20240101_120000"),
///     "topology_20240101_120000.json"
/// );
/// ```
#[must_use]
pub fn snapshot_file_name(timestamp: &str) -> String {
    format!("{FILE_PREFIX}{timestamp}{FILE_EXTENSION}")
}

/// Extracts the timestamp from a snapshot file name.
fn timestamp_of(file_name: &str) -> Option<&str> {
    file_name
        .strip_prefix(FILE_PREFIX)?
        .strip_suffix(FILE_EXTENSION)
        .filter(|ts| !ts.is_empty())
}

/// On-disk snapshot format.
///
/// Field names and nesting are read by export and rendering tooling, so
/// they are kept stable. Optional fields default so files written by older
/// tools still load.
#[derive(Debug, Serialize, Deserialize)]
struct SnapshotFile {
    timestamp: String,
    #[serde(default)]
    devices: BTreeMap<String, DeviceEntry>,
    #[serde(default)]
    failed_devices: Vec<DeviceAddress>,
}

#[derive(Debug, Serialize, Deserialize)]
struct DeviceEntry {
    ip: DeviceAddress,
    #[serde(default)]
    device_type: DeviceType,
    #[serde(default)]
    vendor: String,
    #[serde(default)]
    model: String,
    #[serde(default)]
    protocol: Protocol,
    #[serde(default)]
    neighbors: Vec<NeighborLink>,
}

impl From<&TopologySnapshot> for SnapshotFile {
    fn from(snapshot: &TopologySnapshot) -> Self {
        let devices = snapshot
            .devices
            .iter()
            .map(|(name, record)| {
                let entry = DeviceEntry {
                    ip: record.address.clone(),
                    device_type: record.device_type,
                    vendor: record.vendor.clone(),
                    model: record.model.clone(),
                    protocol: record.protocol,
                    neighbors: record.neighbors.clone(),
                };
                (name.clone(), entry)
            })
            .collect();

        Self {
            timestamp: snapshot.timestamp.clone(),
            devices,
            failed_devices: snapshot.failed_addresses.iter().cloned().collect(),
        }
    }
}

impl From<SnapshotFile> for TopologySnapshot {
    fn from(file: SnapshotFile) -> Self {
        let devices = file
            .devices
            .into_iter()
            .map(|(name, entry)| {
                let record = DeviceRecord {
                    short_name: name.clone(),
                    address: entry.ip,
                    device_type: entry.device_type,
                    vendor: entry.vendor,
                    model: entry.model,
                    protocol: entry.protocol,
                    neighbors: entry.neighbors,
                };
                (name, record)
            })
            .collect();

        Self {
            timestamp: file.timestamp,
            devices,
            failed_addresses: file.failed_devices.into_iter().collect(),
        }
    }
}

/// File-based implementation of [`SnapshotStore`].
///
/// Writes one pretty-printed JSON file per snapshot,
/// `topology_<timestamp>.json`, in a single directory.
///
/// # Atomic Writes
///
/// Uses write-to-temp-then-rename pattern to prevent corruption:
/// 1. Write to `{path}.tmp`
/// 2. Rename `{path}.tmp` to `{path}`
///
/// Temp files never match the snapshot name pattern, so a crash mid-write
/// leaves nothing that [`SnapshotStore::load_latest`] would pick up.
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    dir: PathBuf,
}

impl FileSnapshotStore {
    /// Creates a store in `dir`. The directory is created on first save.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Returns the snapshot directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the path a snapshot with `timestamp` is written to.
    #[must_use]
    pub fn path_for(&self, timestamp: &str) -> PathBuf {
        self.dir.join(snapshot_file_name(timestamp))
    }

    /// Lists snapshot files with their timestamps, newest first.
    ///
    /// A missing directory yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::List`] if the directory cannot be read.
    pub fn list(&self) -> Result<Vec<(String, PathBuf)>, StoreError> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(StoreError::List {
                    path: self.dir.clone(),
                    source,
                });
            }
        };

        let mut snapshots: Vec<(String, PathBuf)> = entries
            .filter_map(Result::ok)
            .filter_map(|entry| {
                let name = entry.file_name();
                let timestamp = timestamp_of(name.to_str()?)?.to_string();
                Some((timestamp, entry.path()))
            })
            .collect();

        snapshots.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(snapshots)
    }

    fn read(path: &Path) -> Result<TopologySnapshot, String> {
        let content =
            std::fs::read_to_string(path).map_err(|e| format!("Failed to read file: {e}"))?;
        let file: SnapshotFile =
            serde_json::from_str(&content).map_err(|e| format!("Invalid JSON: {e}"))?;
        Ok(file.into())
    }

    /// Performs the blocking save operation.
    ///
    /// Separated out so it can be wrapped in `spawn_blocking`.
    fn save_blocking(path: &Path, file: &SnapshotFile) -> Result<(), StoreError> {
        let content = serde_json::to_string_pretty(file).map_err(StoreError::Serialize)?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(StoreError::Write)?;
            }
        }

        // Append .tmp instead of replacing the extension so the temp file
        // never looks like a snapshot.
        let temp_path = PathBuf::from(format!("{}.tmp", path.display()));

        std::fs::write(&temp_path, content).map_err(StoreError::Write)?;
        std::fs::rename(&temp_path, path).map_err(StoreError::Write)?;

        Ok(())
    }
}

impl SnapshotStore for FileSnapshotStore {
    fn load_latest(&self) -> LoadResult {
        let snapshots = match self.list() {
            Ok(snapshots) => snapshots,
            Err(e) => {
                return LoadResult::Corrupted {
                    reason: e.to_string(),
                };
            }
        };

        let mut last_problem = None;
        for (timestamp, path) in snapshots {
            match Self::read(&path) {
                Ok(snapshot) => return LoadResult::Loaded(snapshot),
                Err(reason) => {
                    tracing::warn!(path = %path.display(), %timestamp, %reason, "Skipping unreadable snapshot");
                    last_problem = Some(format!("{}: {reason}", path.display()));
                }
            }
        }

        last_problem.map_or(LoadResult::NotFound, |reason| LoadResult::Corrupted { reason })
    }

    async fn save(&self, snapshot: &TopologySnapshot) -> Result<PathBuf, StoreError> {
        let path = self.path_for(&snapshot.timestamp);
        let file = SnapshotFile::from(snapshot);

        let target = path.clone();
        tokio::task::spawn_blocking(move || Self::save_blocking(&target, &file))
            .await
            .map_err(|e| StoreError::Write(std::io::Error::other(e)))??;

        Ok(path)
    }
}
