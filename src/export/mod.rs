//! Topology exports consumed by people and downstream tooling.
//!
//! This module provides types and functions for:
//! - Flattening a snapshot into link rows ([`TopologyRow`], [`rows`])
//! - Degree-based role classification for layout ([`Role`], [`classify_roles`])
//! - CSV and Graphviz renderings ([`to_csv`], [`to_dot`])
//! - Hooks the monitor runs on change ([`ExportHook`], [`ArtifactWriter`],
//!   [`CommandHook`])

mod hook;
mod render;
mod rows;

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;

pub use hook::{ArtifactWriter, Artifacts, CommandHook, SNAPSHOT_TIMESTAMP_ENV};
pub use render::{to_csv, to_dot};
pub use rows::{Role, TopologyRow, classify_roles, connections, rows};

use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

use crate::topology::TopologySnapshot;

/// Errors that can occur while exporting a topology.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Failed to encode the CSV table.
    #[error("Failed to encode CSV: {0}")]
    Csv(#[source] csv::Error),

    /// Failed to render the graph template.
    #[error("Failed to render graph: {0}")]
    Template(#[source] handlebars::RenderError),

    /// Failed to write an artifact.
    #[error("Failed to write {}: {source}", path.display())]
    Write {
        /// File or directory being written.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The export command could not be started.
    #[error("Failed to run '{command}': {source}")]
    Spawn {
        /// Command line that was attempted.
        command: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The export command ran but reported failure.
    #[error("'{command}' exited with {status}")]
    Status {
        /// Command line that ran.
        command: String,
        /// Its exit status.
        status: ExitStatus,
    },
}

/// Downstream action triggered when the monitor detects a change.
pub trait ExportHook: Send + Sync {
    /// Exports `snapshot`.
    ///
    /// # Errors
    ///
    /// Returns an error if the export did not complete. The monitor logs it
    /// and keeps running.
    fn export(
        &self,
        snapshot: &TopologySnapshot,
    ) -> impl std::future::Future<Output = Result<(), ExportError>> + Send;
}

/// Logs one "X is connected to: ..." line per device.
pub fn log_summary(rows: &[TopologyRow]) {
    for (device, neighbors) in connections(rows) {
        let neighbors: Vec<&str> = neighbors.into_iter().collect();
        tracing::info!("{device} is connected to: {}", neighbors.join(", "));
    }
}
