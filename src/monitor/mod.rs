//! Monitor layer for detecting topology changes.
//!
//! This module provides types and functions for:
//! - Describing why a cycle counts as a change ([`ChangeReason`], [`ChangeVerdict`])
//! - Comparing two snapshots ([`compare`])
//! - Running discovery on an interval ([`TopologyMonitor`])

mod change;
mod runner;


pub use change::{ChangeReason, ChangeVerdict, compare};
pub use runner::TopologyMonitor;
