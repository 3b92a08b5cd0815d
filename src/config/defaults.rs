//! Default values for configuration options.
//!
//! Centralized constants to avoid magic numbers scattered across the codebase.

use std::time::Duration;

/// Default SSH port.
pub const SSH_PORT: u16 = 22;

/// Default connect-and-login deadline in seconds.
pub const CONNECT_TIMEOUT_SECS: u64 = 20;

/// Default per-command output deadline in seconds.
pub const COMMAND_TIMEOUT_SECS: u64 = 20;

/// Default reachability probe timeout in seconds.
pub const PING_TIMEOUT_SECS: u64 = 2;

/// Default number of devices probed at the same time.
pub const CONCURRENCY: usize = 8;

/// Default interval between monitor cycles in seconds.
pub const INTERVAL_SECS: u64 = 60;

/// Default directory for snapshot files.
pub const SNAPSHOT_DIR: &str = "topologies";

/// Default directory for CSV and Graphviz exports.
pub const OUTPUT_DIR: &str = "topologies";

/// Default configuration file name written by `init`.
pub const CONFIG_FILE: &str = "argus-topo.toml";

/// Default connect deadline as Duration.
#[must_use]
pub const fn connect_timeout() -> Duration {
    Duration::from_secs(CONNECT_TIMEOUT_SECS)
}

/// Default command deadline as Duration.
#[must_use]
pub const fn command_timeout() -> Duration {
    Duration::from_secs(COMMAND_TIMEOUT_SECS)
}

/// Default monitor interval as Duration.
#[must_use]
pub const fn interval() -> Duration {
    Duration::from_secs(INTERVAL_SECS)
}
