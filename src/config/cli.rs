//! CLI argument parsing using clap.
//!
//! Defines the command-line interface with all options and subcommands.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use super::defaults;

/// Argus: network topology discovery and drift monitor
///
/// Connects to switches and routers over SSH, reads their LLDP/CDP
/// neighbors, records the resulting topology and alerts when it changes.
#[derive(Debug, Parser)]
#[command(name = "argus-topo")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run (default: monitor)
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Path to configuration file
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    /// Device address to probe (can be specified multiple times; replaces the config list)
    #[arg(long = "device", value_name = "ADDRESS", global = true)]
    pub devices: Vec<String>,

    /// SSH user name
    #[arg(long, global = true)]
    pub username: Option<String>,

    /// SSH password
    #[arg(long, env = "ARGUS_SSH_PASSWORD", hide_env_values = true, global = true)]
    pub password: Option<String>,

    /// Enable secret for privileged mode
    #[arg(long, env = "ARGUS_ENABLE_SECRET", hide_env_values = true, global = true)]
    pub secret: Option<String>,

    /// SSH private key file
    #[arg(long = "key-file", global = true)]
    pub key_file: Option<PathBuf>,

    /// Seconds between monitor cycles
    #[arg(long, global = true)]
    pub interval: Option<u64>,

    /// Directory holding snapshot files
    #[arg(long = "snapshot-dir", global = true)]
    pub snapshot_dir: Option<PathBuf>,

    /// Directory for CSV and Graphviz exports
    #[arg(long = "output-dir", global = true)]
    pub output_dir: Option<PathBuf>,

    /// Maximum number of devices probed at the same time
    #[arg(long, global = true)]
    pub concurrency: Option<usize>,

    /// Test mode - log changes without running the export
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Enable verbose logging
    #[arg(long, short, global = true)]
    pub verbose: bool,
}

/// Subcommands for argus-topo
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Generate a default configuration file
    Init {
        /// Output path for the configuration file
        #[arg(long, short, default_value = defaults::CONFIG_FILE)]
        output: PathBuf,
    },

    /// Discover the topology once, save a snapshot and export it
    Discover,

    /// Rediscover on an interval and export when the topology changes
    Monitor,
}

impl Cli {
    /// Parses CLI arguments from the command line.
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Parses CLI arguments from an iterator (useful for testing).
    pub fn parse_from_iter<I, T>(iter: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::parse_from(iter)
    }

    /// Returns true if this is the init command.
    #[must_use]
    pub const fn is_init(&self) -> bool {
        matches!(self.command, Some(Command::Init { .. }))
    }

    /// Returns true if this run should only discover once.
    #[must_use]
    pub const fn is_discover(&self) -> bool {
        matches!(self.command, Some(Command::Discover))
    }
}
