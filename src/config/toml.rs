//! TOML configuration file parsing.
//!
//! Defines the structure of the configuration file with serde.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::ConfigError;

/// Root configuration structure from TOML file.
///
/// All fields are optional to allow partial configuration
/// that can be merged with CLI arguments.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    /// Devices to probe
    #[serde(default)]
    pub devices: DevicesSection,

    /// Login material
    #[serde(default)]
    pub credentials: CredentialsSection,

    /// SSH and probing parameters
    #[serde(default)]
    pub connection: ConnectionSection,

    /// Platform detection
    #[serde(default)]
    pub detection: DetectionSection,

    /// Monitoring configuration
    #[serde(default)]
    pub monitor: MonitorSection,

    /// Export configuration
    #[serde(default)]
    pub export: ExportSection,
}

/// Device list section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DevicesSection {
    /// Addresses (IP or hostname) of the devices to probe
    #[serde(default)]
    pub addresses: Vec<String>,
}

/// Credentials section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CredentialsSection {
    /// SSH user name
    pub username: Option<String>,

    /// SSH password
    pub password: Option<String>,

    /// Enable secret
    pub secret: Option<String>,

    /// SSH private key file (`~` is expanded)
    pub key_file: Option<PathBuf>,
}

/// Connection section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectionSection {
    /// SSH port
    pub port: Option<u16>,

    /// Connect-and-login deadline in seconds
    pub connect_timeout: Option<u64>,

    /// Per-command output deadline in seconds
    pub command_timeout: Option<u64>,

    /// Reachability probe timeout in seconds
    pub ping_timeout: Option<u64>,

    /// Maximum number of devices probed at the same time
    pub concurrency: Option<usize>,

    /// Regex recognizing the device prompt
    pub prompt: Option<String>,
}

/// Detection section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DetectionSection {
    /// Platforms to try, in priority order
    pub platforms: Option<Vec<String>>,
}

/// Monitoring configuration section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MonitorSection {
    /// Seconds between cycles
    pub interval: Option<u64>,

    /// Directory holding snapshot files
    pub snapshot_dir: Option<PathBuf>,
}

/// Export configuration section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExportSection {
    /// Directory for CSV and Graphviz exports
    pub output_dir: Option<PathBuf>,

    /// Command run by the monitor on change, program first
    pub command: Option<Vec<String>>,
}

impl TomlConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        Self::parse(&content)
    }

    /// Parses configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::from)
    }
}

/// Generates a default configuration file with comments.
#[must_use]
pub fn default_config_template() -> String {
    r#"# Argus topology monitor configuration

[devices]
# Devices to probe (required). CLI --device REPLACES this list.
addresses = [
    # "10.0.0.1",
    # "core-sw1.example.net",
]

[credentials]
# SSH user name (required)
# username = "admin"

# SSH password, or set ARGUS_SSH_PASSWORD
# password = ""

# Private key file, used before the password when both are set
# key_file = "~/.ssh/id_ed25519"

# Enable secret for privileged mode, or set ARGUS_ENABLE_SECRET
# secret = ""

[connection]
# port = 22

# Seconds to connect and log in (default: 20)
# connect_timeout = 20

# Seconds to wait for each command's output (default: 20)
# command_timeout = 20

# Seconds to wait for the ping reply (default: 2)
# ping_timeout = 2

# Devices probed at the same time (default: 8)
# concurrency = 8

# Regex recognizing the device prompt
# prompt = '^\S[^\r\n]{0,63}[>#$]\s*$'

[detection]
# Platforms tried in order; the first whose pattern matches wins
# Accepted values: "ios_xr", "nxos", "ios", "fortinet"
# platforms = ["ios_xr", "nxos", "ios", "fortinet"]

[monitor]
# Seconds between discovery cycles (default: 60)
interval = 60

# Where topology_<timestamp>.json snapshots are kept
snapshot_dir = "topologies"

[export]
# Where topology_<timestamp>.csv and .dot files are written
output_dir = "topologies"

# Command run by the monitor when the topology changed.
# Default: this program's `discover` subcommand with the same config file.
# The snapshot timestamp is passed in ARGUS_SNAPSHOT_TIMESTAMP.
# command = ["/usr/local/bin/render-topology", "--latest"]
"#
    .to_string()
}
