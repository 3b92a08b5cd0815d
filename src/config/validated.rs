//! Validated configuration after merging CLI and TOML sources.
//!
//! This module contains the final, validated configuration that is used
//! by the application. All validation is performed during construction.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use regex::Regex;

use crate::probe::Platform;
use crate::shell::{Credentials, DEFAULT_PROMPT_PATTERN};
use crate::topology::DeviceAddress;

use super::cli::Cli;
use super::defaults;
use super::error::{ConfigError, field};
use super::toml::TomlConfig;

/// Fully validated configuration ready for use by the application.
///
/// This struct represents a complete, validated configuration where all
/// required fields are present and all values have been validated.
///
/// # Construction
///
/// Use [`ValidatedConfig::from_raw`] to create from CLI args and optional TOML config.
/// The function validates all inputs and returns errors for invalid configurations.
#[derive(Debug)]
pub struct ValidatedConfig {
    /// Devices to probe, in configured order (required)
    pub addresses: Vec<DeviceAddress>,

    /// Login material shared by every device
    pub credentials: Credentials,

    /// SSH port
    pub port: u16,

    /// Connect-and-login deadline
    pub connect_timeout: Duration,

    /// Per-command output deadline
    pub command_timeout: Duration,

    /// Reachability probe timeout
    pub ping_timeout: Duration,

    /// Maximum number of devices probed at the same time
    pub concurrency: usize,

    /// Device prompt pattern
    pub prompt: Regex,

    /// Platforms tried during detection, in priority order
    pub platforms: Vec<Platform>,

    /// Interval between monitor cycles
    pub interval: Duration,

    /// Directory holding snapshot files
    pub snapshot_dir: PathBuf,

    /// Directory for CSV and Graphviz exports
    pub output_dir: PathBuf,

    /// Command run by the monitor on change, program first.
    /// If `None`, the monitor runs this program's `discover` subcommand.
    pub export_command: Option<Vec<String>>,

    /// Configuration file the values were read from, if any
    pub config_path: Option<PathBuf>,

    /// Dry-run mode (log changes without running the export)
    pub dry_run: bool,

    /// Verbose logging enabled
    pub verbose: bool,
}

impl fmt::Display for ValidatedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let platforms: Vec<&str> = self.platforms.iter().map(|p| p.name()).collect();
        let auth = match (&self.credentials.key_file, &self.credentials.password) {
            (Some(_), Some(_)) => "key+password",
            (Some(_), None) => "key",
            _ => "password",
        };

        write!(
            f,
            "Config {{ devices: {}, user: {}, auth: {}, port: {}, concurrency: {}, \
             interval: {}s, platforms: [{}], snapshot_dir: {}, output_dir: {}, dry_run: {} }}",
            self.addresses.len(),
            self.credentials.username,
            auth,
            self.port,
            self.concurrency,
            self.interval.as_secs(),
            platforms.join(", "),
            self.snapshot_dir.display(),
            self.output_dir.display(),
            self.dry_run,
        )
    }
}

impl ValidatedConfig {
    /// Creates a validated configuration from CLI arguments and optional TOML config.
    ///
    /// CLI arguments take precedence over TOML config values.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No device address is configured, or one is blank
    /// - The user name is missing, or neither password nor key file is set
    /// - Durations or concurrency are zero
    /// - The prompt pattern is not a valid regex
    /// - The detection list names an unknown platform
    pub fn from_raw(cli: &Cli, toml: Option<&TomlConfig>) -> Result<Self, ConfigError> {
        let addresses = Self::resolve_addresses(cli, toml)?;
        let credentials = Self::resolve_credentials(cli, toml)?;

        let connection = toml.map(|t| &t.connection);
        let port = connection
            .and_then(|c| c.port)
            .unwrap_or(defaults::SSH_PORT);
        let connect_timeout = positive_secs(
            "connect_timeout",
            connection.and_then(|c| c.connect_timeout),
            defaults::CONNECT_TIMEOUT_SECS,
        )?;
        let command_timeout = positive_secs(
            "command_timeout",
            connection.and_then(|c| c.command_timeout),
            defaults::COMMAND_TIMEOUT_SECS,
        )?;
        let ping_timeout = positive_secs(
            "ping_timeout",
            connection.and_then(|c| c.ping_timeout),
            defaults::PING_TIMEOUT_SECS,
        )?;

        // Priority: CLI explicit > TOML > default
        let concurrency = cli
            .concurrency
            .or_else(|| connection.and_then(|c| c.concurrency))
            .unwrap_or(defaults::CONCURRENCY);
        if concurrency == 0 {
            return Err(ConfigError::InvalidConcurrency);
        }

        let prompt = Self::resolve_prompt(toml)?;
        let platforms = Self::resolve_platforms(toml)?;

        let interval = positive_secs(
            "interval",
            cli.interval.or_else(|| toml.and_then(|t| t.monitor.interval)),
            defaults::INTERVAL_SECS,
        )?;

        let snapshot_dir = cli
            .snapshot_dir
            .clone()
            .or_else(|| toml.and_then(|t| t.monitor.snapshot_dir.clone()))
            .map_or_else(|| PathBuf::from(defaults::SNAPSHOT_DIR), |p| expand_tilde(&p));
        let output_dir = cli
            .output_dir
            .clone()
            .or_else(|| toml.and_then(|t| t.export.output_dir.clone()))
            .map_or_else(|| PathBuf::from(defaults::OUTPUT_DIR), |p| expand_tilde(&p));

        let export_command = toml.and_then(|t| t.export.command.clone());
        if export_command.as_ref().is_some_and(Vec::is_empty) {
            return Err(ConfigError::EmptyCommand);
        }

        Ok(Self {
            addresses,
            credentials,
            port,
            connect_timeout,
            command_timeout,
            ping_timeout,
            concurrency,
            prompt,
            platforms,
            interval,
            snapshot_dir,
            output_dir,
            export_command,
            config_path: cli.config.clone(),
            dry_run: cli.dry_run,
            verbose: cli.verbose,
        })
    }

    /// Loads and merges configuration from CLI and optional config file.
    ///
    /// If `cli.config` is set, loads the TOML file from that path.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The config file cannot be read or parsed
    /// - The merged configuration is invalid
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let toml = if let Some(ref path) = cli.config {
            Some(TomlConfig::load(path)?)
        } else {
            None
        };

        Self::from_raw(cli, toml.as_ref())
    }

    fn resolve_addresses(
        cli: &Cli,
        toml: Option<&TomlConfig>,
    ) -> Result<Vec<DeviceAddress>, ConfigError> {
        // CLI list replaces the TOML list entirely
        let raw: &[String] = if cli.devices.is_empty() {
            toml.map(|t| t.devices.addresses.as_slice())
                .unwrap_or_default()
        } else {
            &cli.devices
        };

        if raw.is_empty() {
            return Err(ConfigError::missing(
                field::DEVICES,
                "Use --device or set devices.addresses in config file",
            ));
        }

        let mut addresses: Vec<DeviceAddress> = Vec::with_capacity(raw.len());
        for value in raw {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                return Err(ConfigError::InvalidAddress(value.clone()));
            }
            let address = DeviceAddress::new(trimmed);
            if addresses.contains(&address) {
                tracing::warn!(%address, "Duplicate device address ignored");
                continue;
            }
            addresses.push(address);
        }

        Ok(addresses)
    }

    fn resolve_credentials(
        cli: &Cli,
        toml: Option<&TomlConfig>,
    ) -> Result<Credentials, ConfigError> {
        let section = toml.map(|t| &t.credentials);

        let username = cli
            .username
            .clone()
            .or_else(|| section.and_then(|s| s.username.clone()))
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| {
                ConfigError::missing(
                    field::USERNAME,
                    "Use --username or set credentials.username in config file",
                )
            })?;

        let password = cli
            .password
            .clone()
            .or_else(|| section.and_then(|s| s.password.clone()));
        let secret = cli
            .secret
            .clone()
            .or_else(|| section.and_then(|s| s.secret.clone()))
            .filter(|s| !s.is_empty());
        let key_file = cli
            .key_file
            .clone()
            .or_else(|| section.and_then(|s| s.key_file.clone()))
            .map(|p| expand_tilde(&p));

        if password.is_none() && key_file.is_none() {
            return Err(ConfigError::missing(
                field::AUTHENTICATION,
                "Use --password, --key-file, or set them in the [credentials] section",
            ));
        }

        Ok(Credentials {
            username,
            password,
            secret,
            key_file,
        })
    }

    fn resolve_prompt(toml: Option<&TomlConfig>) -> Result<Regex, ConfigError> {
        let pattern = toml
            .and_then(|t| t.connection.prompt.as_deref())
            .unwrap_or(DEFAULT_PROMPT_PATTERN);

        Regex::new(pattern).map_err(|source| ConfigError::InvalidRegex {
            pattern: pattern.to_string(),
            source,
        })
    }

    fn resolve_platforms(toml: Option<&TomlConfig>) -> Result<Vec<Platform>, ConfigError> {
        let Some(names) = toml.and_then(|t| t.detection.platforms.as_ref()) else {
            return Ok(Platform::DEFAULT_ORDER.to_vec());
        };

        let mut platforms = Vec::with_capacity(names.len());
        for name in names {
            let platform: Platform = name.parse()?;
            if !platforms.contains(&platform) {
                platforms.push(platform);
            }
        }

        if platforms.is_empty() {
            return Ok(Platform::DEFAULT_ORDER.to_vec());
        }
        Ok(platforms)
    }
}

/// Resolves a seconds value, rejecting zero.
fn positive_secs(
    field: &'static str,
    value: Option<u64>,
    default: u64,
) -> Result<Duration, ConfigError> {
    let seconds = value.unwrap_or(default);
    if seconds == 0 {
        return Err(ConfigError::InvalidDuration {
            field,
            reason: "must be greater than 0".to_string(),
        });
    }
    Ok(Duration::from_secs(seconds))
}

/// Expands a leading `~` to the home directory.
///
/// Paths without `~`, and every path when no home directory is known,
/// are returned unchanged.
#[must_use]
pub fn expand_tilde(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    dirs::home_dir().map_or_else(|| path.to_path_buf(), |home| home.join(rest))
}

/// Writes the default configuration template to a file.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_default_config(path: &Path) -> Result<(), ConfigError> {
    let template = super::toml::default_config_template();
    std::fs::write(path, template).map_err(|e| ConfigError::FileWrite {
        path: path.to_path_buf(),
        source: e,
    })
}
