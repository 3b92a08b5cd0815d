//! Application startup and utilities.
//!
//! This module contains exit codes, tracing setup, the startup summary of
//! the selected mode, and hints for configuration errors.

use argus_topo::config::{ConfigError, ValidatedConfig, field};
use argus_topo::probe::Platform;
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[cfg(test)]
#[path = "app_tests.rs"]
mod tests;

/// Application exit codes.
pub mod exit_code {
    use std::process::ExitCode;

    /// Success (exit code 0).
    pub const SUCCESS: ExitCode = ExitCode::SUCCESS;

    /// Configuration error (exit code 1) - invalid args, missing required fields, etc.
    pub const CONFIG_ERROR: ExitCode = ExitCode::FAILURE;

    /// Runtime error (exit code 2) - unwritable snapshot, failed export, etc.
    ///
    /// Note: This is a function rather than a constant because `ExitCode::from()` is not `const fn`.
    pub fn runtime_error() -> ExitCode {
        ExitCode::from(2)
    }
}

/// What the process does once configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// One discovery pass, saved and exported, then exit.
    Discover,
    /// Discovery every interval until interrupted, exporting on change.
    Monitor,
}

impl Mode {
    /// Selects the mode from the `discover` subcommand flag.
    pub const fn from_discover(discover_only: bool) -> Self {
        if discover_only {
            Self::Discover
        } else {
            Self::Monitor
        }
    }

    pub const fn is_discover(self) -> bool {
        matches!(self, Self::Discover)
    }
}

/// One-line description of what this run is about to do.
pub fn startup_message(mode: Mode, config: &ValidatedConfig) -> String {
    let devices = config.addresses.len();
    let snapshots = config.snapshot_dir.display();

    match mode {
        Mode::Discover => format!(
            "Discovering {devices} device(s) once; snapshot to {snapshots}, exports to {}",
            config.output_dir.display()
        ),
        Mode::Monitor => {
            let on_change = if config.dry_run {
                "export command logged only (dry run)"
            } else if config.export_command.is_some() {
                "configured export command runs"
            } else {
                "'argus-topo discover' runs"
            };
            format!(
                "Monitoring {devices} device(s) every {}s; snapshots to {snapshots}; on change, {on_change}",
                config.interval.as_secs()
            )
        }
    }
}

/// Returns a follow-up hint for a configuration error, if one helps.
pub fn config_hint(error: &ConfigError) -> Option<String> {
    const INIT_HINT: &str = "Run 'argus-topo init' to generate a configuration template.";

    match error {
        ConfigError::MissingRequired { field: f, .. }
            if *f == field::DEVICES || *f == field::USERNAME =>
        {
            Some(INIT_HINT.to_string())
        }
        ConfigError::FileRead { .. } => Some(INIT_HINT.to_string()),
        ConfigError::UnknownPlatform(_) => {
            let names: Vec<&str> = Platform::DEFAULT_ORDER.iter().map(|p| p.name()).collect();
            Some(format!("Supported platforms: {}.", names.join(", ")))
        }
        ConfigError::InvalidRegex { .. } => Some(
            "The prompt pattern is matched against the last line of device output, \
             e.g. '^\\S+[>#]\\s*$'."
                .to_string(),
        ),
        ConfigError::EmptyCommand => Some(
            "Remove 'command' from [export] to run 'argus-topo discover' on change.".to_string(),
        ),
        _ => None,
    }
}

/// Prints the hint for a configuration error, if any.
pub fn print_config_hint(error: &ConfigError) {
    if let Some(hint) = config_hint(error) {
        eprintln!("\n{hint}");
    }
}

/// Sets up the tracing subscriber for logging.
pub fn setup_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };

    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
