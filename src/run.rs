//! Application execution logic.
//!
//! This module wires the validated configuration into the discovery
//! pipeline and runs either a single discovery or the monitor loop.

use std::path::PathBuf;
use std::time::SystemTime;

use thiserror::Error;
use tokio::signal;

use argus_topo::config::ValidatedConfig;
use argus_topo::export::{ArtifactWriter, CommandHook, ExportError};
use argus_topo::monitor::TopologyMonitor;
use argus_topo::probe::{DeviceProber, PingProber, ProbeSet, SessionSettings};
use argus_topo::shell::SshConnector;
use argus_topo::store::{FileSnapshotStore, SnapshotStore, StoreError};
use argus_topo::time::next_snapshot_timestamp;
use argus_topo::topology::TopologyBuilder;

/// Type alias for the production device prober.
type AppProber = DeviceProber<PingProber, SshConnector>;

/// Environment variables the `discover` child reads its secrets from.
const PASSWORD_ENV: &str = "ARGUS_SSH_PASSWORD";
const SECRET_ENV: &str = "ARGUS_ENABLE_SECRET";

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;

/// Error type for runtime execution failures.
#[derive(Debug, Error)]
pub enum RunError {
    /// A platform detection pattern failed to compile.
    #[error("Failed to compile detection patterns: {0}")]
    DetectionPatterns(#[source] regex::Error),

    /// Failed to save the discovered snapshot.
    #[error("Failed to save snapshot: {0}")]
    SnapshotSave(#[source] StoreError),

    /// Failed to write the export artifacts.
    #[error("Failed to export topology: {0}")]
    Export(#[source] ExportError),

    /// The path of the running executable is unknown.
    #[error("Failed to locate the current executable: {0}")]
    CurrentExe(#[source] std::io::Error),
}

/// Executes the application.
///
/// With `discover_only`, probes every device once, saves the snapshot and
/// writes the export artifacts. Otherwise runs the monitor loop until a
/// shutdown signal (Ctrl+C or SIGTERM) is received.
///
/// # Errors
///
/// Returns an error if:
/// - The detection patterns cannot be compiled
/// - (discover) The snapshot or the exports cannot be written
/// - (monitor) The default export command cannot be located
///
/// # Coverage Note
///
/// This function is excluded from coverage because it requires
/// real devices and signal handling.
#[cfg(not(tarpaulin_include))]
pub async fn execute(config: ValidatedConfig, discover_only: bool) -> Result<(), RunError> {
    let builder = create_builder(&config)?;
    let store = FileSnapshotStore::new(config.snapshot_dir.clone());

    if discover_only {
        return discover(&config, &builder, &store).await;
    }

    let hook = create_export_hook(&config)?;
    if config.dry_run {
        tracing::info!("Dry-run mode enabled - export command will be logged but not run");
    }
    tracing::debug!(command = %hook.command_line(), "Export command on change");

    let mut monitor = TopologyMonitor::new(
        builder,
        config.addresses,
        store,
        hook,
        config.interval,
    )
    .with_dry_run(config.dry_run);

    monitor.load_baseline();
    monitor.run(shutdown_signal()).await;
    Ok(())
}

/// Creates the topology builder from configuration.
fn create_builder(config: &ValidatedConfig) -> Result<TopologyBuilder<AppProber>, RunError> {
    let probes = ProbeSet::new(&config.platforms).map_err(RunError::DetectionPatterns)?;
    let settings = SessionSettings {
        connect_timeout: config.connect_timeout,
        command_timeout: config.command_timeout,
        prompt: config.prompt.clone(),
    };

    let prober = DeviceProber::new(
        PingProber::new(config.ping_timeout),
        SshConnector::new(config.port, config.prompt.clone()),
        config.credentials.clone(),
        probes,
        settings,
    );

    Ok(TopologyBuilder::new(prober, config.concurrency))
}

/// Creates the command run by the monitor when the topology changed.
///
/// Without a configured command, this executable's `discover` subcommand is
/// run with the same settings. Secrets travel through the environment, never
/// through the argument list.
fn create_export_hook(config: &ValidatedConfig) -> Result<CommandHook, RunError> {
    if let Some((program, args)) = config
        .export_command
        .as_deref()
        .and_then(<[String]>::split_first)
    {
        return Ok(CommandHook::new(program, args.to_vec()));
    }

    let program = std::env::current_exe().map_err(RunError::CurrentExe)?;
    let mut hook = CommandHook::new(program, discover_args(config));

    if let Some(password) = &config.credentials.password {
        hook = hook.with_env(PASSWORD_ENV, password);
    }
    if let Some(secret) = &config.credentials.secret {
        hook = hook.with_env(SECRET_ENV, secret);
    }

    Ok(hook)
}

/// Builds the argument list of the default `discover` export command.
fn discover_args(config: &ValidatedConfig) -> Vec<String> {
    let mut args = vec!["discover".to_string()];

    if let Some(path) = &config.config_path {
        push_path(&mut args, "--config", absolute(path.clone()));
    }
    for address in &config.addresses {
        args.push("--device".to_string());
        args.push(address.to_string());
    }
    args.push("--username".to_string());
    args.push(config.credentials.username.clone());
    if let Some(key_file) = &config.credentials.key_file {
        push_path(&mut args, "--key-file", absolute(key_file.clone()));
    }
    push_path(&mut args, "--snapshot-dir", absolute(config.snapshot_dir.clone()));
    push_path(&mut args, "--output-dir", absolute(config.output_dir.clone()));
    args.push("--concurrency".to_string());
    args.push(config.concurrency.to_string());
    if config.verbose {
        args.push("--verbose".to_string());
    }

    args
}

fn push_path(args: &mut Vec<String>, flag: &str, path: PathBuf) {
    args.push(flag.to_string());
    args.push(path.display().to_string());
}

/// Resolves `path` against the current directory, leaving it as is on failure.
fn absolute(path: PathBuf) -> PathBuf {
    std::path::absolute(&path).unwrap_or(path)
}

/// Runs one discovery, saves the snapshot and writes the exports.
///
/// Excluded from coverage - requires real devices.
#[cfg(not(tarpaulin_include))]
async fn discover(
    config: &ValidatedConfig,
    builder: &TopologyBuilder<AppProber>,
    store: &FileSnapshotStore,
) -> Result<(), RunError> {
    let previous = store.load_latest().into_snapshot();
    let timestamp = next_snapshot_timestamp(
        SystemTime::now(),
        previous.as_ref().map(|s| s.timestamp.as_str()),
    );

    let snapshot = builder.build(&config.addresses, timestamp).await;
    if snapshot.is_total_outage() {
        tracing::error!(
            failed = snapshot.failed_addresses.len(),
            "No device could be reached"
        );
    }

    let path = store.save(&snapshot).await.map_err(RunError::SnapshotSave)?;
    tracing::info!(path = %path.display(), "Saved topology snapshot");

    let artifacts = ArtifactWriter::new(config.output_dir.clone())
        .write(&snapshot)
        .await
        .map_err(RunError::Export)?;
    tracing::info!(
        csv = %artifacts.csv.display(),
        dot = %artifacts.dot.display(),
        "Wrote topology exports"
    );

    Ok(())
}

/// Returns a future that completes when a shutdown signal is received.
///
/// If a handler cannot be installed, the error is logged and that signal
/// is ignored.
///
/// Excluded from coverage - requires OS signal handling.
#[cfg(not(tarpaulin_include))]
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
