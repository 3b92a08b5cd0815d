//! Export hooks run by the monitor when the topology changed.

use std::path::{Path, PathBuf};

use super::{ExportError, ExportHook, log_summary, rows, to_csv, to_dot};
use crate::topology::TopologySnapshot;

/// Environment variable carrying the triggering snapshot's timestamp.
pub const SNAPSHOT_TIMESTAMP_ENV: &str = "ARGUS_SNAPSHOT_TIMESTAMP";

/// Paths written by one [`ArtifactWriter`] run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifacts {
    /// The flattened link table.
    pub csv: PathBuf,
    /// The Graphviz graph source.
    pub dot: PathBuf,
}

/// Writes `topology_<timestamp>.csv` and `topology_<timestamp>.dot` for a
/// snapshot and prints the connection summary.
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    dir: PathBuf,
}

impl ArtifactWriter {
    /// Creates a writer placing artifacts in `dir` (created on demand).
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Returns the output directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Renders and writes both artifacts.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails or a file cannot be written.
    pub async fn write(&self, snapshot: &TopologySnapshot) -> Result<Artifacts, ExportError> {
        let rows = rows(snapshot);
        log_summary(&rows);

        let csv = to_csv(&rows)?;
        let dot = to_dot(&rows)?;
        let artifacts = Artifacts {
            csv: self.dir.join(format!("topology_{}.csv", snapshot.timestamp)),
            dot: self.dir.join(format!("topology_{}.dot", snapshot.timestamp)),
        };

        let dir = self.dir.clone();
        let paths = artifacts.clone();
        tokio::task::spawn_blocking(move || {
            std::fs::create_dir_all(&dir).map_err(|source| ExportError::Write {
                path: dir.clone(),
                source,
            })?;
            write_file(&paths.csv, &csv)?;
            write_file(&paths.dot, dot.as_bytes())
        })
        .await
        .map_err(|e| ExportError::Write {
            path: self.dir.clone(),
            source: std::io::Error::other(e),
        })??;

        tracing::info!(
            csv = %artifacts.csv.display(),
            dot = %artifacts.dot.display(),
            "Topology exported"
        );
        Ok(artifacts)
    }
}

fn write_file(path: &Path, content: &[u8]) -> Result<(), ExportError> {
    std::fs::write(path, content).map_err(|source| ExportError::Write {
        path: path.to_path_buf(),
        source,
    })
}

impl ExportHook for ArtifactWriter {
    async fn export(&self, snapshot: &TopologySnapshot) -> Result<(), ExportError> {
        self.write(snapshot).await.map(|_| ())
    }
}

/// Runs an external command, typically this tool's `discover` subcommand,
/// as a separate process.
///
/// The command inherits stdout/stderr. A non-zero exit status is reported as
/// [`ExportError::Status`]; the caller decides whether that matters.
#[derive(Clone)]
pub struct CommandHook {
    program: PathBuf,
    args: Vec<String>,
    envs: Vec<(String, String)>,
}

impl CommandHook {
    /// Creates a hook running `program` with `args`.
    #[must_use]
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            envs: Vec::new(),
        }
    }

    /// Adds an environment variable to the child process.
    ///
    /// Values are never logged, so this is the place for passwords.
    #[must_use]
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    /// Returns the program run by this hook.
    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Returns the arguments passed to the program.
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Returns the command line as a single display string.
    #[must_use]
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.display().to_string())
            .chain(self.args.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl std::fmt::Debug for CommandHook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let env_keys: Vec<&str> = self.envs.iter().map(|(k, _)| k.as_str()).collect();
        f.debug_struct("CommandHook")
            .field("program", &self.program)
            .field("args", &self.args)
            .field("envs", &env_keys)
            .finish()
    }
}

impl ExportHook for CommandHook {
    async fn export(&self, snapshot: &TopologySnapshot) -> Result<(), ExportError> {
        let command = self.command_line();
        tracing::info!(%command, "Running export command");

        let status = tokio::process::Command::new(&self.program)
            .args(&self.args)
            .envs(self.envs.iter().map(|(k, v)| (k, v)))
            .env(SNAPSHOT_TIMESTAMP_ENV, &snapshot.timestamp)
            .status()
            .await
            .map_err(|source| ExportError::Spawn {
                command: command.clone(),
                source,
            })?;

        if status.success() {
            tracing::info!(%command, "Export command finished");
            Ok(())
        } else {
            Err(ExportError::Status { command, status })
        }
    }
}
