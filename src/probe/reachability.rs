//! Reachability checks using the system `ping` command.

use std::process::Stdio;
use std::time::Duration;

use crate::topology::DeviceAddress;

/// Extra time granted to the `ping` process beyond its own reply timeout.
const PROCESS_GRACE: Duration = Duration::from_secs(2);

/// Answers whether an address responds at the network layer.
///
/// Implementations never fail: any error counts as unreachable.
pub trait Reachability: Send + Sync {
    /// Returns true if `address` answered a single echo request.
    fn is_reachable(
        &self,
        address: &DeviceAddress,
    ) -> impl std::future::Future<Output = bool> + Send;
}

/// Reachability via one ICMP echo sent by the platform `ping` binary.
#[derive(Debug, Clone, Copy)]
pub struct PingProber {
    timeout: Duration,
}

impl PingProber {
    /// Creates a prober waiting at most `timeout` for the echo reply.
    #[must_use]
    pub const fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Returns the reply timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Reachability for PingProber {
    async fn is_reachable(&self, address: &DeviceAddress) -> bool {
        let mut command = tokio::process::Command::new("ping");
        command
            .args(ping_args(address.as_str(), self.timeout))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        match tokio::time::timeout(self.timeout + PROCESS_GRACE, command.status()).await {
            Ok(Ok(status)) => status.success(),
            Ok(Err(e)) => {
                tracing::debug!(address = %address, error = %e, "Failed to run ping");
                false
            }
            Err(_) => false,
        }
    }
}

/// Builds `ping` arguments for a single echo with a reply timeout.
#[cfg(windows)]
pub(crate) fn ping_args(host: &str, timeout: Duration) -> Vec<String> {
    let millis = timeout.as_millis().max(1);
    vec![
        "-n".to_string(),
        "1".to_string(),
        "-w".to_string(),
        millis.to_string(),
        host.to_string(),
    ]
}

/// Builds `ping` arguments for a single echo with a reply timeout.
#[cfg(not(windows))]
pub(crate) fn ping_args(host: &str, timeout: Duration) -> Vec<String> {
    let secs = timeout.as_secs().max(1);
    vec![
        "-c".to_string(),
        "1".to_string(),
        "-W".to_string(),
        secs.to_string(),
        host.to_string(),
    ]
}
