//! Time abstraction and snapshot timestamps.
//!
//! This module provides a [`Clock`] trait that allows injecting mock clocks
//! in tests while using the real system clock in production, plus the
//! sortable timestamp format used to name snapshot files.

use std::time::SystemTime;

use chrono::{DateTime, Local, NaiveDateTime, TimeDelta};

/// Format of snapshot timestamps: local time, second resolution.
///
/// Lexicographic order equals chronological order.
pub const SNAPSHOT_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Abstraction over system time for testability.
///
/// # Example
///
/// ```
/// use argus_topo::time::{Clock, SystemClock};
///
/// let clock = SystemClock;
/// let now = clock.now();
/// assert!(now >= std::time::SystemTime::UNIX_EPOCH);
/// ```
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> SystemTime;
}

/// Production clock using actual system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// Formats a point in time as a snapshot timestamp (`YYYYMMDD_HHMMSS`).
///
/// ```
/// use argus_topo::time::snapshot_timestamp;
///
/// let ts = snapshot_timestamp(std::time::SystemTime::now());
/// assert_eq!(ts.len(), 15);
/// assert_eq!(&ts[8..9], "_");
/// ```
#[must_use]
pub fn snapshot_timestamp(at: SystemTime) -> String {
    DateTime::<Local>::from(at)
        .format(SNAPSHOT_TIMESTAMP_FORMAT)
        .to_string()
}

/// Highest same-second suffix; `_10` would sort before `_9`.
const MAX_SUFFIX: u32 = 9;

/// Returns a timestamp for `at` that sorts strictly after `previous`.
///
/// Two cycles finishing within the same second would otherwise share a
/// snapshot name; the later one gets a numeric suffix (`_1`, `_2`, ...),
/// which still sorts before the next second. When the clock is behind
/// `previous` (or the suffixes run out), the result is one second past
/// `previous`.
#[must_use]
pub fn next_snapshot_timestamp(at: SystemTime, previous: Option<&str>) -> String {
    let base = snapshot_timestamp(at);
    let Some(previous) = previous else {
        return base;
    };
    if base.as_str() > previous {
        return base;
    }

    let (previous_base, previous_suffix) = split_suffix(previous);
    if base == previous_base {
        let suffix = previous_suffix.map_or(Some(1), |n| n.checked_add(1));
        if let Some(suffix) = suffix.filter(|n| *n <= MAX_SUFFIX) {
            let candidate = format!("{base}_{suffix}");
            if candidate.as_str() > previous {
                return candidate;
            }
        }
    }

    NaiveDateTime::parse_from_str(previous_base, SNAPSHOT_TIMESTAMP_FORMAT)
        .ok()
        .and_then(|t| t.checked_add_signed(TimeDelta::seconds(1)))
        .map(|t| t.format(SNAPSHOT_TIMESTAMP_FORMAT).to_string())
        .filter(|candidate| candidate.as_str() > previous)
        .unwrap_or_else(|| format!("{previous}_1"))
}

/// Splits `YYYYMMDD_HHMMSS_N` into its timestamp and numeric suffix.
fn split_suffix(timestamp: &str) -> (&str, Option<u32>) {
    const BASE_LEN: usize = "YYYYMMDD_HHMMSS".len();

    match (timestamp.get(..BASE_LEN), timestamp.get(BASE_LEN..)) {
        (Some(base), Some("")) => (base, None),
        (Some(base), Some(rest)) => (base, rest.strip_prefix('_').and_then(|n| n.parse().ok())),
        _ => (timestamp, None),
    }
}
