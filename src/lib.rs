//! Argus: network topology discovery and drift monitor
//!
//! A library for discovering a network's physical topology over SSH from
//! LLDP/CDP neighbor data, persisting it as snapshots and detecting when
//! it drifts between discovery cycles.

pub mod config;
pub mod export;
pub mod monitor;
pub mod parser;
pub mod probe;
pub mod shell;
pub mod store;
pub mod time;
pub mod topology;
