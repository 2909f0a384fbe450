//! Statistics and metrics for relay registries

pub mod metrics;

pub use metrics::{RelayStats, StatsSnapshot};
