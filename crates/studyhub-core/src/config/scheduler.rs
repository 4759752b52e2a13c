//! Schedule regeneration loop configuration.

use serde::{Deserialize, Serialize};

/// Periodic regeneration loop configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Whether the regeneration loop is enabled.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Interval in seconds between full regeneration runs.
    #[serde(default = "default_interval")]
    pub interval_seconds: u64,
    /// Delay in seconds before the first run after startup.
    #[serde(default = "default_startup_delay")]
    pub startup_delay_seconds: u64,
    /// Number of subjects regenerated concurrently within one run.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_seconds: default_interval(),
            startup_delay_seconds: default_startup_delay(),
            concurrency: default_concurrency(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_interval() -> u64 {
    3_600
}

fn default_startup_delay() -> u64 {
    300
}

fn default_concurrency() -> usize {
    4
}
