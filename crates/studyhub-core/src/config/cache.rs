//! Schedule cache configuration.

use serde::{Deserialize, Serialize};

/// Per-subject schedule cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleCacheConfig {
    /// Maximum number of cached per-subject schedules.
    #[serde(default = "default_capacity")]
    pub capacity: u64,
}

impl Default for ScheduleCacheConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
        }
    }
}

fn default_capacity() -> u64 {
    10_000
}
