//! Protocol source configuration.

use serde::{Deserialize, Serialize};

/// Remote protocol-definition source configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtocolSourceConfig {
    /// Base URL of the protocol document store.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Request timeout in seconds for protocol fetches.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    /// How long a fetched protocol stays fresh in the cache.
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_seconds: u64,
    /// Maximum number of cached protocol documents.
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: u64,
}

impl Default for ProtocolSourceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout(),
            cache_ttl_seconds: default_cache_ttl(),
            cache_capacity: default_cache_capacity(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8080/protocols".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_cache_ttl() -> u64 {
    3_600
}

fn default_cache_capacity() -> u64 {
    1_000
}
