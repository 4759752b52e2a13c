//! Caching layer with last-known-good fallback.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use moka::future::Cache;
use tracing::warn;

use studyhub_core::config::protocol::ProtocolSourceConfig;
use studyhub_core::{AppError, AppResult};
use studyhub_entity::protocol::Protocol;

use crate::fetcher::ProtocolFetcher;
use crate::source::ProtocolSource;

/// A [`ProtocolSource`] that caches fetched documents and falls back to
/// the last successfully fetched copy when the upstream is unreachable.
///
/// The TTL cache answers repeat lookups without touching the network; the
/// last-known-good table never expires and is only replaced by a newer
/// successful fetch. A transient error is surfaced to the caller only
/// when no fallback copy exists.
pub struct CachingProtocolSource<F> {
    fetcher: F,
    /// TTL cache; `None` when `cache_ttl_seconds` is zero.
    fresh: Option<Cache<String, Arc<Protocol>>>,
    last_good: DashMap<String, Arc<Protocol>>,
}

impl<F: ProtocolFetcher> CachingProtocolSource<F> {
    /// Wrap a fetcher with caching per configuration.
    pub fn new(fetcher: F, config: &ProtocolSourceConfig) -> Self {
        let fresh = (config.cache_ttl_seconds > 0).then(|| {
            Cache::builder()
                .max_capacity(config.cache_capacity)
                .time_to_live(Duration::from_secs(config.cache_ttl_seconds))
                .build()
        });
        Self {
            fetcher,
            fresh,
            last_good: DashMap::new(),
        }
    }

    async fn resolve(
        &self,
        cache_key: String,
        fetch: impl Future<Output = AppResult<Protocol>>,
    ) -> AppResult<Protocol> {
        if let Some(fresh) = &self.fresh {
            if let Some(cached) = fresh.get(&cache_key).await {
                return Ok((*cached).clone());
            }
        }

        match fetch.await {
            Ok(protocol) => {
                let shared = Arc::new(protocol);
                if let Some(fresh) = &self.fresh {
                    fresh.insert(cache_key.clone(), Arc::clone(&shared)).await;
                }
                self.last_good.insert(cache_key, Arc::clone(&shared));
                Ok((*shared).clone())
            }
            Err(error) if error.is_transient() => match self.last_good.get(&cache_key) {
                Some(stale) => {
                    warn!(key = %cache_key, %error, "Protocol source unavailable, serving last-known-good copy");
                    Ok((**stale).clone())
                }
                None => Err(error),
            },
            Err(error) => Err(error),
        }
    }
}

#[async_trait]
impl<F: ProtocolFetcher> ProtocolSource for CachingProtocolSource<F> {
    async fn protocol_for_subject(&self, subject_id: &str) -> AppResult<Protocol> {
        self.resolve(
            format!("subject:{subject_id}"),
            self.fetcher.fetch_for_subject(subject_id),
        )
        .await
    }

    async fn protocol_for_project(&self, project_name: &str) -> AppResult<Protocol> {
        self.resolve(
            format!("project:{project_name}"),
            self.fetcher.fetch_for_project(project_name),
        )
        .await
    }
}

impl<F> std::fmt::Debug for CachingProtocolSource<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachingProtocolSource").finish()
    }
}
