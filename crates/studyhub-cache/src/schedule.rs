//! In-memory schedule cache implementation using the moka crate.

use std::sync::Arc;

use moka::future::Cache;
use tracing::debug;

use studyhub_core::config::cache::ScheduleCacheConfig;
use studyhub_entity::schedule::Schedule;

/// Capacity-bounded cache mapping subject ids to their last generated
/// [`Schedule`].
///
/// The cache is not a source of truth: it is rebuilt from nothing after a
/// restart, and a miss simply means the next generation run starts from
/// an empty previous schedule.
#[derive(Debug, Clone)]
pub struct ScheduleCache {
    cache: Cache<String, Arc<Schedule>>,
}

impl ScheduleCache {
    /// Create a cache from configuration.
    pub fn new(config: &ScheduleCacheConfig) -> Self {
        Self {
            cache: Cache::builder().max_capacity(config.capacity).build(),
        }
    }

    /// The last generated schedule for a subject, if cached.
    pub async fn get(&self, subject_id: &str) -> Option<Arc<Schedule>> {
        self.cache.get(subject_id).await
    }

    /// Store a freshly generated schedule for a subject.
    pub async fn insert(&self, subject_id: &str, schedule: Schedule) {
        self.cache
            .insert(subject_id.to_string(), Arc::new(schedule))
            .await;
    }

    /// Drop a subject's cached schedule, forcing the next generation run
    /// to start from empty. Called on protocol-version or timezone drift.
    pub async fn invalidate(&self, subject_id: &str) {
        debug!(subject = subject_id, "Invalidating cached schedule");
        self.cache.invalidate(subject_id).await;
    }

    /// Drop every cached schedule.
    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }

    /// Number of cached schedules (approximate under concurrency).
    pub fn len(&self) -> u64 {
        self.cache.entry_count()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
