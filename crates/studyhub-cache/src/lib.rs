//! # studyhub-cache
//!
//! The per-subject schedule cache. Schedules are a working index over the
//! persisted task and message rows — losing an entry only costs a
//! regeneration, so the cache is capacity-bounded and process-local with
//! explicit invalidation on protocol-version or timezone drift.

mod schedule;

pub use schedule::ScheduleCache;
