//! # studyhub-worker
//!
//! The periodic regeneration loop: on a fixed interval, with an initial
//! startup delay, every known subject's schedule is regenerated through
//! the reconciliation service. Per-subject work runs under a bounded
//! concurrency limit and failures are isolated per subject.

mod runner;

pub use runner::RegenerationRunner;
