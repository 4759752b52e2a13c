//! Regeneration runner — the fixed-interval loop over all subjects.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Semaphore, watch};
use tokio::time;
use tracing::{error, info, warn};

use studyhub_core::config::scheduler::SchedulerConfig;
use studyhub_service::ScheduleService;
use studyhub_store::traits::UserRepository;

/// Counts from one regeneration sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepOutcome {
    /// Subjects regenerated successfully.
    pub succeeded: u64,
    /// Subjects whose regeneration failed and was skipped.
    pub failed: u64,
}

/// Periodically regenerates every subject's schedule.
///
/// A half-finished sweep is safe to abandon on shutdown: regeneration is
/// idempotent under natural-key deduplication and the drift path rebuilds
/// from scratch, so the next sweep simply resumes the work
/// (at-least-once semantics).
pub struct RegenerationRunner {
    schedule_service: Arc<ScheduleService>,
    user_repo: Arc<dyn UserRepository>,
    config: SchedulerConfig,
}

impl RegenerationRunner {
    /// Create a new runner.
    pub fn new(
        schedule_service: Arc<ScheduleService>,
        user_repo: Arc<dyn UserRepository>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            schedule_service,
            user_repo,
            config,
        }
    }

    /// Run until the cancel signal is received.
    pub async fn run(&self, mut cancel: watch::Receiver<bool>) {
        if !self.config.enabled {
            info!("Regeneration loop disabled by configuration");
            return;
        }

        info!(
            interval_seconds = self.config.interval_seconds,
            startup_delay_seconds = self.config.startup_delay_seconds,
            concurrency = self.config.concurrency,
            "Regeneration loop started"
        );

        let startup_delay = Duration::from_secs(self.config.startup_delay_seconds);
        tokio::select! {
            _ = cancel.changed() => {
                if *cancel.borrow() {
                    info!("Regeneration loop shutting down before first sweep");
                    return;
                }
            }
            _ = time::sleep(startup_delay) => {}
        }

        let interval = Duration::from_secs(self.config.interval_seconds);
        loop {
            let outcome = self.run_once().await;
            info!(
                succeeded = outcome.succeeded,
                failed = outcome.failed,
                "Regeneration sweep finished"
            );

            tokio::select! {
                _ = cancel.changed() => {
                    if *cancel.borrow() {
                        info!("Regeneration loop received shutdown signal");
                        break;
                    }
                }
                _ = time::sleep(interval) => {}
            }
        }
    }

    /// Regenerate every known subject once, bounded by the configured
    /// concurrency. One subject's failure never aborts the sweep.
    pub async fn run_once(&self) -> SweepOutcome {
        let users = match self.user_repo.find_all().await {
            Ok(users) => users,
            Err(e) => {
                error!("Cannot list subjects for regeneration sweep: {e}");
                return SweepOutcome::default();
            }
        };

        let semaphore = Arc::new(Semaphore::new(self.config.concurrency.max(1)));
        let mut handles = Vec::with_capacity(users.len());
        for user in users {
            let permit = match Arc::clone(&semaphore).acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => break,
            };
            let service = Arc::clone(&self.schedule_service);
            handles.push(tokio::spawn(async move {
                let _permit = permit;
                let subject_id = user.subject_id.clone();
                match service.generate_for_user(&user).await {
                    Ok(_) => true,
                    Err(e) => {
                        warn!(subject = %subject_id, "Schedule regeneration failed: {e}");
                        false
                    }
                }
            }));
        }

        let mut outcome = SweepOutcome::default();
        for handle in handles {
            match handle.await {
                Ok(true) => outcome.succeeded += 1,
                Ok(false) => outcome.failed += 1,
                Err(e) => {
                    error!("Regeneration task panicked: {e}");
                    outcome.failed += 1;
                }
            }
        }
        outcome
    }
}

impl std::fmt::Debug for RegenerationRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegenerationRunner")
            .field("config", &self.config)
            .finish()
    }
}
