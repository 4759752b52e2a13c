//! One-shot trigger runtime on top of `tokio-cron-scheduler`.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{debug, error};
use uuid::Uuid;

use studyhub_core::traits::trigger::{DeliverySink, TriggerPayload, TriggerScheduler};
use studyhub_core::{AppError, AppResult};

#[derive(Debug, Clone)]
struct RegisteredTrigger {
    scheduler_job_id: Uuid,
    trigger_id: String,
    fires_at: DateTime<Utc>,
}

/// A generic "fire job at time T" facility.
///
/// Each registered job is a one-shot scheduler entry that, when it fires,
/// removes itself from the registry and hands its payload to the
/// [`DeliverySink`]. A fire time in the past fires on the next scheduler
/// tick.
pub struct OneShotTriggerRuntime {
    scheduler: JobScheduler,
    sink: Arc<dyn DeliverySink>,
    registered: Arc<DashMap<String, RegisteredTrigger>>,
}

impl OneShotTriggerRuntime {
    /// Create and start the runtime, delivering fired payloads to `sink`.
    pub async fn start(sink: Arc<dyn DeliverySink>) -> AppResult<Self> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::scheduling(format!("Failed to create trigger runtime: {e}")))?;
        scheduler
            .start()
            .await
            .map_err(|e| AppError::scheduling(format!("Failed to start trigger runtime: {e}")))?;

        Ok(Self {
            scheduler,
            sink,
            registered: Arc::new(DashMap::new()),
        })
    }

    /// Stop the runtime. Pending triggers are dropped; that is safe
    /// because trigger registrations are rebuilt from the persisted
    /// message rows on the next generation run.
    pub async fn shutdown(&self) -> AppResult<()> {
        let mut scheduler = self.scheduler.clone();
        scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::scheduling(format!("Failed to shut down trigger runtime: {e}")))?;
        self.registered.clear();
        Ok(())
    }

    /// Number of currently registered triggers.
    pub fn len(&self) -> usize {
        self.registered.len()
    }

    /// Whether no triggers are registered.
    pub fn is_empty(&self) -> bool {
        self.registered.is_empty()
    }

    async fn add_one_shot(
        &self,
        job_id: &str,
        fires_at: DateTime<Utc>,
        payload: TriggerPayload,
    ) -> AppResult<Uuid> {
        let delay = (fires_at - Utc::now())
            .to_std()
            .unwrap_or(std::time::Duration::ZERO);

        let sink = Arc::clone(&self.sink);
        let registered = Arc::clone(&self.registered);
        let job_key = job_id.to_string();
        let job = Job::new_one_shot_async(delay, move |_uuid, _scheduler| {
            let sink = Arc::clone(&sink);
            let registered = Arc::clone(&registered);
            let payload = payload.clone();
            let job_key = job_key.clone();
            Box::pin(async move {
                registered.remove(&job_key);
                debug!(job = %job_key, message = %payload.message_id, "Trigger fired");
                if let Err(e) = sink.deliver(&payload).await {
                    error!(job = %job_key, "Delivery failed: {e}");
                }
            })
        })
        .map_err(|e| AppError::scheduling(format!("Failed to create one-shot trigger: {e}")))?;

        self.scheduler
            .add(job)
            .await
            .map_err(|e| AppError::scheduling(format!("Failed to add one-shot trigger: {e}")))
    }
}

#[async_trait]
impl TriggerScheduler for OneShotTriggerRuntime {
    async fn register_one_shot(
        &self,
        job_id: &str,
        trigger_id: &str,
        fires_at: DateTime<Utc>,
        payload: TriggerPayload,
    ) -> AppResult<()> {
        if self.registered.contains_key(job_id) {
            return Err(AppError::scheduling(format!(
                "Job '{job_id}' is already registered"
            )));
        }

        let scheduler_job_id = self.add_one_shot(job_id, fires_at, payload).await?;
        self.registered.insert(
            job_id.to_string(),
            RegisteredTrigger {
                scheduler_job_id,
                trigger_id: trigger_id.to_string(),
                fires_at,
            },
        );
        debug!(job = job_id, %fires_at, "Registered one-shot trigger");
        Ok(())
    }

    async fn update_job(
        &self,
        job_id: &str,
        trigger_id: &str,
        fires_at: DateTime<Utc>,
        payload: TriggerPayload,
    ) -> AppResult<()> {
        let existing = self.registered.remove(job_id).ok_or_else(|| {
            AppError::scheduling(format!("Cannot update unknown job '{job_id}'"))
        })?;
        if let Err(e) = self.scheduler.remove(&existing.1.scheduler_job_id).await {
            debug!(job = job_id, "Stale scheduler entry on update: {e}");
        }

        let scheduler_job_id = self.add_one_shot(job_id, fires_at, payload).await?;
        self.registered.insert(
            job_id.to_string(),
            RegisteredTrigger {
                scheduler_job_id,
                trigger_id: trigger_id.to_string(),
                fires_at,
            },
        );
        debug!(job = job_id, %fires_at, "Re-pointed trigger");
        Ok(())
    }

    async fn cancel_job(&self, job_id: &str) -> AppResult<()> {
        match self.registered.remove(job_id) {
            Some((_, entry)) => {
                self.scheduler.remove(&entry.scheduler_job_id).await.map_err(|e| {
                    AppError::scheduling(format!("Failed to cancel job '{job_id}': {e}"))
                })?;
                debug!(
                    job = job_id,
                    trigger = %entry.trigger_id,
                    fires_at = %entry.fires_at,
                    "Cancelled trigger"
                );
                Ok(())
            }
            // Cancelling a non-existent job is a no-op.
            None => Ok(()),
        }
    }

    async fn job_exists(&self, job_id: &str) -> AppResult<bool> {
        Ok(self.registered.contains_key(job_id))
    }
}

impl std::fmt::Debug for OneShotTriggerRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OneShotTriggerRuntime")
            .field("registered", &self.registered.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;
    use studyhub_core::types::id::MessageId;
    use studyhub_core::types::message_kind::MessageKind;

    #[derive(Debug, Default)]
    struct RecordingSink {
        delivered: Mutex<Vec<TriggerPayload>>,
    }

    #[async_trait]
    impl DeliverySink for RecordingSink {
        async fn deliver(&self, payload: &TriggerPayload) -> AppResult<()> {
            self.delivered.lock().unwrap().push(payload.clone());
            Ok(())
        }
    }

    fn payload() -> TriggerPayload {
        TriggerPayload {
            subject_id: "sub-1".to_string(),
            project_id: "project-1".to_string(),
            message_id: MessageId::new(),
            message_kind: MessageKind::Notification,
        }
    }

    #[tokio::test]
    async fn test_register_and_fire() {
        let sink = Arc::new(RecordingSink::default());
        let runtime = OneShotTriggerRuntime::start(Arc::clone(&sink) as Arc<dyn DeliverySink>)
            .await
            .unwrap();

        let sent = payload();
        runtime
            .register_one_shot("job-1", "trigger-1", Utc::now(), sent.clone())
            .await
            .unwrap();
        assert!(runtime.job_exists("job-1").await.unwrap());

        tokio::time::sleep(Duration::from_secs(2)).await;
        let delivered = sink.delivered.lock().unwrap().clone();
        assert_eq!(delivered, vec![sent]);
        assert!(!runtime.job_exists("job-1").await.unwrap());

        runtime.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_duplicate_registration_is_rejected() {
        let sink = Arc::new(RecordingSink::default());
        let runtime = OneShotTriggerRuntime::start(sink).await.unwrap();

        let fires_at = Utc::now() + chrono::Duration::hours(1);
        runtime
            .register_one_shot("job-1", "trigger-1", fires_at, payload())
            .await
            .unwrap();
        let err = runtime
            .register_one_shot("job-1", "trigger-1", fires_at, payload())
            .await
            .unwrap_err();
        assert_eq!(err.kind, studyhub_core::error::ErrorKind::Scheduling);

        runtime.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_cancel_is_idempotent() {
        let sink = Arc::new(RecordingSink::default());
        let runtime = OneShotTriggerRuntime::start(sink).await.unwrap();

        runtime
            .register_one_shot(
                "job-1",
                "trigger-1",
                Utc::now() + chrono::Duration::hours(1),
                payload(),
            )
            .await
            .unwrap();
        runtime.cancel_job("job-1").await.unwrap();
        assert!(!runtime.job_exists("job-1").await.unwrap());

        // Cancelling again, or cancelling something never registered, is
        // a no-op.
        runtime.cancel_job("job-1").await.unwrap();
        runtime.cancel_job("never-registered").await.unwrap();

        runtime.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_update_re_points_existing_job() {
        let sink = Arc::new(RecordingSink::default());
        let runtime = OneShotTriggerRuntime::start(sink).await.unwrap();

        let fires_at = Utc::now() + chrono::Duration::hours(1);
        runtime
            .register_one_shot("job-1", "trigger-1", fires_at, payload())
            .await
            .unwrap();
        runtime
            .update_job(
                "job-1",
                "trigger-1",
                fires_at + chrono::Duration::hours(1),
                payload(),
            )
            .await
            .unwrap();
        assert!(runtime.job_exists("job-1").await.unwrap());
        assert_eq!(runtime.len(), 1);

        let err = runtime
            .update_job("unknown", "trigger", fires_at, payload())
            .await
            .unwrap_err();
        assert_eq!(err.kind, studyhub_core::error::ErrorKind::Scheduling);

        runtime.shutdown().await.unwrap();
    }
}
