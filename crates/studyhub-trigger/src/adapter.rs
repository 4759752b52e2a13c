//! Maps persisted messages onto delivery trigger registrations.

use std::sync::Arc;

use tracing::debug;

use studyhub_core::AppResult;
use studyhub_core::traits::trigger::{TriggerPayload, TriggerScheduler};
use studyhub_core::types::id::MessageId;
use studyhub_entity::message::Message;
use studyhub_entity::user::User;

use crate::naming;

/// Schedules, re-points, and cancels delivery triggers for messages.
///
/// Job and trigger identities derive from `(subject, message id)`, so
/// scheduling an already scheduled message is a silent no-op.
#[derive(Clone)]
pub struct MessageTriggerAdapter {
    scheduler: Arc<dyn TriggerScheduler>,
}

impl std::fmt::Debug for MessageTriggerAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageTriggerAdapter").finish()
    }
}

impl MessageTriggerAdapter {
    /// Create an adapter over the given trigger facility.
    pub fn new(scheduler: Arc<dyn TriggerScheduler>) -> Self {
        Self { scheduler }
    }

    /// Register a one-shot trigger firing at the message's scheduled
    /// time. A message whose job already exists is skipped silently.
    pub async fn schedule(&self, message: &Message, user: &User) -> AppResult<()> {
        let job_id = naming::message_job_key(&user.subject_id, &message.id());
        if self.scheduler.job_exists(&job_id).await? {
            debug!(job = %job_id, "Message already scheduled");
            return Ok(());
        }

        let trigger_id = naming::message_trigger_key(&user.subject_id, &message.id());
        self.scheduler
            .register_one_shot(
                &job_id,
                &trigger_id,
                message.scheduled_time(),
                payload_for(message, user),
            )
            .await
    }

    /// Schedule a batch of messages with the same idempotence rules.
    pub async fn schedule_multiple(&self, messages: &[Message], user: &User) -> AppResult<()> {
        for message in messages {
            self.schedule(message, user).await?;
        }
        Ok(())
    }

    /// Re-point the existing trigger's payload and fire time without
    /// changing its identity.
    pub async fn update_scheduled(&self, message: &Message, user: &User) -> AppResult<()> {
        let job_id = naming::message_job_key(&user.subject_id, &message.id());
        let trigger_id = naming::message_trigger_key(&user.subject_id, &message.id());
        self.scheduler
            .update_job(
                &job_id,
                &trigger_id,
                message.scheduled_time(),
                payload_for(message, user),
            )
            .await
    }

    /// Remove a message's job and trigger. Deleting a message that was
    /// never scheduled is not an error.
    pub async fn delete_scheduled(&self, message_id: &MessageId, user: &User) -> AppResult<()> {
        self.scheduler
            .cancel_job(&naming::message_job_key(&user.subject_id, message_id))
            .await
    }

    /// Remove jobs and triggers for a batch of messages.
    pub async fn delete_scheduled_multiple(
        &self,
        message_ids: &[MessageId],
        user: &User,
    ) -> AppResult<()> {
        for message_id in message_ids {
            self.delete_scheduled(message_id, user).await?;
        }
        Ok(())
    }
}

fn payload_for(message: &Message, user: &User) -> TriggerPayload {
    TriggerPayload {
        subject_id: user.subject_id.clone(),
        project_id: user.project_id.to_string(),
        message_id: message.id(),
        message_kind: message.kind(),
    }
}
