//! Notification and data message management with trigger registration.

use std::sync::Arc;

use chrono::Utc;
use tracing::debug;

use studyhub_core::types::id::{MessageId, TaskId};
use studyhub_core::{AppError, AppResult};
use studyhub_entity::message::{
    DataMessage, Message, MessageState, MessageStateEvent, Notification,
};
use studyhub_entity::user::User;
use studyhub_store::traits::{
    DataMessageRepository, MessageStateEventRepository, NotificationRepository,
};
use studyhub_trigger::MessageTriggerAdapter;

/// Manages message rows and keeps the delivery triggers in step with
/// them: inserts register a trigger, updates re-point it, deletes cancel
/// it.
///
/// The same creation asymmetry as for tasks applies: the generation path
/// skips natural-key duplicates silently, the direct path rejects them.
#[derive(Clone)]
pub struct MessageService {
    notification_repo: Arc<dyn NotificationRepository>,
    data_repo: Arc<dyn DataMessageRepository>,
    event_repo: Arc<dyn MessageStateEventRepository>,
    trigger_adapter: Arc<MessageTriggerAdapter>,
}

impl MessageService {
    /// Create a new message service.
    pub fn new(
        notification_repo: Arc<dyn NotificationRepository>,
        data_repo: Arc<dyn DataMessageRepository>,
        event_repo: Arc<dyn MessageStateEventRepository>,
        trigger_adapter: Arc<MessageTriggerAdapter>,
    ) -> Self {
        Self {
            notification_repo,
            data_repo,
            event_repo,
            trigger_adapter,
        }
    }

    /// Fetch a notification or fail with not-found.
    pub async fn get_notification(&self, id: &MessageId) -> AppResult<Notification> {
        self.notification_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Notification {id} not found")))
    }

    /// All notifications owned by a user.
    pub async fn get_notifications_by_user(&self, user: &User) -> AppResult<Vec<Notification>> {
        self.notification_repo.find_by_user(&user.id).await
    }

    /// All data messages owned by a user.
    pub async fn get_data_messages_by_user(&self, user: &User) -> AppResult<Vec<DataMessage>> {
        self.data_repo.find_by_user(&user.id).await
    }

    /// Whether a message with the given id exists in either table.
    pub async fn message_exists(&self, id: &MessageId) -> AppResult<bool> {
        Ok(self.notification_repo.find_by_id(id).await?.is_some()
            || self.data_repo.find_by_id(id).await?.is_some())
    }

    /// Persist generated notifications, silently skipping natural-key
    /// duplicates, and register a delivery trigger for each inserted row.
    /// Returns the notifications that were actually inserted.
    pub async fn add_notifications(
        &self,
        notifications: Vec<Notification>,
        user: &User,
    ) -> AppResult<Vec<Notification>> {
        let mut inserted = Vec::new();
        for notification in notifications {
            if self.notification_repo.insert_if_absent(&notification).await? {
                self.record_event(notification.message.id, MessageState::Added)
                    .await?;
                inserted.push(notification);
            } else {
                debug!(
                    subject = %user.subject_id,
                    kind = %notification.kind,
                    scheduled = %notification.message.scheduled_time,
                    "Skipping duplicate notification"
                );
            }
        }

        let messages: Vec<Message> = inserted.iter().cloned().map(Message::from).collect();
        self.trigger_adapter.schedule_multiple(&messages, user).await?;
        Ok(inserted)
    }

    /// Directly create a notification. A natural-key duplicate is
    /// rejected, unlike the generation path.
    pub async fn create_notification(
        &self,
        notification: Notification,
        user: &User,
    ) -> AppResult<Notification> {
        if !self.notification_repo.insert_if_absent(&notification).await? {
            return Err(AppError::already_exists(
                "An identical notification is already scheduled for this user",
            ));
        }
        self.record_event(notification.message.id, MessageState::Added)
            .await?;
        self.trigger_adapter
            .schedule(&Message::from(notification.clone()), user)
            .await?;
        Ok(notification)
    }

    /// Update a notification and re-point its delivery trigger.
    pub async fn update_notification(
        &self,
        notification: Notification,
        user: &User,
    ) -> AppResult<Notification> {
        self.get_notification(&notification.message.id).await?;
        let stored = self.notification_repo.update(&notification).await?;
        self.record_event(stored.message.id, MessageState::Updated)
            .await?;
        self.trigger_adapter
            .update_scheduled(&Message::from(stored.clone()), user)
            .await?;
        Ok(stored)
    }

    /// Delete a notification and cancel its trigger. The CANCELLED state
    /// is internal-only and the row is gone, so no event is persisted.
    pub async fn delete_notification(&self, id: &MessageId, user: &User) -> AppResult<()> {
        if self.notification_repo.delete(id).await? {
            self.trigger_adapter.delete_scheduled(id, user).await?;
            debug!(message = %id, state = %MessageState::Cancelled, "Notification removed");
        }
        Ok(())
    }

    /// Delete every notification attached to a task, cancelling their
    /// triggers. Used by the COMPLETED cascade. Returns the number
    /// deleted.
    pub async fn delete_notifications_by_task(
        &self,
        task_id: &TaskId,
        user: &User,
    ) -> AppResult<u64> {
        let notifications = self.notification_repo.find_by_task(task_id).await?;
        let ids: Vec<MessageId> = notifications.iter().map(|n| n.message.id).collect();
        self.trigger_adapter
            .delete_scheduled_multiple(&ids, user)
            .await?;
        let mut deleted = 0;
        for id in &ids {
            if self.notification_repo.delete(id).await? {
                deleted += 1;
            }
        }
        Ok(deleted)
    }

    /// Persist generated data messages, silently skipping natural-key
    /// duplicates, and register triggers for inserted rows.
    pub async fn add_data_messages(
        &self,
        messages: Vec<DataMessage>,
        user: &User,
    ) -> AppResult<Vec<DataMessage>> {
        let mut inserted = Vec::new();
        for message in messages {
            if self.data_repo.insert_if_absent(&message).await? {
                self.record_event(message.message.id, MessageState::Added)
                    .await?;
                inserted.push(message);
            }
        }
        let messages: Vec<Message> = inserted.iter().cloned().map(Message::from).collect();
        self.trigger_adapter.schedule_multiple(&messages, user).await?;
        Ok(inserted)
    }

    /// Directly create a data message; duplicates are rejected.
    pub async fn create_data_message(
        &self,
        message: DataMessage,
        user: &User,
    ) -> AppResult<DataMessage> {
        if !self.data_repo.insert_if_absent(&message).await? {
            return Err(AppError::already_exists(
                "An identical data message is already scheduled for this user",
            ));
        }
        self.record_event(message.message.id, MessageState::Added)
            .await?;
        self.trigger_adapter
            .schedule(&Message::from(message.clone()), user)
            .await?;
        Ok(message)
    }

    /// Delete a data message and cancel its trigger.
    pub async fn delete_data_message(&self, id: &MessageId, user: &User) -> AppResult<()> {
        if self.data_repo.delete(id).await? {
            self.trigger_adapter.delete_scheduled(id, user).await?;
        }
        Ok(())
    }

    /// Delete all of a user's messages of both kinds, cancelling their
    /// triggers. Returns the number deleted.
    pub async fn delete_messages_by_user(&self, user: &User) -> AppResult<u64> {
        let notification_ids: Vec<MessageId> = self
            .notification_repo
            .find_by_user(&user.id)
            .await?
            .iter()
            .map(|n| n.message.id)
            .collect();
        let data_ids: Vec<MessageId> = self
            .data_repo
            .find_by_user(&user.id)
            .await?
            .iter()
            .map(|m| m.message.id)
            .collect();

        self.trigger_adapter
            .delete_scheduled_multiple(&notification_ids, user)
            .await?;
        self.trigger_adapter
            .delete_scheduled_multiple(&data_ids, user)
            .await?;

        let deleted = self.notification_repo.delete_by_user(&user.id).await?
            + self.data_repo.delete_by_user(&user.id).await?;
        Ok(deleted)
    }

    async fn record_event(&self, message_id: MessageId, state: MessageState) -> AppResult<()> {
        self.event_repo
            .append(&MessageStateEvent::new(message_id, state, Utc::now()))
            .await
    }
}

impl std::fmt::Debug for MessageService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageService").finish()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use dashmap::DashMap;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU64, Ordering};

    use studyhub_core::AppResult;
    use studyhub_core::traits::trigger::{TriggerPayload, TriggerScheduler};

    /// In-memory trigger facility used across the service tests.
    #[derive(Debug, Default)]
    pub struct FakeTriggerScheduler {
        pub jobs: DashMap<String, TriggerPayload>,
        pub registrations: AtomicU64,
    }

    impl FakeTriggerScheduler {
        pub fn registration_count(&self) -> u64 {
            self.registrations.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TriggerScheduler for FakeTriggerScheduler {
        async fn register_one_shot(
            &self,
            job_id: &str,
            _trigger_id: &str,
            _fires_at: DateTime<Utc>,
            payload: TriggerPayload,
        ) -> AppResult<()> {
            self.registrations.fetch_add(1, Ordering::SeqCst);
            self.jobs.insert(job_id.to_string(), payload);
            Ok(())
        }

        async fn update_job(
            &self,
            job_id: &str,
            _trigger_id: &str,
            _fires_at: DateTime<Utc>,
            payload: TriggerPayload,
        ) -> AppResult<()> {
            self.jobs.insert(job_id.to_string(), payload);
            Ok(())
        }

        async fn cancel_job(&self, job_id: &str) -> AppResult<()> {
            self.jobs.remove(job_id);
            Ok(())
        }

        async fn job_exists(&self, job_id: &str) -> AppResult<bool> {
            Ok(self.jobs.contains_key(job_id))
        }
    }

    pub fn fake_adapter() -> (
        Arc<FakeTriggerScheduler>,
        Arc<studyhub_trigger::MessageTriggerAdapter>,
    ) {
        let scheduler = Arc::new(FakeTriggerScheduler::default());
        let adapter = Arc::new(studyhub_trigger::MessageTriggerAdapter::new(
            Arc::clone(&scheduler) as Arc<dyn TriggerScheduler>,
        ));
        (scheduler, adapter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use studyhub_core::error::ErrorKind;
    use studyhub_core::types::id::ProjectId;
    use studyhub_entity::message::MessageFields;
    use studyhub_store::memory::{
        MemoryDataMessageRepository, MemoryMessageStateEventRepository,
        MemoryNotificationRepository,
    };

    use super::test_support::{FakeTriggerScheduler, fake_adapter};

    fn service() -> (Arc<FakeTriggerScheduler>, MessageService) {
        let (scheduler, adapter) = fake_adapter();
        let service = MessageService::new(
            Arc::new(MemoryNotificationRepository::new()),
            Arc::new(MemoryDataMessageRepository::new()),
            Arc::new(MemoryMessageStateEventRepository::new()),
            adapter,
        );
        (scheduler, service)
    }

    fn notification(user: &User) -> Notification {
        Notification {
            message: MessageFields::new(
                user.id,
                "schedule",
                Utc::now() + chrono::Duration::hours(1),
                600,
            ),
            title: "due".to_string(),
            body: "body".to_string(),
            kind: "PHQ8".to_string(),
            sound: None,
            badge: None,
            click_action: None,
            subtitle: None,
            icon: None,
            email_enabled: false,
            additional_data: None,
        }
    }

    #[tokio::test]
    async fn test_add_notifications_dedups_and_schedules_once() {
        let (scheduler, service) = service();
        let user = User::new(ProjectId::new(), "sub-1", "Europe/London");
        let first = notification(&user);
        let mut duplicate = first.clone();
        duplicate.message.id = MessageId::new();

        let inserted = service
            .add_notifications(vec![first, duplicate], &user)
            .await
            .unwrap();
        assert_eq!(inserted.len(), 1);
        assert_eq!(scheduler.registration_count(), 1);
    }

    #[tokio::test]
    async fn test_direct_duplicate_creation_is_rejected() {
        let (_, service) = service();
        let user = User::new(ProjectId::new(), "sub-1", "Europe/London");
        let first = notification(&user);
        let mut duplicate = first.clone();
        duplicate.message.id = MessageId::new();

        service.create_notification(first, &user).await.unwrap();
        let err = service
            .create_notification(duplicate, &user)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::AlreadyExists);
    }

    #[tokio::test]
    async fn test_delete_by_task_cancels_triggers() {
        let (scheduler, service) = service();
        let user = User::new(ProjectId::new(), "sub-1", "Europe/London");
        let task_id = TaskId::new();
        let mut owned = notification(&user);
        owned.message.task_id = Some(task_id);

        service
            .add_notifications(vec![owned], &user)
            .await
            .unwrap();
        assert_eq!(scheduler.jobs.len(), 1);

        let deleted = service
            .delete_notifications_by_task(&task_id, &user)
            .await
            .unwrap();
        assert_eq!(deleted, 1);
        assert!(scheduler.jobs.is_empty());
        assert!(service
            .get_notifications_by_user(&user)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_delete_messages_by_user_clears_both_kinds() {
        let (scheduler, service) = service();
        let user = User::new(ProjectId::new(), "sub-1", "Europe/London");
        service
            .add_notifications(vec![notification(&user)], &user)
            .await
            .unwrap();
        service
            .add_data_messages(
                vec![DataMessage {
                    message: MessageFields::new(user.id, "aRMT", Utc::now(), 600),
                    data: Default::default(),
                }],
                &user,
            )
            .await
            .unwrap();
        assert_eq!(scheduler.jobs.len(), 2);

        let deleted = service.delete_messages_by_user(&user).await.unwrap();
        assert_eq!(deleted, 2);
        assert!(scheduler.jobs.is_empty());
    }
}
