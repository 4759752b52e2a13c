//! In-memory notification and data message repositories.

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use studyhub_core::AppResult;
use studyhub_core::types::id::{MessageId, TaskId, UserId};
use studyhub_entity::message::{DataMessage, Notification};

use crate::traits::{DataMessageRepository, NotificationRepository};

type NotificationKey = (UserId, String, i64, i64, String, String, String);
type DataMessageKey = (UserId, String, i64, i64);

fn notification_key(notification: &Notification) -> NotificationKey {
    (
        notification.message.user_id,
        notification.message.source_id.clone(),
        notification.message.scheduled_time.timestamp_millis(),
        notification.message.ttl_seconds,
        notification.title.clone(),
        notification.body.clone(),
        notification.kind.clone(),
    )
}

fn data_message_key(message: &DataMessage) -> DataMessageKey {
    (
        message.message.user_id,
        message.message.source_id.clone(),
        message.message.scheduled_time.timestamp_millis(),
        message.message.ttl_seconds,
    )
}

/// Dashmap-backed notification repository with an atomic natural-key
/// index.
#[derive(Debug, Default)]
pub struct MemoryNotificationRepository {
    rows: DashMap<MessageId, Notification>,
    dedup_index: DashMap<NotificationKey, MessageId>,
}

impl MemoryNotificationRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    fn remove_row(&self, id: &MessageId) -> Option<Notification> {
        let (_, notification) = self.rows.remove(id)?;
        self.dedup_index.remove(&notification_key(&notification));
        Some(notification)
    }
}

#[async_trait]
impl NotificationRepository for MemoryNotificationRepository {
    async fn find_by_id(&self, id: &MessageId) -> AppResult<Option<Notification>> {
        Ok(self.rows.get(id).map(|row| row.clone()))
    }

    async fn find_by_user(&self, user_id: &UserId) -> AppResult<Vec<Notification>> {
        let mut notifications: Vec<Notification> = self
            .rows
            .iter()
            .filter(|row| row.message.user_id == *user_id)
            .map(|row| row.clone())
            .collect();
        notifications.sort_by_key(|n| n.message.scheduled_time);
        Ok(notifications)
    }

    async fn find_by_task(&self, task_id: &TaskId) -> AppResult<Vec<Notification>> {
        Ok(self
            .rows
            .iter()
            .filter(|row| row.message.task_id == Some(*task_id))
            .map(|row| row.clone())
            .collect())
    }

    async fn insert_if_absent(&self, notification: &Notification) -> AppResult<bool> {
        match self.dedup_index.entry(notification_key(notification)) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(vacant) => {
                self.rows.insert(notification.message.id, notification.clone());
                vacant.insert(notification.message.id);
                Ok(true)
            }
        }
    }

    async fn update(&self, notification: &Notification) -> AppResult<Notification> {
        if let Some(previous) = self.rows.insert(notification.message.id, notification.clone()) {
            self.dedup_index.remove(&notification_key(&previous));
        }
        self.dedup_index
            .insert(notification_key(notification), notification.message.id);
        Ok(notification.clone())
    }

    async fn delete(&self, id: &MessageId) -> AppResult<bool> {
        Ok(self.remove_row(id).is_some())
    }

    async fn delete_by_user(&self, user_id: &UserId) -> AppResult<u64> {
        let ids: Vec<MessageId> = self
            .rows
            .iter()
            .filter(|row| row.message.user_id == *user_id)
            .map(|row| row.message.id)
            .collect();
        let mut deleted = 0;
        for id in ids {
            if self.remove_row(&id).is_some() {
                deleted += 1;
            }
        }
        Ok(deleted)
    }
}

/// Dashmap-backed data message repository with an atomic natural-key
/// index.
#[derive(Debug, Default)]
pub struct MemoryDataMessageRepository {
    rows: DashMap<MessageId, DataMessage>,
    dedup_index: DashMap<DataMessageKey, MessageId>,
}

impl MemoryDataMessageRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    fn remove_row(&self, id: &MessageId) -> Option<DataMessage> {
        let (_, message) = self.rows.remove(id)?;
        self.dedup_index.remove(&data_message_key(&message));
        Some(message)
    }
}

#[async_trait]
impl DataMessageRepository for MemoryDataMessageRepository {
    async fn find_by_id(&self, id: &MessageId) -> AppResult<Option<DataMessage>> {
        Ok(self.rows.get(id).map(|row| row.clone()))
    }

    async fn find_by_user(&self, user_id: &UserId) -> AppResult<Vec<DataMessage>> {
        let mut messages: Vec<DataMessage> = self
            .rows
            .iter()
            .filter(|row| row.message.user_id == *user_id)
            .map(|row| row.clone())
            .collect();
        messages.sort_by_key(|m| m.message.scheduled_time);
        Ok(messages)
    }

    async fn insert_if_absent(&self, message: &DataMessage) -> AppResult<bool> {
        match self.dedup_index.entry(data_message_key(message)) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(vacant) => {
                self.rows.insert(message.message.id, message.clone());
                vacant.insert(message.message.id);
                Ok(true)
            }
        }
    }

    async fn update(&self, message: &DataMessage) -> AppResult<DataMessage> {
        if let Some(previous) = self.rows.insert(message.message.id, message.clone()) {
            self.dedup_index.remove(&data_message_key(&previous));
        }
        self.dedup_index
            .insert(data_message_key(message), message.message.id);
        Ok(message.clone())
    }

    async fn delete(&self, id: &MessageId) -> AppResult<bool> {
        Ok(self.remove_row(id).is_some())
    }

    async fn delete_by_user(&self, user_id: &UserId) -> AppResult<u64> {
        let ids: Vec<MessageId> = self
            .rows
            .iter()
            .filter(|row| row.message.user_id == *user_id)
            .map(|row| row.message.id)
            .collect();
        let mut deleted = 0;
        for id in ids {
            if self.remove_row(&id).is_some() {
                deleted += 1;
            }
        }
        Ok(deleted)
    }
}
