//! In-memory state event stores.

use async_trait::async_trait;
use dashmap::DashMap;

use studyhub_core::AppResult;
use studyhub_core::types::id::{MessageId, TaskId};
use studyhub_entity::message::MessageStateEvent;
use studyhub_entity::task::TaskStateEvent;

use crate::traits::{MessageStateEventRepository, TaskStateEventRepository};

/// Dashmap-backed task state event store.
#[derive(Debug, Default)]
pub struct MemoryTaskStateEventRepository {
    events: DashMap<TaskId, Vec<TaskStateEvent>>,
}

impl MemoryTaskStateEventRepository {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskStateEventRepository for MemoryTaskStateEventRepository {
    async fn append(&self, event: &TaskStateEvent) -> AppResult<()> {
        self.events
            .entry(event.task_id)
            .or_default()
            .push(event.clone());
        Ok(())
    }

    async fn find_by_task(&self, task_id: &TaskId) -> AppResult<Vec<TaskStateEvent>> {
        Ok(self
            .events
            .get(task_id)
            .map(|events| events.clone())
            .unwrap_or_default())
    }

    async fn count_by_task(&self, task_id: &TaskId) -> AppResult<u64> {
        Ok(self
            .events
            .get(task_id)
            .map(|events| events.len() as u64)
            .unwrap_or(0))
    }
}

/// Dashmap-backed message state event store.
#[derive(Debug, Default)]
pub struct MemoryMessageStateEventRepository {
    events: DashMap<MessageId, Vec<MessageStateEvent>>,
}

impl MemoryMessageStateEventRepository {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessageStateEventRepository for MemoryMessageStateEventRepository {
    async fn append(&self, event: &MessageStateEvent) -> AppResult<()> {
        self.events
            .entry(event.message_id)
            .or_default()
            .push(event.clone());
        Ok(())
    }

    async fn find_by_message(&self, message_id: &MessageId) -> AppResult<Vec<MessageStateEvent>> {
        Ok(self
            .events
            .get(message_id)
            .map(|events| events.clone())
            .unwrap_or_default())
    }

    async fn count_by_message(&self, message_id: &MessageId) -> AppResult<u64> {
        Ok(self
            .events
            .get(message_id)
            .map(|events| events.len() as u64)
            .unwrap_or(0))
    }
}
