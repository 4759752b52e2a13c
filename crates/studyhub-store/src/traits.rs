//! Repository traits for the persistence collaborator.
//!
//! The dedup-check-then-insert sequence must be effectively atomic per
//! natural key, so every deduplicated entity exposes `insert_if_absent`
//! rather than separate exists/insert calls: `false` means the natural
//! key was already taken and the row was not written.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use studyhub_core::AppResult;
use studyhub_core::types::filter::FilterField;
use studyhub_core::types::id::{MessageId, ProjectId, TaskId, UserId};
use studyhub_entity::message::{DataMessage, MessageStateEvent, Notification};
use studyhub_entity::project::Project;
use studyhub_entity::protocol::AssessmentType;
use studyhub_entity::task::{Task, TaskStateEvent};
use studyhub_entity::user::User;

/// Repository for study participants.
#[async_trait]
pub trait UserRepository: Send + Sync + 'static {
    /// Find a user by primary key.
    async fn find_by_id(&self, id: &UserId) -> AppResult<Option<User>>;

    /// Find a user by external subject id.
    async fn find_by_subject_id(&self, subject_id: &str) -> AppResult<Option<User>>;

    /// Find a user by subject id within a project.
    async fn find_by_subject_and_project(
        &self,
        subject_id: &str,
        project_id: &ProjectId,
    ) -> AppResult<Option<User>>;

    /// All known users.
    async fn find_all(&self) -> AppResult<Vec<User>>;

    /// Insert or update a user and return the stored value.
    async fn save(&self, user: &User) -> AppResult<User>;
}

/// Repository for projects.
#[async_trait]
pub trait ProjectRepository: Send + Sync + 'static {
    /// Find a project by primary key.
    async fn find_by_id(&self, id: &ProjectId) -> AppResult<Option<Project>>;

    /// Find a project by its unique name.
    async fn find_by_name(&self, name: &str) -> AppResult<Option<Project>>;

    /// Insert or update a project and return the stored value.
    async fn save(&self, project: &Project) -> AppResult<Project>;
}

/// Repository for scheduled tasks. Natural key: `(user, name, timestamp)`.
#[async_trait]
pub trait TaskRepository: Send + Sync + 'static {
    /// Find a task by primary key.
    async fn find_by_id(&self, id: &TaskId) -> AppResult<Option<Task>>;

    /// All tasks owned by a user.
    async fn find_by_user(&self, user_id: &UserId) -> AppResult<Vec<Task>>;

    /// Tasks owned by a user, narrowed by type and free-text filter
    /// conditions joined with AND.
    async fn find_by_filter(
        &self,
        user_id: &UserId,
        assessment_type: Option<AssessmentType>,
        fields: &[FilterField],
    ) -> AppResult<Vec<Task>>;

    /// Whether a task with the given natural key exists.
    async fn exists_for_occurrence(
        &self,
        user_id: &UserId,
        name: &str,
        timestamp: DateTime<Utc>,
    ) -> AppResult<bool>;

    /// Insert the task unless its natural key is already taken. Returns
    /// `true` when the row was written.
    async fn insert_if_absent(&self, task: &Task) -> AppResult<bool>;

    /// Update an existing task and return the stored value.
    async fn update(&self, task: &Task) -> AppResult<Task>;

    /// Delete a task by primary key. Returns `true` if deleted.
    async fn delete(&self, id: &TaskId) -> AppResult<bool>;

    /// Delete all of a user's tasks. Returns the number deleted.
    async fn delete_by_user(&self, user_id: &UserId) -> AppResult<u64>;

    /// Delete the given tasks. Returns the number deleted.
    async fn delete_many(&self, ids: &[TaskId]) -> AppResult<u64>;
}

/// Repository for notifications. Natural key:
/// `(user, source, scheduled time, ttl, title, body, kind)`.
#[async_trait]
pub trait NotificationRepository: Send + Sync + 'static {
    /// Find a notification by primary key.
    async fn find_by_id(&self, id: &MessageId) -> AppResult<Option<Notification>>;

    /// All notifications owned by a user.
    async fn find_by_user(&self, user_id: &UserId) -> AppResult<Vec<Notification>>;

    /// All notifications attached to a task.
    async fn find_by_task(&self, task_id: &TaskId) -> AppResult<Vec<Notification>>;

    /// Insert the notification unless its natural key is already taken.
    /// Returns `true` when the row was written.
    async fn insert_if_absent(&self, notification: &Notification) -> AppResult<bool>;

    /// Update an existing notification and return the stored value.
    async fn update(&self, notification: &Notification) -> AppResult<Notification>;

    /// Delete a notification by primary key. Returns `true` if deleted.
    async fn delete(&self, id: &MessageId) -> AppResult<bool>;

    /// Delete all of a user's notifications. Returns the number deleted.
    async fn delete_by_user(&self, user_id: &UserId) -> AppResult<u64>;
}

/// Repository for data messages. Natural key:
/// `(user, source, scheduled time, ttl)`.
#[async_trait]
pub trait DataMessageRepository: Send + Sync + 'static {
    /// Find a data message by primary key.
    async fn find_by_id(&self, id: &MessageId) -> AppResult<Option<DataMessage>>;

    /// All data messages owned by a user.
    async fn find_by_user(&self, user_id: &UserId) -> AppResult<Vec<DataMessage>>;

    /// Insert the data message unless its natural key is already taken.
    /// Returns `true` when the row was written.
    async fn insert_if_absent(&self, message: &DataMessage) -> AppResult<bool>;

    /// Update an existing data message and return the stored value.
    async fn update(&self, message: &DataMessage) -> AppResult<DataMessage>;

    /// Delete a data message by primary key. Returns `true` if deleted.
    async fn delete(&self, id: &MessageId) -> AppResult<bool>;

    /// Delete all of a user's data messages. Returns the number deleted.
    async fn delete_by_user(&self, user_id: &UserId) -> AppResult<u64>;
}

/// Append-only store of task state events.
#[async_trait]
pub trait TaskStateEventRepository: Send + Sync + 'static {
    /// Append an event.
    async fn append(&self, event: &TaskStateEvent) -> AppResult<()>;

    /// Events recorded for a task, oldest first.
    async fn find_by_task(&self, task_id: &TaskId) -> AppResult<Vec<TaskStateEvent>>;

    /// Number of events recorded for a task.
    async fn count_by_task(&self, task_id: &TaskId) -> AppResult<u64>;
}

/// Append-only store of message state events.
#[async_trait]
pub trait MessageStateEventRepository: Send + Sync + 'static {
    /// Append an event.
    async fn append(&self, event: &MessageStateEvent) -> AppResult<()>;

    /// Events recorded for a message, oldest first.
    async fn find_by_message(&self, message_id: &MessageId) -> AppResult<Vec<MessageStateEvent>>;

    /// Number of events recorded for a message.
    async fn count_by_message(&self, message_id: &MessageId) -> AppResult<u64>;
}
