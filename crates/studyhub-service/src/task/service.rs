//! Task management with natural-key deduplication.

use std::sync::Arc;

use chrono::Utc;
use tracing::debug;

use studyhub_core::types::filter::FilterField;
use studyhub_core::types::id::{TaskId, UserId};
use studyhub_core::{AppError, AppResult};
use studyhub_entity::protocol::AssessmentType;
use studyhub_entity::task::{Task, TaskState, TaskStateEvent};
use studyhub_entity::user::User;
use studyhub_store::traits::{TaskRepository, TaskStateEventRepository};

/// Manages task rows and their lifecycle transitions.
///
/// Two creation paths exist deliberately: [`TaskService::add_tasks`] is
/// the generation path, where a natural-key duplicate is routine and
/// silently skipped, while [`TaskService::add_task`] is the direct
/// external path, where a duplicate is an error.
#[derive(Clone)]
pub struct TaskService {
    task_repo: Arc<dyn TaskRepository>,
    event_repo: Arc<dyn TaskStateEventRepository>,
}

impl TaskService {
    /// Create a new task service.
    pub fn new(
        task_repo: Arc<dyn TaskRepository>,
        event_repo: Arc<dyn TaskStateEventRepository>,
    ) -> Self {
        Self {
            task_repo,
            event_repo,
        }
    }

    /// Fetch a task or fail with not-found.
    pub async fn get_task(&self, id: &TaskId) -> AppResult<Task> {
        self.task_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Task {id} not found")))
    }

    /// All tasks owned by a user, ordered by timestamp.
    pub async fn get_tasks_by_user(&self, user: &User) -> AppResult<Vec<Task>> {
        self.task_repo.find_by_user(&user.id).await
    }

    /// Tasks narrowed by type and AND-joined filter conditions.
    pub async fn get_tasks_by_filter(
        &self,
        user: &User,
        assessment_type: Option<AssessmentType>,
        fields: &[FilterField],
    ) -> AppResult<Vec<Task>> {
        self.task_repo
            .find_by_filter(&user.id, assessment_type, fields)
            .await
    }

    /// Directly create a single task. A natural-key duplicate is
    /// rejected, unlike the generation path.
    pub async fn add_task(&self, task: Task) -> AppResult<Task> {
        let task = prepared(task);
        if !self.task_repo.insert_if_absent(&task).await? {
            return Err(AppError::already_exists(format!(
                "Task '{}' at {} already exists for this user",
                task.name, task.timestamp
            )));
        }
        self.record_added(&task).await?;
        Ok(task)
    }

    /// Persist generated tasks, silently skipping natural-key duplicates.
    /// Returns the tasks that were actually inserted.
    pub async fn add_tasks(&self, tasks: Vec<Task>, user: &User) -> AppResult<Vec<Task>> {
        let mut inserted = Vec::new();
        for task in tasks {
            let task = prepared(task);
            if self.task_repo.insert_if_absent(&task).await? {
                self.record_added(&task).await?;
                inserted.push(task);
            } else {
                debug!(
                    subject = %user.subject_id,
                    name = %task.name,
                    timestamp = %task.timestamp,
                    "Skipping duplicate task occurrence"
                );
            }
        }
        Ok(inserted)
    }

    /// Move a task to a new lifecycle state. A COMPLETED transition also
    /// stamps the completion flag and instant.
    pub async fn update_task_status(&self, task: &Task, state: TaskState) -> AppResult<Task> {
        let mut task = self.get_task(&task.id).await?;
        if state == TaskState::Completed {
            task.completed = true;
            task.time_completed = Some(Utc::now());
        }
        task.status = state;
        self.task_repo.update(&task).await
    }

    /// Record a state event for a task. Events recorded here are the
    /// server's own bookkeeping; externally reported events go through
    /// the state event service and its cap.
    pub async fn record_event(&self, event: &TaskStateEvent) -> AppResult<()> {
        self.event_repo.append(event).await
    }

    /// Delete all of a user's tasks. Returns the number deleted.
    pub async fn delete_tasks_by_user(&self, user_id: &UserId) -> AppResult<u64> {
        self.task_repo.delete_by_user(user_id).await
    }

    /// Delete tasks matched by type and filter conditions. Returns the
    /// deleted tasks so callers can clean up attached messages.
    pub async fn delete_tasks_by_filter(
        &self,
        user: &User,
        assessment_type: Option<AssessmentType>,
        fields: &[FilterField],
    ) -> AppResult<Vec<Task>> {
        let tasks = self
            .get_tasks_by_filter(user, assessment_type, fields)
            .await?;
        let ids: Vec<TaskId> = tasks.iter().map(|task| task.id).collect();
        self.task_repo.delete_many(&ids).await?;
        Ok(tasks)
    }

    async fn record_added(&self, task: &Task) -> AppResult<()> {
        self.event_repo
            .append(&TaskStateEvent::new(task.id, TaskState::Added, Utc::now()))
            .await
    }
}

/// A freshly built task enters persistence as ADDED; carried-over
/// completion state is preserved.
fn prepared(mut task: Task) -> Task {
    if task.status == TaskState::Unknown {
        task.status = TaskState::Added;
    }
    task
}

impl std::fmt::Debug for TaskService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskService").finish()
    }
}
