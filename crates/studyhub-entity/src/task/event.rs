//! Task state event entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use studyhub_core::types::id::{StateEventId, TaskId};

use super::state::TaskState;

/// Append-only audit record of a task state change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskStateEvent {
    /// Unique event identifier.
    pub id: StateEventId,
    /// The task the event refers to.
    pub task_id: TaskId,
    /// The reported state.
    pub state: TaskState,
    /// When the state change happened.
    pub time: DateTime<Utc>,
    /// Free-text information attached by the reporter.
    pub associated_info: Option<String>,
}

impl TaskStateEvent {
    /// Create a new event for the given task.
    pub fn new(task_id: TaskId, state: TaskState, time: DateTime<Utc>) -> Self {
        Self {
            id: StateEventId::new(),
            task_id,
            state,
            time,
            associated_info: None,
        }
    }

    /// Attach free-text associated info.
    pub fn with_info(mut self, info: impl Into<String>) -> Self {
        self.associated_info = Some(info.into());
        self
    }
}
