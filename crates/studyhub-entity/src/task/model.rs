//! Task entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use studyhub_core::types::id::{TaskId, UserId};

use super::state::TaskState;
use crate::protocol::AssessmentType;

/// One concrete scheduled occurrence of a questionnaire for a subject.
///
/// `(user_id, name, timestamp)` is the natural deduplication key: a task
/// with an equal triple must never be created twice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Unique task identifier.
    pub id: TaskId,
    /// The owning subject.
    pub user_id: UserId,
    /// Assessment name this task was generated from.
    pub name: String,
    /// Assessment category.
    pub assessment_type: AssessmentType,
    /// The instant the questionnaire becomes due.
    pub timestamp: DateTime<Utc>,
    /// How long the task stays open, in milliseconds.
    pub completion_window_millis: i64,
    /// Estimated completion duration in minutes.
    pub estimated_completion_minutes: Option<i32>,
    /// Whether the subject completed the questionnaire.
    pub completed: bool,
    /// When the questionnaire was completed.
    pub time_completed: Option<DateTime<Utc>>,
    /// Lifecycle state.
    pub status: TaskState,
    /// Display ordering / priority inherited from the assessment.
    pub order: i32,
    /// Number of questions.
    pub n_questions: Option<i32>,
    /// Whether the task appears in the subject's calendar view.
    pub show_in_calendar: bool,
    /// Whether this is a demo questionnaire.
    pub is_demo: bool,
    /// Whether this task is clinician-administered.
    pub is_clinical: bool,
    /// When the task row was created.
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// The instant the completion window closes.
    pub fn window_end(&self) -> DateTime<Utc> {
        self.timestamp + chrono::Duration::milliseconds(self.completion_window_millis)
    }

    /// Whether `other` refers to the same occurrence, i.e. shares the
    /// natural key.
    pub fn same_occurrence(&self, other: &Task) -> bool {
        self.user_id == other.user_id
            && self.name == other.name
            && self.timestamp == other.timestamp
    }
}
