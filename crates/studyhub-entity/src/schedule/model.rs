//! Working schedule objects produced by the handler pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::message::Notification;
use crate::task::Task;

/// The per-assessment working result of running the handler pipeline.
///
/// Every field starts absent and is filled incrementally by successive
/// pipeline stages. A later stage finding a required field absent treats
/// it as "nothing to do", not as an error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssessmentSchedule {
    /// Assessment name, set by the reference-timestamp stage.
    pub name: Option<String>,
    /// The resolved anchor instant.
    pub reference_timestamp: Option<DateTime<Utc>>,
    /// One occurrence instant per repeat-protocol step.
    pub reference_timestamps: Option<Vec<DateTime<Utc>>>,
    /// Generated tasks, one per questionnaire offset per occurrence.
    pub tasks: Option<Vec<Task>>,
    /// "Questionnaire due" notifications, one per task.
    pub notifications: Option<Vec<Notification>>,
    /// Reminder notifications following each task.
    pub reminders: Option<Vec<Notification>>,
}

impl AssessmentSchedule {
    /// Whether the pipeline produced any tasks for this assessment.
    pub fn has_tasks(&self) -> bool {
        self.tasks.as_ref().is_some_and(|tasks| !tasks.is_empty())
    }
}

/// The per-subject aggregate of assessment schedules, tagged with the
/// protocol version and timezone it was generated from.
///
/// Schedules live only in the bounded schedule cache; the persisted task
/// and message rows are the source of truth.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Schedule {
    /// One entry per assessment in the subject's protocol.
    pub assessment_schedules: Vec<AssessmentSchedule>,
    /// Protocol version this schedule was generated from.
    pub version: Option<String>,
    /// IANA timezone active at generation time.
    pub timezone: Option<String>,
}

impl Schedule {
    /// Create a schedule generated from the given version and timezone.
    pub fn new(
        assessment_schedules: Vec<AssessmentSchedule>,
        version: Option<String>,
        timezone: impl Into<String>,
    ) -> Self {
        Self {
            assessment_schedules,
            version,
            timezone: Some(timezone.into()),
        }
    }

    /// The previously generated tasks for the named assessment, if any.
    pub fn tasks_for_assessment(&self, name: &str) -> Vec<Task> {
        self.assessment_schedules
            .iter()
            .filter(|schedule| schedule.name.as_deref() == Some(name))
            .flat_map(|schedule| schedule.tasks.clone().unwrap_or_default())
            .collect()
    }

    /// Append an assessment schedule generated ad hoc.
    pub fn push_assessment_schedule(&mut self, schedule: AssessmentSchedule) {
        self.assessment_schedules.push(schedule);
    }
}
