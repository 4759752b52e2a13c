//! Assessment definition DTOs.

use serde::{Deserialize, Serialize};

use super::rules::{
    NotificationProtocol, ReferenceTimestamp, ReminderTimePeriod, RepeatProtocol,
    RepeatQuestionnaire, TimePeriod,
};

/// Category of an assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AssessmentType {
    /// Administered by a clinician; never expanded into repeat occurrences.
    Clinical,
    /// A regular scheduled questionnaire.
    Simple,
    /// Wildcard used only in task queries, never in protocol documents.
    All,
}

/// Scheduling rules attached to an assessment. Every rule is optional; a
/// missing rule short-circuits the corresponding pipeline stage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssessmentProtocol {
    #[serde(default)]
    pub reference_timestamp: Option<ReferenceTimestamp>,
    #[serde(default)]
    pub repeat_protocol: Option<RepeatProtocol>,
    #[serde(default)]
    pub repeat_questionnaire: Option<RepeatQuestionnaire>,
    #[serde(default)]
    pub notification: Option<NotificationProtocol>,
    #[serde(default)]
    pub reminders: Option<ReminderTimePeriod>,
    /// How long a task stays open for completion. Defaults to 24 hours
    /// when absent.
    #[serde(default)]
    pub completion_window: Option<TimePeriod>,
}

/// Immutable definition of a questionnaire and its scheduling rules,
/// supplied by the external protocol source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assessment {
    /// Questionnaire name, unique within a protocol.
    pub name: String,
    /// Assessment category.
    #[serde(rename = "type")]
    pub assessment_type: AssessmentType,
    /// Display ordering / priority.
    #[serde(default)]
    pub order: i32,
    /// Number of questions in the questionnaire.
    #[serde(default)]
    pub n_questions: Option<i32>,
    /// Whether tasks generated from this assessment appear in the
    /// subject's calendar view.
    #[serde(default = "default_true")]
    pub show_in_calendar: bool,
    /// Whether this is a demo questionnaire.
    #[serde(default)]
    pub is_demo: bool,
    /// Estimated completion duration in minutes, used in notification text.
    #[serde(default)]
    pub estimated_completion_minutes: Option<i32>,
    /// Scheduling rules; may be absent for purely clinical assessments.
    #[serde(default)]
    pub protocol: Option<AssessmentProtocol>,
}

impl Assessment {
    /// Whether this assessment is clinician-administered.
    pub fn is_clinical(&self) -> bool {
        self.assessment_type == AssessmentType::Clinical
    }
}

fn default_true() -> bool {
    true
}
