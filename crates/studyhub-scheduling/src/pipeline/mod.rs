//! The protocol handler pipeline.
//!
//! A pipeline run threads one [`AssessmentSchedule`] through an ordered
//! list of stages. The stage set is a closed enum — stage selection is a
//! variant dispatch on assessment type and rule presence, never runtime
//! registration. Ordering is significant and fixed: each stage consumes a
//! field populated by an earlier one.

mod carryover;
mod notification;
mod reference;
mod reminder;
mod repeat_protocol;
mod repeat_questionnaire;

use studyhub_core::AppResult;
use studyhub_entity::protocol::Assessment;
use studyhub_entity::schedule::AssessmentSchedule;
use studyhub_entity::task::Task;
use studyhub_entity::user::User;

pub use carryover::CompletedCarryOverStage;

/// One stage of the protocol handler pipeline.
#[derive(Debug, Clone)]
pub enum ProtocolStage {
    /// Resolve the anchor instant and copy the assessment name.
    ReferenceTimestamp,
    /// Clinical assessments only carry their name; no expansion happens.
    ClinicalReference,
    /// Expand the anchor into clamped repeat occurrences.
    RepeatProtocol,
    /// One task per fixed offset per occurrence.
    FixedRepeatQuestionnaire,
    /// One task per random-range sample per occurrence.
    RandomRepeatQuestionnaire,
    /// Offsets looked up by the occurrence's local weekday.
    DayOfWeekRepeatQuestionnaire,
    /// One "questionnaire due" notification per task.
    Notification,
    /// Explicit opt-out: clears the notification list unconditionally.
    DisabledNotification,
    /// Spaced reminder notifications after each task.
    Reminder,
    /// Carry completion state forward from the previous generation.
    CompletedCarryOver(CompletedCarryOverStage),
}

impl ProtocolStage {
    /// Apply this stage to the schedule-so-far.
    pub fn apply(
        &self,
        schedule: AssessmentSchedule,
        assessment: &Assessment,
        user: &User,
    ) -> AppResult<AssessmentSchedule> {
        match self {
            Self::ReferenceTimestamp => reference::resolve_reference(schedule, assessment, user),
            Self::ClinicalReference => Ok(reference::copy_name(schedule, assessment)),
            Self::RepeatProtocol => repeat_protocol::expand(schedule, assessment, user),
            Self::FixedRepeatQuestionnaire => {
                repeat_questionnaire::fixed_offsets(schedule, assessment, user)
            }
            Self::RandomRepeatQuestionnaire => {
                repeat_questionnaire::random_offsets(schedule, assessment, user)
            }
            Self::DayOfWeekRepeatQuestionnaire => {
                repeat_questionnaire::day_of_week_offsets(schedule, assessment, user)
            }
            Self::Notification => notification::generate(schedule, assessment, user),
            Self::DisabledNotification => Ok(notification::clear(schedule)),
            Self::Reminder => reminder::generate(schedule, assessment, user),
            Self::CompletedCarryOver(stage) => stage.apply(schedule, user),
        }
    }
}

/// Select the stages for an assessment, in their fixed order.
pub fn stages_for(
    assessment: &Assessment,
    prev_tasks: Vec<Task>,
    prev_timezone: &str,
) -> Vec<ProtocolStage> {
    if assessment.is_clinical() {
        return vec![ProtocolStage::ClinicalReference];
    }

    let mut stages = vec![ProtocolStage::ReferenceTimestamp, ProtocolStage::RepeatProtocol];

    stages.push(questionnaire_stage(assessment));

    if let Some(rule) = assessment
        .protocol
        .as_ref()
        .and_then(|protocol| protocol.notification.as_ref())
    {
        stages.push(if rule.enabled {
            ProtocolStage::Notification
        } else {
            ProtocolStage::DisabledNotification
        });
    }

    stages.push(ProtocolStage::Reminder);
    stages.push(ProtocolStage::CompletedCarryOver(CompletedCarryOverStage::new(
        prev_tasks,
        prev_timezone,
    )));
    stages
}

/// Pick the questionnaire-expansion variant from the rule shape: the
/// day-of-week map wins over random ranges, which win over fixed offsets.
fn questionnaire_stage(assessment: &Assessment) -> ProtocolStage {
    let rule = assessment
        .protocol
        .as_ref()
        .and_then(|protocol| protocol.repeat_questionnaire.as_ref());
    match rule {
        Some(rule) if rule.day_of_week_map.is_some() => {
            ProtocolStage::DayOfWeekRepeatQuestionnaire
        }
        Some(rule) if rule.random_units_from_zero_between.is_some() => {
            ProtocolStage::RandomRepeatQuestionnaire
        }
        _ => ProtocolStage::FixedRepeatQuestionnaire,
    }
}

/// Run the stages over a fresh schedule.
pub fn run(
    stages: &[ProtocolStage],
    assessment: &Assessment,
    user: &User,
) -> AppResult<AssessmentSchedule> {
    let mut schedule = AssessmentSchedule::default();
    for stage in stages {
        schedule = stage.apply(schedule, assessment, user)?;
    }
    Ok(schedule)
}
