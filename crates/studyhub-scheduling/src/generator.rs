//! Per-subject schedule generation over the handler pipeline.

use tracing::warn;

use studyhub_core::AppResult;
use studyhub_entity::protocol::{Assessment, Protocol};
use studyhub_entity::schedule::{AssessmentSchedule, Schedule};
use studyhub_entity::task::Task;
use studyhub_entity::user::User;

use crate::pipeline;

/// Runs the protocol handler pipeline for every assessment in a
/// subject's protocol.
#[derive(Debug, Clone, Default)]
pub struct ScheduleGenerator;

impl ScheduleGenerator {
    /// Create a new generator.
    pub fn new() -> Self {
        Self
    }

    /// Generate a full schedule for a subject.
    ///
    /// A configuration error in one assessment is logged and skipped; it
    /// never aborts the subject's other assessments.
    pub fn generate_for_user(
        &self,
        user: &User,
        protocol: &Protocol,
        prev_schedule: &Schedule,
    ) -> Schedule {
        let prev_timezone = prev_schedule
            .timezone
            .clone()
            .unwrap_or_else(|| user.timezone.clone());

        let mut assessment_schedules = Vec::with_capacity(protocol.assessments.len());
        for assessment in &protocol.assessments {
            let prev_tasks = prev_schedule.tasks_for_assessment(&assessment.name);
            match self.generate_single(assessment, user, prev_tasks, &prev_timezone) {
                Ok(schedule) => assessment_schedules.push(schedule),
                Err(error) => warn!(
                    assessment = %assessment.name,
                    subject = %user.subject_id,
                    %error,
                    "Skipping assessment: schedule generation failed"
                ),
            }
        }

        Schedule::new(
            assessment_schedules,
            protocol.version.clone(),
            user.timezone.clone(),
        )
    }

    /// Generate the schedule for a single assessment, given the subject's
    /// previous tasks and the timezone they were generated under.
    pub fn generate_single(
        &self,
        assessment: &Assessment,
        user: &User,
        prev_tasks: Vec<Task>,
        prev_timezone: &str,
    ) -> AppResult<AssessmentSchedule> {
        let stages = pipeline::stages_for(assessment, prev_tasks, prev_timezone);
        pipeline::run(&stages, assessment, user)
    }
}
