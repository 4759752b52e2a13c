//! Completed-questionnaire carry-over: regeneration must not lose a
//! subject's finished work.

use studyhub_core::AppResult;
use studyhub_entity::schedule::AssessmentSchedule;
use studyhub_entity::task::{Task, TaskState};
use studyhub_entity::user::User;

use crate::time;

/// Carries completion state from the previous generation onto matching
/// new tasks. Constructed with the subject's previous tasks and the
/// timezone that was active when they were generated.
#[derive(Debug, Clone)]
pub struct CompletedCarryOverStage {
    prev_tasks: Vec<Task>,
    prev_timezone: String,
}

impl CompletedCarryOverStage {
    /// Create the stage for one assessment's previous tasks.
    pub fn new(prev_tasks: Vec<Task>, prev_timezone: impl Into<String>) -> Self {
        Self {
            prev_tasks,
            prev_timezone: prev_timezone.into(),
        }
    }

    /// For every new task, search the previous tasks for a match on
    /// `(name, timestamp)` — translating the new timestamp into the
    /// previous timezone's base offset first when the timezone changed —
    /// and copy completion state from a COMPLETED match.
    pub fn apply(
        &self,
        mut schedule: AssessmentSchedule,
        user: &User,
    ) -> AppResult<AssessmentSchedule> {
        if self.prev_tasks.is_empty() {
            return Ok(schedule);
        }

        let timezone_changed = self.prev_timezone != user.timezone;
        let offset_shift = if timezone_changed {
            let new_tz = time::parse_timezone(&user.timezone)?;
            let prev_tz = time::parse_timezone(&self.prev_timezone)?;
            Some((new_tz, prev_tz))
        } else {
            None
        };

        if let Some(tasks) = schedule.tasks.as_mut() {
            for task in tasks.iter_mut() {
                let lookup_timestamp = match offset_shift {
                    Some((new_tz, prev_tz)) => {
                        task.timestamp
                            + time::base_offset_difference(new_tz, prev_tz, task.timestamp)
                    }
                    None => task.timestamp,
                };

                let matching = self
                    .prev_tasks
                    .iter()
                    .find(|prev| prev.name == task.name && prev.timestamp == lookup_timestamp);

                if let Some(prev) = matching {
                    if prev.status == TaskState::Completed {
                        task.completed = true;
                        task.time_completed = prev.time_completed;
                        task.status = TaskState::Completed;
                    }
                }
            }
        }

        Ok(schedule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder;
    use crate::pipeline::fixtures;
    use chrono::{DateTime, Duration, Utc};

    fn completed(mut task: Task) -> Task {
        task.completed = true;
        task.status = TaskState::Completed;
        task.time_completed = Some(task.timestamp + Duration::minutes(5));
        task
    }

    fn schedule_with(tasks: Vec<Task>) -> AssessmentSchedule {
        let mut schedule = AssessmentSchedule::default();
        schedule.tasks = Some(tasks);
        schedule
    }

    #[test]
    fn test_same_timezone_match_copies_completion() {
        let user = fixtures::user("Europe/London");
        let assessment = fixtures::weekly_assessment("PHQ8");
        let at = Utc::now();
        let prev = completed(builder::build_task(&assessment, &user, at, 86_400_000));
        let fresh = builder::build_task(&assessment, &user, at, 86_400_000);

        let stage = CompletedCarryOverStage::new(vec![prev.clone()], "Europe/London");
        let schedule = stage.apply(schedule_with(vec![fresh]), &user).unwrap();
        let task = &schedule.tasks.unwrap()[0];
        assert!(task.completed);
        assert_eq!(task.status, TaskState::Completed);
        assert_eq!(task.time_completed, prev.time_completed);
    }

    #[test]
    fn test_timezone_change_translates_timestamp_before_matching() {
        let assessment = fixtures::weekly_assessment("PHQ8");
        let london_user = fixtures::user("Europe/London");
        // Task generated at midnight London wall clock.
        let london_midnight = "2024-01-08T00:00:00Z".parse::<DateTime<Utc>>().unwrap();
        let prev = completed(builder::build_task(
            &assessment,
            &london_user,
            london_midnight,
            86_400_000,
        ));

        // After moving to New York, the regenerated occurrence falls at
        // midnight New York wall clock: five hours later in UTC.
        let mut ny_user = fixtures::user("America/New_York");
        ny_user.id = london_user.id;
        let ny_midnight = london_midnight + Duration::hours(5);
        let fresh = builder::build_task(&assessment, &ny_user, ny_midnight, 86_400_000);

        let stage = CompletedCarryOverStage::new(vec![prev.clone()], "Europe/London");
        let schedule = stage.apply(schedule_with(vec![fresh]), &ny_user).unwrap();
        let task = &schedule.tasks.unwrap()[0];
        assert!(task.completed);
        assert_eq!(task.time_completed, prev.time_completed);
    }

    #[test]
    fn test_incomplete_previous_task_is_not_carried() {
        let user = fixtures::user("Europe/London");
        let assessment = fixtures::weekly_assessment("PHQ8");
        let at = Utc::now();
        let prev = builder::build_task(&assessment, &user, at, 86_400_000);
        let fresh = builder::build_task(&assessment, &user, at, 86_400_000);

        let stage = CompletedCarryOverStage::new(vec![prev], "Europe/London");
        let schedule = stage.apply(schedule_with(vec![fresh]), &user).unwrap();
        assert!(!schedule.tasks.unwrap()[0].completed);
    }

    #[test]
    fn test_no_match_on_different_name() {
        let user = fixtures::user("Europe/London");
        let at = Utc::now();
        let prev = completed(builder::build_task(
            &fixtures::weekly_assessment("RSES"),
            &user,
            at,
            86_400_000,
        ));
        let fresh = builder::build_task(&fixtures::weekly_assessment("PHQ8"), &user, at, 86_400_000);

        let stage = CompletedCarryOverStage::new(vec![prev], "Europe/London");
        let schedule = stage.apply(schedule_with(vec![fresh]), &user).unwrap();
        assert!(!schedule.tasks.unwrap()[0].completed);
    }
}
