//! Builders for tasks and their notifications.

use chrono::{DateTime, Utc};

use studyhub_core::types::id::{MessageId, TaskId};
use studyhub_entity::message::{MessageFields, Notification};
use studyhub_entity::protocol::{Assessment, TimePeriod};
use studyhub_entity::task::{Task, TaskState};
use studyhub_entity::user::User;

use crate::time;

/// Default completion window when the protocol does not specify one: 24 h.
pub const DEFAULT_COMPLETION_WINDOW_MILLIS: i64 = 86_400_000;

/// Source id stamped onto generated messages.
const SCHEDULE_SOURCE_ID: &str = "schedule";

/// Resolve an optional completion-window rule into milliseconds.
pub fn completion_window_millis(window: Option<&TimePeriod>) -> i64 {
    window
        .map(|period| time::period_to_millis(*period))
        .unwrap_or(DEFAULT_COMPLETION_WINDOW_MILLIS)
}

/// Build a task for one occurrence of an assessment.
///
/// The task starts in [`TaskState::Unknown`] with `completed = false`;
/// persistence moves it to `ADDED`.
pub fn build_task(
    assessment: &Assessment,
    user: &User,
    timestamp: DateTime<Utc>,
    completion_window_millis: i64,
) -> Task {
    Task {
        id: TaskId::new(),
        user_id: user.id,
        name: assessment.name.clone(),
        assessment_type: assessment.assessment_type,
        timestamp,
        completion_window_millis,
        estimated_completion_minutes: assessment.estimated_completion_minutes,
        completed: false,
        time_completed: None,
        status: TaskState::Unknown,
        order: assessment.order,
        n_questions: assessment.n_questions,
        show_in_calendar: assessment.show_in_calendar,
        is_demo: assessment.is_demo,
        is_clinical: assessment.is_clinical(),
        created_at: Utc::now(),
    }
}

/// Build a notification for a task, scheduled at `scheduled_time`.
///
/// The TTL is derived from the task's completion window so the
/// notification expires no later than the task's completion deadline.
pub fn build_notification(
    task: &Task,
    scheduled_time: DateTime<Utc>,
    title: String,
    body: String,
    email_enabled: bool,
) -> Notification {
    let ttl_seconds = (task.window_end() - scheduled_time).num_seconds().max(0);
    Notification {
        message: MessageFields {
            id: MessageId::new(),
            user_id: task.user_id,
            task_id: Some(task.id),
            source_id: SCHEDULE_SOURCE_ID.to_string(),
            scheduled_time,
            ttl_seconds,
            provider_message_id: None,
            delivered: false,
            validated: false,
            dry_run: false,
            priority: None,
            mutable_content: false,
            created_at: Utc::now(),
        },
        title,
        body,
        kind: task.name.clone(),
        sound: Some("default".to_string()),
        badge: None,
        click_action: None,
        subtitle: None,
        icon: None,
        email_enabled,
        additional_data: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use studyhub_core::types::id::ProjectId;
    use studyhub_entity::protocol::{AssessmentType, RepeatUnit};

    fn assessment() -> Assessment {
        Assessment {
            name: "PHQ8".to_string(),
            assessment_type: AssessmentType::Simple,
            order: 1,
            n_questions: Some(8),
            show_in_calendar: true,
            is_demo: false,
            estimated_completion_minutes: Some(4),
            protocol: None,
        }
    }

    #[test]
    fn test_build_task_initial_state() {
        let user = User::new(ProjectId::new(), "sub-1", "Europe/London");
        let now = Utc::now();
        let task = build_task(&assessment(), &user, now, DEFAULT_COMPLETION_WINDOW_MILLIS);
        assert_eq!(task.status, TaskState::Unknown);
        assert!(!task.completed);
        assert_eq!(task.name, "PHQ8");
        assert_eq!(task.user_id, user.id);
        assert_eq!(task.window_end(), now + Duration::days(1));
    }

    #[test]
    fn test_notification_ttl_ends_with_completion_window() {
        let user = User::new(ProjectId::new(), "sub-1", "Europe/London");
        let task_time = Utc::now();
        let task = build_task(&assessment(), &user, task_time, DEFAULT_COMPLETION_WINDOW_MILLIS);

        // A reminder one hour after the task expires one hour sooner.
        let scheduled = task_time + Duration::hours(1);
        let notification =
            build_notification(&task, scheduled, "t".to_string(), "b".to_string(), false);
        assert_eq!(notification.message.ttl_seconds, 23 * 3_600);
        assert_eq!(notification.message.expires_at(), task.window_end());
        assert_eq!(notification.message.task_id, Some(task.id));
        assert_eq!(notification.kind, "PHQ8");
    }

    #[test]
    fn test_notification_ttl_never_negative() {
        let user = User::new(ProjectId::new(), "sub-1", "Europe/London");
        let task_time = Utc::now();
        let task = build_task(&assessment(), &user, task_time, 1_000);
        let scheduled = task_time + Duration::hours(2);
        let notification =
            build_notification(&task, scheduled, "t".to_string(), "b".to_string(), false);
        assert_eq!(notification.message.ttl_seconds, 0);
    }

    #[test]
    fn test_completion_window_default_and_rule() {
        assert_eq!(completion_window_millis(None), 86_400_000);
        let window = TimePeriod::new(RepeatUnit::Hour, 2);
        assert_eq!(completion_window_millis(Some(&window)), 7_200_000);
    }
}
