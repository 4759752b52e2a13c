//! Reminder generation: spaced follow-ups after each task.

use chrono::Utc;

use studyhub_core::AppResult;
use studyhub_entity::protocol::{Assessment, TimePeriod};
use studyhub_entity::schedule::AssessmentSchedule;
use studyhub_entity::user::User;

use crate::builder;
use crate::text::{self, NotificationKind};
use crate::time;

/// For each task, build `repeat` reminders at `spacing * slot` after the
/// task timestamp (slots are 1-based). Reminders whose
/// `scheduled_time + ttl` has already elapsed are dropped.
pub fn generate(
    mut schedule: AssessmentSchedule,
    assessment: &Assessment,
    user: &User,
) -> AppResult<AssessmentSchedule> {
    let timezone = time::parse_timezone(&user.timezone)?;
    let rule = assessment
        .protocol
        .as_ref()
        .and_then(|protocol| protocol.reminders.as_ref());

    let (Some(rule), Some(repeat)) = (rule, rule.and_then(|r| r.repeat)) else {
        schedule.reminders = Some(Vec::new());
        return Ok(schedule);
    };

    let tasks = schedule.tasks.as_deref().unwrap_or_default();
    let notification_rule = assessment
        .protocol
        .as_ref()
        .and_then(|protocol| protocol.notification.as_ref());
    let language = user.language.as_deref();
    let title = text::title_text(
        language,
        notification_rule.and_then(|rule| rule.title.as_ref()),
        NotificationKind::Reminder,
    );
    let body = text::body_text(
        language,
        notification_rule.and_then(|rule| rule.body.as_ref()),
        NotificationKind::Reminder,
        assessment.estimated_completion_minutes.unwrap_or_default(),
    );

    let now = Utc::now();
    let mut reminders = Vec::new();
    for task in tasks {
        for slot in 1..=repeat {
            let spacing = TimePeriod::new(rule.unit, rule.amount.saturating_mul(slot as i32));
            let scheduled = time::advance(task.timestamp, spacing, timezone);
            let reminder = builder::build_notification(
                task,
                scheduled,
                title.clone(),
                body.clone(),
                rule.email.enabled,
            );
            if now < reminder.message.expires_at() {
                reminders.push(reminder);
            }
        }
    }

    schedule.reminders = Some(reminders);
    Ok(schedule)
}
