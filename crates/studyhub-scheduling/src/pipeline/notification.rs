//! Notification generation: one "questionnaire due" notification per task.

use chrono::Utc;

use studyhub_core::AppResult;
use studyhub_entity::protocol::Assessment;
use studyhub_entity::schedule::AssessmentSchedule;
use studyhub_entity::user::User;

use crate::builder;
use crate::text::{self, NotificationKind};

/// Build one notification per task at the task's own timestamp, with
/// locale-aware text substitution. Notifications whose
/// `scheduled_time + ttl` has already elapsed are dropped.
///
/// Requires the notification rule, an estimated completion duration, and
/// a non-empty task list; anything missing yields an empty list.
pub fn generate(
    mut schedule: AssessmentSchedule,
    assessment: &Assessment,
    user: &User,
) -> AppResult<AssessmentSchedule> {
    let rule = assessment
        .protocol
        .as_ref()
        .and_then(|protocol| protocol.notification.as_ref());

    let (Some(rule), Some(estimated_minutes)) = (rule, assessment.estimated_completion_minutes)
    else {
        schedule.notifications = Some(Vec::new());
        return Ok(schedule);
    };

    let tasks = schedule.tasks.as_deref().unwrap_or_default();
    let language = user.language.as_deref();
    let title = text::title_text(language, rule.title.as_ref(), NotificationKind::Now);
    let body = text::body_text(
        language,
        rule.body.as_ref(),
        NotificationKind::Now,
        estimated_minutes,
    );

    let now = Utc::now();
    let notifications = tasks
        .iter()
        .map(|task| {
            builder::build_notification(
                task,
                task.timestamp,
                title.clone(),
                body.clone(),
                rule.email.enabled,
            )
        })
        .filter(|notification| now < notification.message.expires_at())
        .collect();

    schedule.notifications = Some(notifications);
    Ok(schedule)
}

/// Clear the notification list unconditionally. Used when the assessment
/// opts out of notifications.
pub fn clear(mut schedule: AssessmentSchedule) -> AssessmentSchedule {
    schedule.notifications = Some(Vec::new());
    schedule
}
