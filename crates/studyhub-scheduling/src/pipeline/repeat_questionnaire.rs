//! Repeat-questionnaire expansion: occurrences become tasks.

use chrono::Datelike;
use rand::Rng;

use studyhub_core::AppResult;
use studyhub_entity::protocol::{Assessment, DayOfWeek, RepeatQuestionnaire, TimePeriod};
use studyhub_entity::schedule::AssessmentSchedule;
use studyhub_entity::user::User;

use crate::builder;
use crate::time;

/// One task per fixed offset per occurrence.
pub fn fixed_offsets(
    schedule: AssessmentSchedule,
    assessment: &Assessment,
    user: &User,
) -> AppResult<AssessmentSchedule> {
    expand_with(schedule, assessment, user, |rule, _| {
        rule.units_from_zero.clone().unwrap_or_default()
    })
}

/// One task per random-range sample per occurrence. Each offset is a
/// uniform pick within its inclusive `[low, high]` range, sampled
/// independently per occurrence.
pub fn random_offsets(
    schedule: AssessmentSchedule,
    assessment: &Assessment,
    user: &User,
) -> AppResult<AssessmentSchedule> {
    expand_with(schedule, assessment, user, |rule, _| {
        let mut rng = rand::rng();
        rule.random_units_from_zero_between
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|range| {
                let low = range.low.min(range.high);
                let high = range.low.max(range.high);
                rng.random_range(low..=high)
            })
            .collect()
    })
}

/// Offsets looked up by the occurrence's local weekday. Occurrences whose
/// weekday is missing from the map produce no tasks.
pub fn day_of_week_offsets(
    schedule: AssessmentSchedule,
    assessment: &Assessment,
    user: &User,
) -> AppResult<AssessmentSchedule> {
    expand_with(schedule, assessment, user, |rule, weekday| {
        rule.day_of_week_map
            .as_ref()
            .and_then(|map| map.get(&weekday))
            .cloned()
            .unwrap_or_default()
    })
}

/// Shared expansion skeleton: resolve offsets per occurrence, advance by
/// each offset, and build one task per resulting instant.
fn expand_with(
    mut schedule: AssessmentSchedule,
    assessment: &Assessment,
    user: &User,
    offsets_for: impl Fn(&RepeatQuestionnaire, DayOfWeek) -> Vec<i32>,
) -> AppResult<AssessmentSchedule> {
    let timezone = time::parse_timezone(&user.timezone)?;
    let rule = assessment
        .protocol
        .as_ref()
        .and_then(|protocol| protocol.repeat_questionnaire.as_ref());

    let occurrences = schedule.reference_timestamps.clone();
    let (Some(rule), Some(occurrences)) = (rule, occurrences) else {
        schedule.tasks = Some(Vec::new());
        return Ok(schedule);
    };

    let window = builder::completion_window_millis(
        assessment
            .protocol
            .as_ref()
            .and_then(|protocol| protocol.completion_window.as_ref()),
    );

    let mut tasks = Vec::new();
    for occurrence in occurrences {
        let weekday: DayOfWeek = occurrence.with_timezone(&timezone).weekday().into();
        for offset in offsets_for(rule, weekday) {
            let task_time = time::advance(occurrence, TimePeriod::new(rule.unit, offset), timezone);
            tasks.push(builder::build_task(assessment, user, task_time, window));
        }
    }
    schedule.tasks = Some(tasks);
    Ok(schedule)
}
