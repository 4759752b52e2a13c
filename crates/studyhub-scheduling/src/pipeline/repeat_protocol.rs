//! Repeat-protocol expansion: the anchor becomes a clamped occurrence
//! series.

use chrono::{DateTime, Datelike, Utc};
use chrono_tz::Tz;

use studyhub_core::AppResult;
use studyhub_entity::protocol::{Assessment, DayOfWeek, RepeatProtocol, RepeatUnit, TimePeriod};
use studyhub_entity::schedule::AssessmentSchedule;
use studyhub_entity::user::User;

use crate::time;

/// Occurrences are clamped to one week either side of the current
/// instant.
const WINDOW: TimePeriod = TimePeriod {
    unit: RepeatUnit::Week,
    amount: 1,
};
const WINDOW_BACK: TimePeriod = TimePeriod {
    unit: RepeatUnit::Week,
    amount: -1,
};

/// Absolute guard against misconfigured repeat rules running away.
const MAX_YEAR: i32 = 2030;

/// Expand the reference timestamp into occurrence timestamps by repeated
/// advancing, clamped to `[now - 1 week, now + 1 week]` and bounded by
/// [`MAX_YEAR`].
///
/// A missing repeat-protocol rule or reference timestamp leaves the
/// occurrence list absent; downstream stages treat that as "no tasks".
pub fn expand(
    mut schedule: AssessmentSchedule,
    assessment: &Assessment,
    user: &User,
) -> AppResult<AssessmentSchedule> {
    let timezone = time::parse_timezone(&user.timezone)?;
    let rule = assessment
        .protocol
        .as_ref()
        .and_then(|protocol| protocol.repeat_protocol.as_ref());

    let (Some(rule), Some(reference)) = (rule, schedule.reference_timestamp) else {
        tracing::debug!(
            assessment = %assessment.name,
            "No repeat protocol to expand, leaving occurrences absent"
        );
        return Ok(schedule);
    };

    schedule.reference_timestamps = Some(occurrences(rule, reference, timezone));
    Ok(schedule)
}

fn occurrences(rule: &RepeatProtocol, reference: DateTime<Utc>, timezone: Tz) -> Vec<DateTime<Utc>> {
    let step = rule.time_period();
    let now = Utc::now();
    let window_start = time::advance(now, WINDOW_BACK, timezone);
    let window_end = time::advance(now, WINDOW, timezone);

    let mut current = fast_forward(reference, step, window_start, timezone);
    let mut timestamps = Vec::new();
    while current < window_end && time::local_year(current, timezone) < MAX_YEAR {
        timestamps.push(current);
        let next = time::advance(current, step, timezone);
        if next <= current {
            // zero or backwards step: a single occurrence is all the rule
            // can meaningfully produce
            break;
        }
        current = next;
    }

    match &rule.days_of_week {
        Some(allowed) => timestamps
            .into_iter()
            .filter(|occurrence| {
                let weekday: DayOfWeek =
                    occurrence.with_timezone(&timezone).weekday().into();
                allowed.contains(&weekday)
            })
            .collect(),
        None => timestamps,
    }
}

/// Advance the reference until it enters the backwards clamp window.
fn fast_forward(
    reference: DateTime<Utc>,
    step: TimePeriod,
    window_start: DateTime<Utc>,
    timezone: Tz,
) -> DateTime<Utc> {
    let mut current = reference;
    while current < window_start {
        let next = time::advance(current, step, timezone);
        if next <= current {
            break;
        }
        current = next;
    }
    current
}
