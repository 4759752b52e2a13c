//! Reference-timestamp resolution: the pipeline's anchor stage.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

use studyhub_core::{AppError, AppResult};
use studyhub_entity::protocol::{Assessment, ReferenceTimestamp, ReferenceTimestampFormat};
use studyhub_entity::schedule::AssessmentSchedule;
use studyhub_entity::user::User;

use crate::time;

/// Resolve the assessment's anchor instant in the user's timezone and
/// copy the assessment name onto the schedule.
///
/// Falls back to the user's enrolment date truncated to local midnight
/// when the protocol carries no reference-timestamp rule. Fails when
/// neither is available.
pub fn resolve_reference(
    mut schedule: AssessmentSchedule,
    assessment: &Assessment,
    user: &User,
) -> AppResult<AssessmentSchedule> {
    let timezone = time::parse_timezone(&user.timezone)?;
    let rule = assessment
        .protocol
        .as_ref()
        .and_then(|protocol| protocol.reference_timestamp.as_ref());

    let reference = match rule {
        Some(rule) => resolve_rule(rule, timezone)?,
        None => {
            let enrolment = user.enrolment_date.ok_or_else(|| {
                AppError::configuration(format!(
                    "Assessment '{}' has no reference timestamp and subject '{}' has no enrolment date",
                    assessment.name, user.subject_id
                ))
            })?;
            time::truncate_to_midnight(enrolment, timezone)
        }
    };

    schedule.reference_timestamp = Some(reference);
    schedule.name = Some(assessment.name.clone());
    Ok(schedule)
}

/// Clinical assessments carry only their name.
pub fn copy_name(mut schedule: AssessmentSchedule, assessment: &Assessment) -> AssessmentSchedule {
    schedule.name = Some(assessment.name.clone());
    schedule
}

fn resolve_rule(rule: &ReferenceTimestamp, timezone: Tz) -> AppResult<DateTime<Utc>> {
    match rule.format {
        ReferenceTimestampFormat::Now => Ok(Utc::now()),
        ReferenceTimestampFormat::Today => Ok(time::truncate_to_midnight(Utc::now(), timezone)),
        ReferenceTimestampFormat::Date => {
            let value = required_value(rule)?;
            let date = NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|e| {
                AppError::configuration(format!("Invalid reference date '{value}': {e}"))
            })?;
            local_midnight(date, timezone, value)
        }
        ReferenceTimestampFormat::Datetime => {
            let value = required_value(rule)?;
            let naive = parse_local_datetime(value)?;
            timezone
                .from_local_datetime(&naive)
                .earliest()
                .map(|local| local.with_timezone(&Utc))
                .ok_or_else(|| {
                    AppError::configuration(format!(
                        "Reference datetime '{value}' does not exist in timezone {timezone}"
                    ))
                })
        }
        ReferenceTimestampFormat::DatetimeUtc => {
            let value = required_value(rule)?;
            DateTime::parse_from_rfc3339(value)
                .map(|fixed| fixed.with_timezone(&Utc))
                .map_err(|e| {
                    AppError::configuration(format!("Invalid reference instant '{value}': {e}"))
                })
        }
    }
}

fn required_value(rule: &ReferenceTimestamp) -> AppResult<&str> {
    rule.timestamp
        .as_deref()
        .ok_or_else(|| AppError::configuration("Reference timestamp rule has no value"))
}

fn parse_local_datetime(value: &str) -> AppResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M"))
        .map_err(|e| AppError::configuration(format!("Invalid reference datetime '{value}': {e}")))
}

fn local_midnight(date: NaiveDate, timezone: Tz, raw: &str) -> AppResult<DateTime<Utc>> {
    date.and_hms_opt(0, 0, 0)
        .and_then(|midnight| timezone.from_local_datetime(&midnight).earliest())
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| {
            AppError::configuration(format!(
                "Reference date '{raw}' has no midnight in timezone {timezone}"
            ))
        })
}
