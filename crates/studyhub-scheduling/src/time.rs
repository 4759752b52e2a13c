//! Pure timezone-aware time arithmetic.
//!
//! All calendar math happens in the subject's local timezone: an advance
//! by one day lands on the same wall-clock time the next day, even across
//! a DST transition.

use chrono::{DateTime, Datelike, Days, Duration, Months, Offset, TimeZone, Utc};
use chrono_tz::{OffsetComponents, Tz};

use studyhub_core::{AppError, AppResult};
use studyhub_entity::protocol::{RepeatUnit, TimePeriod};

/// Fixed day counts used when converting periods to durations. These are
/// deliberate approximations (no leap-year or DST correction) kept for
/// compatibility with existing protocol documents.
pub const WEEK_TO_DAYS: i64 = 7;
pub const MONTH_TO_DAYS: i64 = 31;
pub const YEAR_TO_DAYS: i64 = 365;

const MILLIS_PER_MINUTE: i64 = 60_000;
const MILLIS_PER_HOUR: i64 = 3_600_000;
const MILLIS_PER_DAY: i64 = 86_400_000;

/// Parse an IANA timezone identifier.
pub fn parse_timezone(id: &str) -> AppResult<Tz> {
    id.parse::<Tz>()
        .map_err(|e| AppError::configuration(format!("Invalid timezone '{id}': {e}")))
}

/// Advance an instant by a calendar period in the given timezone.
///
/// Minutes and hours are absolute; days, weeks, months, and years operate
/// on the local calendar. Negative amounts step backwards. A malformed
/// period (unknown unit, out-of-range result) advances by a two-year
/// horizon instead of failing, so one bad rule cannot abort a bulk
/// regeneration.
pub fn advance(instant: DateTime<Utc>, period: TimePeriod, timezone: Tz) -> DateTime<Utc> {
    let local = instant.with_timezone(&timezone);
    let amount = i64::from(period.amount);
    let moved = match period.unit {
        RepeatUnit::Min => local.checked_add_signed(Duration::minutes(amount)),
        RepeatUnit::Hour => local.checked_add_signed(Duration::hours(amount)),
        RepeatUnit::Day => add_local_days(local, amount),
        RepeatUnit::Week => add_local_days(local, amount * WEEK_TO_DAYS),
        RepeatUnit::Month => add_local_months(local, period.amount),
        RepeatUnit::Year => add_local_months(local, period.amount.saturating_mul(12)),
        RepeatUnit::Unknown => None,
    };
    match moved {
        Some(moved) => moved.with_timezone(&Utc),
        None => Utc::now() + Duration::days(2 * YEAR_TO_DAYS),
    }
}

fn add_local_days(local: DateTime<Tz>, days: i64) -> Option<DateTime<Tz>> {
    if days >= 0 {
        local.checked_add_days(Days::new(days as u64))
    } else {
        local.checked_sub_days(Days::new(days.unsigned_abs()))
    }
}

fn add_local_months(local: DateTime<Tz>, months: i32) -> Option<DateTime<Tz>> {
    if months >= 0 {
        local.checked_add_months(Months::new(months as u32))
    } else {
        local.checked_sub_months(Months::new(months.unsigned_abs()))
    }
}

/// Truncate an instant to the preceding local midnight.
///
/// When midnight does not exist locally (skipped by a DST gap), the
/// earliest valid local time of that day is used.
pub fn truncate_to_midnight(instant: DateTime<Utc>, timezone: Tz) -> DateTime<Utc> {
    let local = instant.with_timezone(&timezone);
    local
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .and_then(|midnight| timezone.from_local_datetime(&midnight).earliest())
        .map(|midnight| midnight.with_timezone(&Utc))
        .unwrap_or(instant)
}

/// Convert a period into a fixed duration in milliseconds, using the
/// week=7d / month=31d / year=365d approximations. An unknown unit maps
/// to one day.
pub fn period_to_millis(period: TimePeriod) -> i64 {
    let amount = i64::from(period.amount);
    match period.unit {
        RepeatUnit::Min => amount * MILLIS_PER_MINUTE,
        RepeatUnit::Hour => amount * MILLIS_PER_HOUR,
        RepeatUnit::Day => amount * MILLIS_PER_DAY,
        RepeatUnit::Week => amount * WEEK_TO_DAYS * MILLIS_PER_DAY,
        RepeatUnit::Month => amount * MONTH_TO_DAYS * MILLIS_PER_DAY,
        RepeatUnit::Year => amount * YEAR_TO_DAYS * MILLIS_PER_DAY,
        RepeatUnit::Unknown => MILLIS_PER_DAY,
    }
}

/// The local calendar year of an instant in the given timezone.
pub fn local_year(instant: DateTime<Utc>, timezone: Tz) -> i32 {
    instant.with_timezone(&timezone).year()
}

/// Difference between two zones' base (non-DST) UTC offsets at an
/// instant, as `new - previous`.
///
/// Used to translate a task timestamp into the wall-clock-equivalent
/// instant of a previously active timezone when matching carried-over
/// tasks. The base offset is used rather than the effective offset so a
/// DST boundary between generations does not break the match.
pub fn base_offset_difference(
    new_timezone: Tz,
    prev_timezone: Tz,
    at: DateTime<Utc>,
) -> Duration {
    let naive = at.naive_utc();
    let new_offset = new_timezone.offset_from_utc_datetime(&naive).base_utc_offset();
    let prev_offset = prev_timezone.offset_from_utc_datetime(&naive).base_utc_offset();
    new_offset - prev_offset
}

/// The effective UTC offset of a timezone at an instant.
pub fn utc_offset(timezone: Tz, at: DateTime<Utc>) -> Duration {
    let offset = timezone.offset_from_utc_datetime(&at.naive_utc()).fix();
    Duration::seconds(i64::from(offset.local_minus_utc()))
}
