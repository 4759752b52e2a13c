//! Scheduling rule value objects used inside an assessment protocol.

use std::collections::HashMap;

use chrono::Weekday;
use serde::{Deserialize, Serialize};

/// Calendar unit of a repeat rule.
///
/// Protocol documents are externally authored; an unrecognized unit
/// deserializes to [`RepeatUnit::Unknown`] instead of failing the whole
/// document, and is handled defensively downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatUnit {
    Min,
    Hour,
    Day,
    Week,
    Month,
    Year,
    #[serde(other)]
    Unknown,
}

/// A (unit, amount) pair describing a calendar offset. Amounts may be
/// negative to step backwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimePeriod {
    pub unit: RepeatUnit,
    pub amount: i32,
}

impl TimePeriod {
    /// Create a new time period.
    pub fn new(unit: RepeatUnit, amount: i32) -> Self {
        Self { unit, amount }
    }
}

/// Day of week used to restrict repeat rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl From<Weekday> for DayOfWeek {
    fn from(weekday: Weekday) -> Self {
        match weekday {
            Weekday::Mon => Self::Monday,
            Weekday::Tue => Self::Tuesday,
            Weekday::Wed => Self::Wednesday,
            Weekday::Thu => Self::Thursday,
            Weekday::Fri => Self::Friday,
            Weekday::Sat => Self::Saturday,
            Weekday::Sun => Self::Sunday,
        }
    }
}

/// How the reference timestamp string should be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReferenceTimestampFormat {
    /// A calendar date, anchored at local midnight.
    Date,
    /// A local date-time in the subject's timezone.
    Datetime,
    /// An RFC 3339 instant.
    DatetimeUtc,
    /// The current instant at generation time.
    Now,
    /// The current day's local midnight at generation time.
    Today,
}

/// Anchor rule for the first occurrence of an assessment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceTimestamp {
    /// The timestamp value; absent for `NOW` and `TODAY`.
    pub timestamp: Option<String>,
    /// How to interpret the value.
    pub format: ReferenceTimestampFormat,
}

/// Expands the reference timestamp into a series of occurrences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepeatProtocol {
    pub unit: RepeatUnit,
    pub amount: i32,
    /// When present, only occurrences falling on these local weekdays are
    /// kept.
    #[serde(default)]
    pub days_of_week: Option<Vec<DayOfWeek>>,
}

impl RepeatProtocol {
    /// The advance step as a plain time period.
    pub fn time_period(&self) -> TimePeriod {
        TimePeriod::new(self.unit, self.amount)
    }
}

/// An inclusive `[low, high]` offset range for random sampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OffsetRange {
    pub low: i32,
    pub high: i32,
}

/// Generates tasks at offsets from each repeat-protocol occurrence.
///
/// Exactly one of the three offset sources is expected; when several are
/// present the most specific wins (day-of-week map, then random ranges,
/// then fixed offsets).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepeatQuestionnaire {
    pub unit: RepeatUnit,
    /// Fixed offsets from the occurrence, in `unit`s.
    #[serde(default)]
    pub units_from_zero: Option<Vec<i32>>,
    /// Random ranges; one offset is sampled per range per occurrence.
    #[serde(default)]
    pub random_units_from_zero_between: Option<Vec<OffsetRange>>,
    /// Offsets keyed by the occurrence's local weekday.
    #[serde(default)]
    pub day_of_week_map: Option<HashMap<DayOfWeek, Vec<i32>>>,
}

/// Per-locale notification text with fallback lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LanguageText {
    pub translations: HashMap<String, String>,
}

impl LanguageText {
    /// Look up the text for a language, falling back to English and then
    /// to any available translation.
    pub fn text(&self, language: Option<&str>) -> Option<&str> {
        language
            .and_then(|lang| self.translations.get(lang))
            .or_else(|| self.translations.get("en"))
            .or_else(|| self.translations.values().next())
            .map(String::as_str)
    }
}

/// Email delivery toggle shared by notification and reminder rules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailConfig {
    #[serde(default)]
    pub enabled: bool,
}

/// Notification rule for an assessment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationProtocol {
    /// When false, the assessment generates no notifications at all.
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub title: Option<LanguageText>,
    #[serde(default)]
    pub body: Option<LanguageText>,
    #[serde(default)]
    pub email: EmailConfig,
}

/// Reminder rule: `repeat` reminders spaced `(unit, amount)` apart after
/// each task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderTimePeriod {
    pub unit: RepeatUnit,
    pub amount: i32,
    #[serde(default)]
    pub repeat: Option<u32>,
    #[serde(default)]
    pub email: EmailConfig,
}

impl ReminderTimePeriod {
    /// The reminder spacing as a plain time period.
    pub fn time_period(&self) -> TimePeriod {
        TimePeriod::new(self.unit, self.amount)
    }
}

fn default_true() -> bool {
    true
}
