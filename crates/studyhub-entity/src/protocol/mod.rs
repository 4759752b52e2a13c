//! Protocol definition DTOs fetched from the external protocol source.

mod assessment;
mod model;
mod rules;

pub use assessment::{Assessment, AssessmentProtocol, AssessmentType};
pub use model::Protocol;
pub use rules::{
    DayOfWeek, EmailConfig, LanguageText, NotificationProtocol, OffsetRange,
    ReferenceTimestamp, ReferenceTimestampFormat, ReminderTimePeriod, RepeatProtocol,
    RepeatQuestionnaire, RepeatUnit, TimePeriod,
};
