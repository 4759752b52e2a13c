//! Locale-aware notification text resolution with built-in defaults.

use studyhub_entity::protocol::LanguageText;

/// Which message the text is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    /// The "questionnaire due now" notification.
    Now,
    /// A follow-up reminder.
    Reminder,
}

/// Resolve the notification title, preferring the protocol's per-locale
/// text and falling back to a built-in default.
pub fn title_text(
    language: Option<&str>,
    title: Option<&LanguageText>,
    kind: NotificationKind,
) -> String {
    title
        .and_then(|t| t.text(language))
        .map(str::to_string)
        .unwrap_or_else(|| match kind {
            NotificationKind::Reminder => "Missed a questionnaire?".to_string(),
            NotificationKind::Now => "Questionnaire time".to_string(),
        })
}

/// Resolve the notification body, preferring the protocol's per-locale
/// text and falling back to a built-in default.
pub fn body_text(
    language: Option<&str>,
    body: Option<&LanguageText>,
    kind: NotificationKind,
    estimated_minutes: i32,
) -> String {
    body.and_then(|b| b.text(language))
        .map(str::to_string)
        .unwrap_or_else(|| match kind {
            NotificationKind::Reminder => {
                "It seems you haven't answered all of our questions. Could you please do that now?"
                    .to_string()
            }
            NotificationKind::Now => {
                format!("Won't usually take longer than {estimated_minutes} minutes")
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        assert_eq!(title_text(None, None, NotificationKind::Now), "Questionnaire time");
        assert_eq!(
            title_text(None, None, NotificationKind::Reminder),
            "Missed a questionnaire?"
        );
        assert_eq!(
            body_text(None, None, NotificationKind::Now, 4),
            "Won't usually take longer than 4 minutes"
        );
    }

    #[test]
    fn test_protocol_text_wins() {
        let title = LanguageText {
            translations: HashMap::from([("nl".to_string(), "Vragenlijst!".to_string())]),
        };
        assert_eq!(
            title_text(Some("nl"), Some(&title), NotificationKind::Now),
            "Vragenlijst!"
        );
    }
}
