//! Message-kind discriminator carried in trigger payloads.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Discriminates the concrete message kind behind a scheduled trigger.
///
/// The set is closed over the two persisted message kinds; anything else
/// maps to [`MessageKind::Unknown`] so that scheduling never blocks on an
/// unanticipated kind string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageKind {
    /// A push notification with displayable title/body.
    Notification,
    /// A silent data message carrying a key/value payload.
    Data,
    /// Fallback for unrecognized kinds.
    Unknown,
}

impl MessageKind {
    /// Return the kind as an uppercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Notification => "NOTIFICATION",
            Self::Data => "DATA",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MessageKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "NOTIFICATION" => Self::Notification,
            "DATA" => Self::Data,
            _ => Self::Unknown,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unrecognized_maps_to_unknown() {
        let kind: MessageKind = "SURPRISE".parse().unwrap();
        assert_eq!(kind, MessageKind::Unknown);
    }

    #[test]
    fn test_roundtrip() {
        for kind in [MessageKind::Notification, MessageKind::Data] {
            let parsed: MessageKind = kind.as_str().parse().unwrap();
            assert_eq!(parsed, kind);
        }
    }
}
