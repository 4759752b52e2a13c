//! Message lifecycle states.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle state of a notification or data message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageState {
    /// Set on creation.
    Added,
    /// Set on any field update.
    Updated,
    /// The transport confirmed delivery.
    Delivered,
    /// The subject dismissed the notification.
    Dismissed,
    /// The subject opened the notification.
    Opened,
    /// The transport reported an error.
    Errored,
    /// Reported when the device cannot classify the outcome.
    Unknown,
    /// Internal-only: emitted when the message is deleted. Never accepted
    /// from the external event endpoint and never persisted.
    Cancelled,
}

impl MessageState {
    /// States that external callers are allowed to report.
    pub const EXTERNAL: [MessageState; 5] = [
        MessageState::Delivered,
        MessageState::Dismissed,
        MessageState::Opened,
        MessageState::Errored,
        MessageState::Unknown,
    ];

    /// Whether this state may be reported through the external event
    /// endpoint.
    pub fn is_externally_reportable(&self) -> bool {
        Self::EXTERNAL.contains(self)
    }

    /// Whether this state only ever originates inside the server.
    pub fn is_internal_only(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Return the state as an uppercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Added => "ADDED",
            Self::Updated => "UPDATED",
            Self::Delivered => "DELIVERED",
            Self::Dismissed => "DISMISSED",
            Self::Opened => "OPENED",
            Self::Errored => "ERRORED",
            Self::Unknown => "UNKNOWN",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for MessageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
