//! Task lifecycle states.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle state of a scheduled questionnaire task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskState {
    /// Initial state of a freshly built task, before persistence.
    Unknown,
    /// Set on first persistence.
    Added,
    /// The subject finished the questionnaire. Terminal.
    Completed,
    /// Something went wrong on the device side. Terminal.
    Errored,
}

impl TaskState {
    /// States that external callers are allowed to report.
    pub const EXTERNAL: [TaskState; 3] =
        [TaskState::Completed, TaskState::Unknown, TaskState::Errored];

    /// Whether this state may be reported through the external event
    /// endpoint.
    pub fn is_externally_reportable(&self) -> bool {
        Self::EXTERNAL.contains(self)
    }

    /// Whether this state ends the task's lifecycle.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Errored)
    }

    /// Return the state as an uppercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "UNKNOWN",
            Self::Added => "ADDED",
            Self::Completed => "COMPLETED",
            Self::Errored => "ERRORED",
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_added_is_not_externally_reportable() {
        assert!(!TaskState::Added.is_externally_reportable());
        assert!(TaskState::Completed.is_externally_reportable());
        assert!(TaskState::Unknown.is_externally_reportable());
        assert!(TaskState::Errored.is_externally_reportable());
    }
}
