//! Message state event entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use studyhub_core::types::id::{MessageId, StateEventId};

use super::state::MessageState;

/// Append-only audit record of a message state change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageStateEvent {
    /// Unique event identifier.
    pub id: StateEventId,
    /// The message the event refers to.
    pub message_id: MessageId,
    /// The reported state.
    pub state: MessageState,
    /// When the state change happened.
    pub time: DateTime<Utc>,
    /// Free-text information attached by the reporter.
    pub associated_info: Option<String>,
}

impl MessageStateEvent {
    /// Create a new event for the given message.
    pub fn new(message_id: MessageId, state: MessageState, time: DateTime<Utc>) -> Self {
        Self {
            id: StateEventId::new(),
            message_id,
            state,
            time,
            associated_info: None,
        }
    }

    /// Attach free-text associated info.
    pub fn with_info(mut self, info: impl Into<String>) -> Self {
        self.associated_info = Some(info.into());
        self
    }
}
