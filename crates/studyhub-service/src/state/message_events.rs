//! External message state reporting.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use studyhub_core::types::id::MessageId;
use studyhub_core::{AppError, AppResult};
use studyhub_entity::message::{MessageState, MessageStateEvent};
use studyhub_store::traits::MessageStateEventRepository;

use super::MAX_STATE_EVENTS;
use crate::message::MessageService;

/// Accepts externally reported message state events.
///
/// CANCELLED is internal-only: the message row is expected to disappear
/// around the same time, so an external CANCELLED report is dropped as a
/// no-op rather than persisted — distinct from the fatal rejection of
/// other non-reportable states and of reports past the event cap.
#[derive(Clone)]
pub struct MessageStateEventService {
    event_repo: Arc<dyn MessageStateEventRepository>,
    message_service: Arc<MessageService>,
}

impl MessageStateEventService {
    /// Create a new message state event service.
    pub fn new(
        event_repo: Arc<dyn MessageStateEventRepository>,
        message_service: Arc<MessageService>,
    ) -> Self {
        Self {
            event_repo,
            message_service,
        }
    }

    /// Events recorded for a message, oldest first.
    pub async fn get_events(&self, message_id: &MessageId) -> AppResult<Vec<MessageStateEvent>> {
        self.event_repo.find_by_message(message_id).await
    }

    /// Report a state event from outside the server.
    pub async fn report_external(
        &self,
        message_id: &MessageId,
        state: MessageState,
        time: DateTime<Utc>,
        associated_info: Option<String>,
    ) -> AppResult<()> {
        if state.is_internal_only() {
            debug!(message = %message_id, "Dropping external CANCELLED report");
            return Ok(());
        }
        if !state.is_externally_reportable() {
            return Err(AppError::invalid_state(format!(
                "The state {state} cannot be reported through this endpoint"
            )));
        }
        if self.event_repo.count_by_message(message_id).await? >= MAX_STATE_EVENTS {
            return Err(AppError::invalid_state(format!(
                "The limit of {MAX_STATE_EVENTS} state changes has been reached, cannot add new states"
            )));
        }
        if !self.message_service.message_exists(message_id).await? {
            return Err(AppError::not_found(format!("Message {message_id} not found")));
        }

        let mut event = MessageStateEvent::new(*message_id, state, time);
        if let Some(info) = associated_info {
            event = event.with_info(info);
        }
        self.event_repo.append(&event).await
    }
}

impl std::fmt::Debug for MessageStateEventService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageStateEventService").finish()
    }
}
