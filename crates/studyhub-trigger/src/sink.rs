//! Default delivery sink.

use async_trait::async_trait;
use tracing::info;

use studyhub_core::AppResult;
use studyhub_core::traits::trigger::{DeliverySink, TriggerPayload};

/// Logs fired payloads instead of pushing them anywhere.
///
/// The real push transport is an external collaborator; deployments wire
/// their own [`DeliverySink`] and this sink keeps the server functional
/// without one.
#[derive(Debug, Default, Clone)]
pub struct LogDeliverySink;

impl LogDeliverySink {
    /// Create a new logging sink.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DeliverySink for LogDeliverySink {
    async fn deliver(&self, payload: &TriggerPayload) -> AppResult<()> {
        info!(
            subject = %payload.subject_id,
            project = %payload.project_id,
            message = %payload.message_id,
            kind = %payload.message_kind,
            "Delivery trigger fired"
        );
        Ok(())
    }
}
