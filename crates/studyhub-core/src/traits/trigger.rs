//! Trigger-execution facility and delivery transport boundaries.
//!
//! The facility is a generic "fire job at time T" runtime. StudyHub only
//! registers one-shot triggers against it; resolving the payload back into
//! a concrete message and pushing it over the wire is the transport's job.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::result::AppResult;
use crate::types::id::MessageId;
use crate::types::message_kind::MessageKind;

/// Payload attached to a registered trigger, resolved at fire time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerPayload {
    /// Study subject the message belongs to.
    pub subject_id: String,
    /// Project the subject is enrolled in.
    pub project_id: String,
    /// Identity of the persisted message to deliver.
    pub message_id: MessageId,
    /// Which message table the id refers to.
    pub message_kind: MessageKind,
}

/// A generic one-shot trigger runtime ("fire job at time T").
#[async_trait]
pub trait TriggerScheduler: Send + Sync + 'static {
    /// Register a one-shot trigger. Registering an identity that already
    /// exists is an error; callers are expected to consult
    /// [`TriggerScheduler::job_exists`] first.
    async fn register_one_shot(
        &self,
        job_id: &str,
        trigger_id: &str,
        fires_at: DateTime<Utc>,
        payload: TriggerPayload,
    ) -> AppResult<()>;

    /// Re-point an existing trigger's fire time and payload without
    /// changing its identity.
    async fn update_job(
        &self,
        job_id: &str,
        trigger_id: &str,
        fires_at: DateTime<Utc>,
        payload: TriggerPayload,
    ) -> AppResult<()>;

    /// Cancel a job and its trigger. Cancelling a non-existent job is a
    /// no-op, not an error.
    async fn cancel_job(&self, job_id: &str) -> AppResult<()>;

    /// Whether a job with the given identity is currently registered.
    async fn job_exists(&self, job_id: &str) -> AppResult<bool>;
}

/// Delivery transport consuming fired trigger payloads.
///
/// The actual push (FCM or otherwise) is outside this system; the server
/// binary wires a logging sink by default.
#[async_trait]
pub trait DeliverySink: Send + Sync + 'static {
    /// Deliver the message identified by the payload.
    async fn deliver(&self, payload: &TriggerPayload) -> AppResult<()>;
}
