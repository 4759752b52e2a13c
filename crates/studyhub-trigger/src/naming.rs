//! Job and trigger identity naming.
//!
//! Identities derive from `(subject id, message id)` so that scheduling
//! the same message twice resolves to the same job.

use studyhub_core::types::id::MessageId;

/// The job identity for a message.
pub fn message_job_key(subject_id: &str, message_id: &MessageId) -> String {
    format!("message-job-{subject_id}-{message_id}")
}

/// The trigger identity for a message.
pub fn message_trigger_key(subject_id: &str, message_id: &MessageId) -> String {
    format!("message-trigger-{subject_id}-{message_id}")
}
