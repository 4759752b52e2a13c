//! The protocol source collaborator boundary.

use async_trait::async_trait;

use studyhub_core::AppResult;
use studyhub_entity::protocol::Protocol;

/// Supplies the protocol document applicable to a subject or project.
#[async_trait]
pub trait ProtocolSource: Send + Sync + 'static {
    /// The protocol for one subject.
    async fn protocol_for_subject(&self, subject_id: &str) -> AppResult<Protocol>;

    /// The project-level protocol.
    async fn protocol_for_project(&self, project_name: &str) -> AppResult<Protocol>;
}
