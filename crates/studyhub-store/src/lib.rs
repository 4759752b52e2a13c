//! # studyhub-store
//!
//! The persistence boundary. Relational storage itself is an external
//! collaborator, so this crate defines the repository traits the services
//! depend on — including the natural-key existence checks and the atomic
//! insert-if-absent used by generation-time deduplication — plus
//! in-memory reference implementations suitable for tests and single-node
//! operation.

pub mod memory;
pub mod traits;

pub use traits::{
    DataMessageRepository, MessageStateEventRepository, NotificationRepository,
    ProjectRepository, TaskRepository, TaskStateEventRepository, UserRepository,
};
