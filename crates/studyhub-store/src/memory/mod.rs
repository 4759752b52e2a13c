//! In-memory repository implementations backed by dashmap.
//!
//! Each deduplicated store keeps a secondary index from natural key to
//! primary key; `insert_if_absent` claims the index entry and writes the
//! row under the entry lock, which makes the dedup-check-then-insert
//! sequence atomic per natural key.

mod filter;
mod message;
mod project;
mod state_event;
mod task;
mod user;

pub use message::{MemoryDataMessageRepository, MemoryNotificationRepository};
pub use project::MemoryProjectRepository;
pub use state_event::{MemoryMessageStateEventRepository, MemoryTaskStateEventRepository};
pub use task::MemoryTaskRepository;
pub use user::MemoryUserRepository;
