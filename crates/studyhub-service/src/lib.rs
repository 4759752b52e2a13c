//! # studyhub-service
//!
//! Business logic services for StudyHub. Orchestrates the repositories,
//! the schedule cache, the protocol source, the handler pipeline, and the
//! trigger adapter:
//!
//! - [`task::TaskService`] — task CRUD with natural-key deduplication
//! - [`message::MessageService`] — notification/data message CRUD and
//!   trigger registration
//! - [`state`] — externally reported state events with the 20-event cap
//! - [`schedule::ScheduleService`] — per-subject schedule reconciliation

pub mod message;
pub mod schedule;
pub mod state;
pub mod task;

pub use message::MessageService;
pub use schedule::ScheduleService;
pub use state::{MessageStateEventService, TaskStateEventService};
pub use task::TaskService;
