//! # studyhub-scheduling
//!
//! Pure schedule expansion for StudyHub: the timezone-aware time
//! calculator, the task/notification builders, the protocol handler
//! pipeline, and the per-subject schedule generator.
//!
//! Nothing in this crate touches persistence or the network; it turns an
//! [`studyhub_entity::protocol::Assessment`] plus a user context into an
//! [`studyhub_entity::schedule::AssessmentSchedule`].

pub mod builder;
pub mod generator;
pub mod pipeline;
pub mod text;
pub mod time;

pub use generator::ScheduleGenerator;
