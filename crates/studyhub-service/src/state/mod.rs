//! Externally reported state events for tasks and messages.

mod message_events;
mod task_events;

pub use message_events::MessageStateEventService;
pub use task_events::TaskStateEventService;

/// Maximum number of recorded state events per task or message. The
/// 21st+ external report is rejected, not silently dropped.
pub const MAX_STATE_EVENTS: u64 = 20;
