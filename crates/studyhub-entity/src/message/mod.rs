mod event;
mod model;
mod state;

pub use event::MessageStateEvent;
pub use model::{DataMessage, Message, MessageFields, Notification};
pub use state::MessageState;
