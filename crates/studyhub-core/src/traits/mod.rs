//! Traits describing external collaborators.

pub mod trigger;

pub use trigger::{DeliverySink, TriggerPayload, TriggerScheduler};
