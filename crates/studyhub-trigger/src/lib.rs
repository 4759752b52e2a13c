//! # studyhub-trigger
//!
//! The delivery-trigger side of StudyHub. The [`runtime`] module hosts a
//! generic one-shot trigger facility on top of `tokio-cron-scheduler`;
//! the [`adapter`] module maps persisted messages onto trigger
//! registrations keyed by `(subject, message id)`, with idempotent
//! create, update, and bulk delete.

pub mod adapter;
pub mod naming;
pub mod runtime;
pub mod sink;

pub use adapter::MessageTriggerAdapter;
pub use runtime::OneShotTriggerRuntime;
pub use sink::LogDeliverySink;
