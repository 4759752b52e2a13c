//! # studyhub-entity
//!
//! Domain entity models for StudyHub. Every struct in this crate represents
//! a persisted row or a domain value object. All entities derive `Debug`,
//! `Clone`, `Serialize`, and `Deserialize`.

pub mod message;
pub mod project;
pub mod protocol;
pub mod schedule;
pub mod task;
pub mod user;
