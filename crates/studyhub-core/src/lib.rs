//! # studyhub-core
//!
//! Core crate for StudyHub. Contains the unified error system, typed
//! identifiers, filter types, configuration schemas, and the traits that
//! represent external collaborators (the trigger-execution facility and
//! the delivery transport).
//!
//! This crate has **no** internal dependencies on other StudyHub crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
