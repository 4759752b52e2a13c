//! Study participant entity model.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use studyhub_core::types::id::{ProjectId, UserId};

/// A study participant enrolled in a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique user identifier.
    pub id: UserId,
    /// The project this subject is enrolled in.
    pub project_id: ProjectId,
    /// External subject identifier assigned by the study.
    pub subject_id: String,
    /// When the subject enrolled. Used as the fallback reference timestamp.
    pub enrolment_date: Option<DateTime<Utc>>,
    /// IANA timezone identifier, e.g. "Europe/London".
    pub timezone: String,
    /// Preferred language code for notification texts.
    pub language: Option<String>,
    /// Device push token, when the subject has registered a device.
    pub push_token: Option<String>,
    /// Free-form subject attributes.
    #[serde(default)]
    pub attributes: HashMap<String, String>,
    /// When the user record was created.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a new user for the given project and subject.
    pub fn new(project_id: ProjectId, subject_id: impl Into<String>, timezone: impl Into<String>) -> Self {
        Self {
            id: UserId::new(),
            project_id,
            subject_id: subject_id.into(),
            enrolment_date: Some(Utc::now()),
            timezone: timezone.into(),
            language: None,
            push_token: None,
            attributes: HashMap::new(),
            created_at: Utc::now(),
        }
    }
}
