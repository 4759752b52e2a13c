//! Protocol document: the ordered collection of assessments for a
//! project or subject.

use serde::{Deserialize, Serialize};

use super::assessment::Assessment;

/// A versioned protocol document fetched from the external source.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Protocol {
    /// Version tag of the document; drift forces a full schedule rebuild.
    #[serde(default)]
    pub version: Option<String>,
    /// The assessments applicable to the subject, in display order.
    #[serde(default)]
    pub assessments: Vec<Assessment>,
}

impl Protocol {
    /// Whether the protocol contains an assessment with the given name.
    pub fn has_assessment(&self, name: &str) -> bool {
        self.assessments.iter().any(|a| a.name == name)
    }
}
