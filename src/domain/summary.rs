use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRecord {
    pub organization: String,
    /// Empty when the generative API was unavailable.
    pub synopsis: String,
    pub generated_at: DateTime<Utc>,
}

impl SummaryRecord {
    pub fn new(organization: &str, synopsis: String) -> Self {
        SummaryRecord {
            organization: organization.to_string(),
            synopsis,
            generated_at: Utc::now(),
        }
    }

    pub fn empty(organization: &str) -> Self {
        Self::new(organization, String::new())
    }

    pub fn is_empty(&self) -> bool {
        self.synopsis.trim().is_empty()
    }
}
