//! Productivity report types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::UserId;

/// Unique report identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReportId(pub Uuid);

impl ReportId {
    /// Create a new random report ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ReportId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for ReportId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for ReportId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An AI-written productivity report, owned by one user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Report ID
    pub id: ReportId,
    /// Owning user
    pub user_id: UserId,
    /// Report title
    pub title: String,
    /// Markdown body
    pub content: String,
    /// Statistics snapshot captured at generation time
    pub statistics: Option<serde_json::Value>,
    /// Object-storage key of the rendered PDF (if uploaded)
    pub pdf_key: Option<String>,
    /// Public URL of the rendered PDF (if uploaded)
    pub pdf_url: Option<String>,
    /// When the report was created
    pub created_at: DateTime<Utc>,
}
