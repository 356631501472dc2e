use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::category::Category;

/// A file record owned by the remote service. The client only ever holds
/// non-authoritative cached copies of these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub mimetype: String,
    pub encoding: String,
    pub category: Category,
    /// Storage locator: either a bare storage path or a full URL.
    pub path: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Attachment {
    /// Resolve the storage locator to a fetchable URL.
    /// Bare storage paths are served under `/attachment/`; anything that
    /// already carries a scheme passes through untouched.
    pub fn url(&self) -> String {
        if self.path.contains("://") {
            self.path.clone()
        } else {
            format!("/attachment/{}", self.path)
        }
    }
}
