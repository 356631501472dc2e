use std::fmt;

use serde::{Deserialize, Serialize};

/// Classification tag used both to group attachments and to scope
/// creation and listing. The empty string is the uncategorized tag.
///
/// Some deployments model categories as structured `{id, description}`
/// records; this type carries the id and treats it opaquely.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Category(String);

impl Category {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The uncategorized tag. Drop-originated uploads always use this.
    pub fn none() -> Self {
        Self(String::new())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_none(&self) -> bool {
        self.0.is_empty()
    }

    /// Advisory accept-type pattern for a file picker scoped to this
    /// category. Not a validation gate: whatever the host returns from
    /// the picker is accepted.
    pub fn accept_types(&self) -> String {
        if self.is_none() {
            "*/*".into()
        } else {
            format!("{}/*", self.0)
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Category {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}
