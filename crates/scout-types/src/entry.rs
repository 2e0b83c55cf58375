//! Timeline entry types.

use crate::Content;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a timeline entry. Strictly increasing in creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(pub u64);

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Who produced an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Query typed by the user.
    User,
    /// Reply from the backend.
    Assistant,
    /// Backend-reported (or client-detected) failure.
    Error,
}

/// One unit of the conversation timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub id: EntryId,
    pub role: Role,
    pub content: Content,
    pub created_at: DateTime<Utc>,
}

impl Entry {
    /// Create an entry stamped with the current time.
    pub fn new(id: EntryId, role: Role, content: Content) -> Self {
        Self {
            id,
            role,
            content,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_serialization() {
        let entry = Entry::new(EntryId(7), Role::Assistant, Content::text("hi"));
        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains(r#""id":7"#));
        assert!(json.contains(r#""role":"assistant""#));
        assert!(json.contains(r#""kind":"text""#));
    }

    #[test]
    fn test_entry_id_ordering() {
        assert!(EntryId(1) < EntryId(2));
        assert_eq!(EntryId(3).to_string(), "#3");
    }
}
