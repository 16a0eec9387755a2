//! Shared data model for jsonshelf records, owners, and identities.

mod identity;

pub use identity::User;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

/// Default collection that holds user records.
pub const DEFAULT_COLLECTION: &str = "records";

/// Collection names are non-empty and limited to `[A-Za-z0-9_-]`.
pub fn is_valid_collection_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_')
}

/// Opaque identifier assigned by the store when a record is created.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Wrap an identifier produced by a store.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Generate a fresh random identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Borrow the identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Identifier of the user that owns a record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(String);

impl OwnerId {
    /// Wrap a user identifier.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrow the identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the identifier is empty or whitespace only.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OwnerId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// A persisted JSON record as delivered by a store snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Record {
    /// Store-assigned identifier.
    pub id: RecordId,
    /// Arbitrary JSON payload.
    pub payload: Value,
    /// Store-assigned creation time.
    pub created_at: DateTime<Utc>,
    /// Store-assigned update time; equal to `created_at` since records are never edited.
    pub updated_at: DateTime<Utc>,
    /// Owner of the record.
    pub owner_id: OwnerId,
}

/// A record payload waiting to be inserted. Timestamps are assigned by the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewRecord {
    /// JSON payload to persist.
    pub payload: Value,
    /// Owner stamped onto the record.
    pub owner_id: OwnerId,
}

impl NewRecord {
    /// Build an insert request for the given owner.
    pub fn new(payload: Value, owner_id: OwnerId) -> Self {
        Self { payload, owner_id }
    }
}

#[cfg(test)]
mod tests {
    use super::{OwnerId, Record, RecordId, is_valid_collection_name};
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn ids_serialize_as_plain_strings() {
        let now = Utc::now();
        let record = Record {
            id: RecordId::new("abc"),
            payload: json!({ "name": "Data Science" }),
            created_at: now,
            updated_at: now,
            owner_id: OwnerId::new("u1"),
        };
        let value = serde_json::to_value(&record).expect("serialize");
        assert_eq!(value["id"], json!("abc"));
        assert_eq!(value["owner_id"], json!("u1"));

        let decoded: Record = serde_json::from_value(value).expect("decode");
        assert_eq!(decoded, record);
    }

    #[test]
    fn generated_ids_are_unique() {
        assert!(RecordId::generate() != RecordId::generate());
    }

    #[test]
    fn blank_owner_is_detected() {
        assert!(OwnerId::new("  ").is_blank());
        assert!(!OwnerId::new("u1").is_blank());
    }

    #[test]
    fn collection_names_are_restricted() {
        assert!(is_valid_collection_name("records"));
        assert!(is_valid_collection_name("my_records-2"));
        assert!(!is_valid_collection_name(""));
        assert!(!is_valid_collection_name("my.records"));
        assert!(!is_valid_collection_name("../escape"));
    }
}
