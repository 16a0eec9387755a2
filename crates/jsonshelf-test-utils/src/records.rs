use chrono::Utc;
use jsonshelf_protocol::{OwnerId, Record, RecordId};
use serde_json::Value;

/// Build a stored record with the current time as both timestamps.
pub fn record(id: &str, owner: &str, payload: Value) -> Record {
    let now = Utc::now();
    Record {
        id: RecordId::new(id),
        payload,
        created_at: now,
        updated_at: now,
        owner_id: OwnerId::new(owner),
    }
}
