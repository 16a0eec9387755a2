//! In-process record index shared by the memory and file stores.

use crate::{RecordOrder, RecordQuery, SnapshotStream, StoreError};
use chrono::Utc;
use futures_util::StreamExt;
use jsonshelf_protocol::{NewRecord, Record, RecordId};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

#[derive(Debug, Clone)]
struct StoredRecord {
    seq: u64,
    record: Record,
}

#[derive(Debug, Default)]
struct IndexState {
    collections: HashMap<String, Vec<StoredRecord>>,
    next_seq: u64,
}

/// Records grouped by collection plus a revision counter that wakes subscribers.
pub(crate) struct RecordIndex {
    state: Arc<RwLock<IndexState>>,
    revision: watch::Sender<u64>,
}

impl RecordIndex {
    pub(crate) fn new() -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            state: Arc::new(RwLock::new(IndexState::default())),
            revision,
        }
    }

    /// Stamp id and timestamps onto a new record without storing it.
    pub(crate) fn materialize(record: NewRecord) -> Record {
        let now = Utc::now();
        Record {
            id: RecordId::generate(),
            payload: record.payload,
            created_at: now,
            updated_at: now,
            owner_id: record.owner_id,
        }
    }

    pub(crate) fn insert(&self, collection: &str, record: Record) {
        {
            let mut state = self.state.write();
            let seq = state.next_seq;
            state.next_seq += 1;
            state
                .collections
                .entry(collection.to_string())
                .or_default()
                .push(StoredRecord { seq, record });
        }
        self.bump();
    }

    /// Seed a collection with records in their original insertion order.
    pub(crate) fn load(&self, collection: &str, records: Vec<Record>) {
        {
            let mut state = self.state.write();
            let mut stored = Vec::with_capacity(records.len());
            for record in records {
                stored.push(StoredRecord {
                    seq: state.next_seq,
                    record,
                });
                state.next_seq += 1;
            }
            state.collections.insert(collection.to_string(), stored);
        }
        self.bump();
    }

    /// Remove a record; returns whether it existed.
    pub(crate) fn remove(&self, collection: &str, id: &RecordId) -> bool {
        let removed = {
            let mut state = self.state.write();
            match state.collections.get_mut(collection) {
                Some(records) => {
                    let before = records.len();
                    records.retain(|stored| &stored.record.id != id);
                    records.len() != before
                }
                None => false,
            }
        };
        if removed {
            self.bump();
        }
        removed
    }

    /// Every record in a collection, oldest insertion first.
    pub(crate) fn records(&self, collection: &str) -> Vec<Record> {
        self.state
            .read()
            .collections
            .get(collection)
            .map(|records| records.iter().map(|stored| stored.record.clone()).collect())
            .unwrap_or_default()
    }

    pub(crate) fn contains(&self, collection: &str, id: &RecordId) -> bool {
        self.state
            .read()
            .collections
            .get(collection)
            .is_some_and(|records| records.iter().any(|stored| &stored.record.id == id))
    }

    pub(crate) fn subscribe(&self, query: RecordQuery) -> SnapshotStream {
        let state = Arc::clone(&self.state);
        let changes = WatchStream::new(self.revision.subscribe());
        Box::pin(changes.map(move |_| Ok::<_, StoreError>(snapshot(&state.read(), &query))))
    }

    fn bump(&self) {
        self.revision.send_modify(|revision| *revision += 1);
    }
}

fn snapshot(state: &IndexState, query: &RecordQuery) -> Vec<Record> {
    let Some(records) = state.collections.get(&query.collection) else {
        return Vec::new();
    };
    let mut matching: Vec<&StoredRecord> = records
        .iter()
        .filter(|stored| stored.record.owner_id == query.owner_id)
        .collect();
    match query.order {
        RecordOrder::CreatedAtDesc => matching.sort_by(|a, b| {
            b.record
                .created_at
                .cmp(&a.record.created_at)
                .then(b.seq.cmp(&a.seq))
        }),
    }
    matching
        .into_iter()
        .map(|stored| stored.record.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use jsonshelf_protocol::OwnerId;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn record(id: &str, owner: &str, second: i64) -> Record {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::seconds(second);
        Record {
            id: RecordId::new(id),
            payload: json!({ "id": id }),
            created_at: at,
            updated_at: at,
            owner_id: OwnerId::new(owner),
        }
    }

    fn ids(records: &[Record]) -> Vec<&str> {
        records.iter().map(|record| record.id.as_str()).collect()
    }

    #[test]
    fn snapshot_orders_newest_first_and_breaks_ties_by_insertion() {
        let index = RecordIndex::new();
        index.insert("records", record("old", "u1", 0));
        index.insert("records", record("tie-a", "u1", 5));
        index.insert("records", record("tie-b", "u1", 5));
        index.insert("records", record("other-owner", "u2", 9));

        let query = RecordQuery::owned_by("records", OwnerId::new("u1"));
        let state = index.state.read();
        assert_eq!(ids(&snapshot(&state, &query)), vec!["tie-b", "tie-a", "old"]);
    }

    #[test]
    fn remove_reports_missing_ids() {
        let index = RecordIndex::new();
        index.insert("records", record("a", "u1", 0));
        assert!(index.remove("records", &RecordId::new("a")));
        assert!(!index.remove("records", &RecordId::new("a")));
        assert!(!index.remove("elsewhere", &RecordId::new("a")));
        assert!(index.records("records").is_empty());
    }

    #[tokio::test]
    async fn subscription_emits_current_state_then_changes() {
        let index = RecordIndex::new();
        index.insert("records", record("a", "u1", 0));
        let mut stream = index.subscribe(RecordQuery::owned_by("records", OwnerId::new("u1")));

        let first = stream.next().await.expect("item").expect("snapshot");
        assert_eq!(ids(&first), vec!["a"]);

        index.insert("records", record("b", "u1", 1));
        let second = stream.next().await.expect("item").expect("snapshot");
        assert_eq!(ids(&second), vec!["b", "a"]);
    }
}
