use crate::{RecordQuery, StoreError};
use async_trait::async_trait;
use futures_util::Stream;
use jsonshelf_protocol::{NewRecord, Record, RecordId};
use std::pin::Pin;

/// Stream of full result sets for a live query.
///
/// The first item is the current result set; each later item replaces the
/// previous one entirely. An `Err` item means the subscription has failed.
pub type SnapshotStream = Pin<Box<dyn Stream<Item = Result<Vec<Record>, StoreError>> + Send>>;

/// Persistent collection of JSON documents with push subscriptions.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Persist a new record, assigning its id and timestamps.
    async fn insert(&self, collection: &str, record: NewRecord) -> Result<RecordId, StoreError>;

    /// Remove a record. Deleting an id that does not exist succeeds.
    async fn delete(&self, collection: &str, id: &RecordId) -> Result<(), StoreError>;

    /// Open a live query. Snapshots are filtered by owner and ordered per the query.
    async fn subscribe(&self, query: RecordQuery) -> Result<SnapshotStream, StoreError>;
}
