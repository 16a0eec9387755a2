use crate::index::RecordIndex;
use crate::{DocumentStore, RecordQuery, SnapshotStream, StoreError};
use async_trait::async_trait;
use jsonshelf_protocol::{NewRecord, RecordId, is_valid_collection_name};
use log::{debug, warn};

/// Process-local document store. Records live as long as the store.
pub struct MemoryDocumentStore {
    index: RecordIndex,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self {
            index: RecordIndex::new(),
        }
    }
}

impl Default for MemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn insert(&self, collection: &str, record: NewRecord) -> Result<RecordId, StoreError> {
        check_request(collection, &record)?;
        let record = RecordIndex::materialize(record);
        let id = record.id.clone();
        self.index.insert(collection, record);
        debug!("inserted record (collection={}, id={})", collection, id);
        Ok(id)
    }

    async fn delete(&self, collection: &str, id: &RecordId) -> Result<(), StoreError> {
        check_collection(collection)?;
        if self.index.remove(collection, id) {
            debug!("deleted record (collection={}, id={})", collection, id);
        } else {
            warn!("delete of unknown record (collection={}, id={})", collection, id);
        }
        Ok(())
    }

    async fn subscribe(&self, query: RecordQuery) -> Result<SnapshotStream, StoreError> {
        check_query(&query)?;
        debug!(
            "opening subscription (collection={}, owner_id={})",
            query.collection, query.owner_id
        );
        Ok(self.index.subscribe(query))
    }
}

/// Reject writes that no authenticated user could have issued.
pub(crate) fn check_request(collection: &str, record: &NewRecord) -> Result<(), StoreError> {
    check_collection(collection)?;
    if record.owner_id.is_blank() {
        return Err(StoreError::PermissionDenied(
            "records must carry an owner".to_string(),
        ));
    }
    Ok(())
}

pub(crate) fn check_query(query: &RecordQuery) -> Result<(), StoreError> {
    check_collection(&query.collection)?;
    if query.owner_id.is_blank() {
        return Err(StoreError::PermissionDenied(
            "queries must be scoped to an owner".to_string(),
        ));
    }
    Ok(())
}

pub(crate) fn check_collection(collection: &str) -> Result<(), StoreError> {
    if is_valid_collection_name(collection) {
        Ok(())
    } else {
        Err(StoreError::Unavailable(format!(
            "invalid collection name: {collection:?}"
        )))
    }
}
