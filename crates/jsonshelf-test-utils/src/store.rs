use async_trait::async_trait;
use jsonshelf_protocol::{NewRecord, Record, RecordId};
use jsonshelf_store::{DocumentStore, RecordQuery, SnapshotStream, StoreError};
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

type InsertPredicate = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

#[derive(Default)]
struct ScriptState {
    queries: Vec<RecordQuery>,
    subscribers: Vec<mpsc::UnboundedSender<Result<Vec<Record>, StoreError>>>,
    inserted: Vec<(RecordId, NewRecord)>,
    deleted: Vec<RecordId>,
    fail_insert: Option<InsertPredicate>,
    fail_delete: Option<String>,
    fail_subscribe: Option<String>,
    stall_subscribe: bool,
}

/// Store whose snapshots are delivered by hand.
///
/// Inserts and deletes are recorded but never change what subscribers see;
/// tests push snapshots explicitly to simulate the store's timing.
#[derive(Clone, Default)]
pub struct ScriptedStore {
    state: Arc<Mutex<ScriptState>>,
}

impl ScriptedStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver a snapshot to every open subscription.
    pub fn push_snapshot(&self, records: Vec<Record>) {
        let mut state = self.state.lock();
        state
            .subscribers
            .retain(|sender| sender.send(Ok(records.clone())).is_ok());
    }

    /// Fail every open subscription with `Unavailable`.
    pub fn push_error(&self, message: &str) {
        let mut state = self.state.lock();
        state.subscribers.retain(|sender| {
            sender
                .send(Err(StoreError::Unavailable(message.to_string())))
                .is_ok()
        });
    }

    pub fn fail_inserts_where(&self, predicate: impl Fn(&Value) -> bool + Send + Sync + 'static) {
        self.state.lock().fail_insert = Some(Arc::new(predicate));
    }

    pub fn fail_deletes(&self, message: &str) {
        self.state.lock().fail_delete = Some(message.to_string());
    }

    pub fn fail_subscribes(&self, message: &str) {
        self.state.lock().fail_subscribe = Some(message.to_string());
    }

    /// Make the next subscribe call hang until its future is dropped.
    pub fn stall_next_subscribe(&self) {
        self.state.lock().stall_subscribe = true;
    }

    /// Number of subscribe calls that succeeded.
    pub fn subscription_count(&self) -> usize {
        self.state.lock().queries.len()
    }

    pub fn queries(&self) -> Vec<RecordQuery> {
        self.state.lock().queries.clone()
    }

    /// Subscriptions whose stream has not been dropped yet.
    pub fn open_subscribers(&self) -> usize {
        self.state
            .lock()
            .subscribers
            .iter()
            .filter(|sender| !sender.is_closed())
            .count()
    }

    pub fn inserted(&self) -> Vec<(RecordId, NewRecord)> {
        self.state.lock().inserted.clone()
    }

    pub fn deleted(&self) -> Vec<RecordId> {
        self.state.lock().deleted.clone()
    }
}

#[async_trait]
impl DocumentStore for ScriptedStore {
    async fn insert(&self, _collection: &str, record: NewRecord) -> Result<RecordId, StoreError> {
        let mut state = self.state.lock();
        let rejected = state
            .fail_insert
            .as_ref()
            .is_some_and(|predicate| predicate(&record.payload));
        if rejected {
            return Err(StoreError::Unavailable("insert rejected".to_string()));
        }
        let id = RecordId::generate();
        state.inserted.push((id.clone(), record));
        Ok(id)
    }

    async fn delete(&self, _collection: &str, id: &RecordId) -> Result<(), StoreError> {
        let mut state = self.state.lock();
        if let Some(message) = &state.fail_delete {
            return Err(StoreError::PermissionDenied(message.clone()));
        }
        state.deleted.push(id.clone());
        Ok(())
    }

    async fn subscribe(&self, query: RecordQuery) -> Result<SnapshotStream, StoreError> {
        let stall = std::mem::take(&mut self.state.lock().stall_subscribe);
        if stall {
            std::future::pending::<()>().await;
        }
        let mut state = self.state.lock();
        if let Some(message) = &state.fail_subscribe {
            return Err(StoreError::Unavailable(message.clone()));
        }
        let (sender, receiver) = mpsc::unbounded_channel();
        state.queries.push(query);
        state.subscribers.push(sender);
        Ok(Box::pin(UnboundedReceiverStream::new(receiver)))
    }
}

/// Store that rejects every call with `Unavailable`.
#[derive(Clone)]
pub struct FailingStore {
    message: String,
}

impl FailingStore {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    fn error(&self) -> StoreError {
        StoreError::Unavailable(self.message.clone())
    }
}

#[async_trait]
impl DocumentStore for FailingStore {
    async fn insert(&self, _collection: &str, _record: NewRecord) -> Result<RecordId, StoreError> {
        Err(self.error())
    }

    async fn delete(&self, _collection: &str, _id: &RecordId) -> Result<(), StoreError> {
        Err(self.error())
    }

    async fn subscribe(&self, _query: RecordQuery) -> Result<SnapshotStream, StoreError> {
        Err(self.error())
    }
}
