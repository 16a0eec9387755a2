//! Live, owner-scoped view of the record store.
//!
//! `RecordSync` holds at most one store subscription. Every snapshot pushed by
//! the store replaces the published view wholesale; snapshots from a
//! subscription that has since been stopped or replaced are discarded.

use crate::ShelfCoreError;
use crate::identity::IdentityProvider;
use futures_util::StreamExt;
use jsonshelf_protocol::{OwnerId, Record, RecordId};
use jsonshelf_store::{DocumentStore, RecordQuery, SnapshotStream};
use log::{debug, info, warn};
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Lifecycle of the synchronized view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    /// No session, no subscription.
    Idle,
    /// Subscription requested; no snapshot yet.
    Subscribing,
    /// At least one snapshot has been applied.
    Live,
    /// Setup or the live stream failed; the list is empty.
    Errored,
}

/// Immutable snapshot of the synchronized state, replaced on every change.
#[derive(Debug, Clone)]
pub struct RecordView {
    /// Increments on every publish.
    pub version: u64,
    pub phase: SyncPhase,
    pub owner_id: Option<OwnerId>,
    /// Records in store order (newest first).
    pub records: Arc<[Record]>,
    pub error: Option<String>,
}

impl Default for RecordView {
    fn default() -> Self {
        Self {
            version: 0,
            phase: SyncPhase::Idle,
            owner_id: None,
            records: Arc::from(Vec::new()),
            error: None,
        }
    }
}

impl RecordView {
    /// True until the first snapshot for the current owner arrives.
    pub fn is_loading(&self) -> bool {
        self.phase == SyncPhase::Subscribing
    }
}

struct Current {
    generation: u64,
    owner_id: Option<OwnerId>,
    task: Option<JoinHandle<()>>,
}

struct Shared {
    current: Mutex<Current>,
    view: watch::Sender<Arc<RecordView>>,
}

impl Shared {
    /// Publish a new view. Callers hold the `current` lock.
    fn publish(
        &self,
        current: &Current,
        phase: SyncPhase,
        records: Arc<[Record]>,
        error: Option<String>,
    ) {
        self.view.send_modify(|view| {
            *view = Arc::new(RecordView {
                version: view.version + 1,
                phase,
                owner_id: current.owner_id.clone(),
                records,
                error,
            });
        });
    }

    /// Publish only if `generation` is still the active subscription.
    fn publish_for(
        &self,
        generation: u64,
        phase: SyncPhase,
        records: Arc<[Record]>,
        error: Option<String>,
    ) -> bool {
        let current = self.current.lock();
        if current.generation != generation {
            return false;
        }
        self.publish(&current, phase, records, error);
        true
    }
}

/// Keeps a local, ordered copy of the records owned by the current session.
pub struct RecordSync {
    store: Arc<dyn DocumentStore>,
    collection: String,
    shared: Arc<Shared>,
}

impl RecordSync {
    pub fn new(store: Arc<dyn DocumentStore>, collection: impl Into<String>) -> Self {
        let (view, _) = watch::channel(Arc::new(RecordView::default()));
        Self {
            store,
            collection: collection.into(),
            shared: Arc::new(Shared {
                current: Mutex::new(Current {
                    generation: 0,
                    owner_id: None,
                    task: None,
                }),
                view,
            }),
        }
    }

    /// Latest published view.
    pub fn view(&self) -> Arc<RecordView> {
        self.shared.view.borrow().clone()
    }

    /// Receiver notified on every published view.
    pub fn watch(&self) -> watch::Receiver<Arc<RecordView>> {
        self.shared.view.subscribe()
    }

    /// Subscribe to the records of `owner_id`.
    ///
    /// A no-op when already subscribing or live for the same owner. Any other
    /// active subscription is released first. On failure the view moves to
    /// `Errored` with an empty list and the error is returned; nothing retries.
    pub async fn start(&self, owner_id: OwnerId) -> Result<(), ShelfCoreError> {
        let generation = {
            let mut current = self.shared.current.lock();
            let phase = self.shared.view.borrow().phase;
            if current.owner_id.as_ref() == Some(&owner_id)
                && matches!(phase, SyncPhase::Subscribing | SyncPhase::Live)
            {
                debug!("subscription already active (owner_id={})", owner_id);
                return Ok(());
            }
            release(&mut current);
            current.owner_id = Some(owner_id.clone());
            self.shared
                .publish(&current, SyncPhase::Subscribing, Arc::from(Vec::new()), None);
            current.generation
        };

        info!(
            "starting record subscription (collection={}, owner_id={}, generation={})",
            self.collection, owner_id, generation
        );
        let query = RecordQuery::owned_by(self.collection.clone(), owner_id);
        let mut pending = PendingStart {
            shared: &self.shared,
            generation,
            settled: false,
        };
        let subscribed = self.store.subscribe(query).await;
        pending.settled = true;

        let mut current = self.shared.current.lock();
        if current.generation != generation {
            debug!(
                "discarding superseded subscription (generation={})",
                generation
            );
            return Ok(());
        }
        match subscribed {
            Ok(stream) => {
                let shared = Arc::clone(&self.shared);
                current.task = Some(tokio::spawn(pump(shared, generation, stream)));
                Ok(())
            }
            Err(err) => {
                warn!("record subscription failed (error={})", err);
                self.shared.publish(
                    &current,
                    SyncPhase::Errored,
                    Arc::from(Vec::new()),
                    Some(err.to_string()),
                );
                Err(ShelfCoreError::SubscriptionFailure(err))
            }
        }
    }

    /// Release the subscription and return to `Idle`. Snapshots still in flight are ignored.
    pub fn stop(&self) {
        let mut current = self.shared.current.lock();
        if current.owner_id.is_none() && current.task.is_none() {
            return;
        }
        release(&mut current);
        current.owner_id = None;
        self.shared
            .publish(&current, SyncPhase::Idle, Arc::from(Vec::new()), None);
        info!("stopped record subscription");
    }

    /// Ask the store to delete a record.
    ///
    /// The local list is left alone; the removal shows up with the next snapshot.
    pub async fn delete(&self, id: &RecordId) -> Result<(), ShelfCoreError> {
        if self.shared.current.lock().owner_id.is_none() {
            return Err(ShelfCoreError::NoSession);
        }
        self.store
            .delete(&self.collection, id)
            .await
            .map_err(ShelfCoreError::MutationFailure)?;
        debug!("delete accepted (collection={}, id={})", self.collection, id);
        Ok(())
    }

    /// Track an identity provider: sign-in starts or switches the
    /// subscription, sign-out stops it. The task ends when either side is dropped.
    pub fn follow_identity(self: &Arc<Self>, identity: Arc<dyn IdentityProvider>) -> JoinHandle<()> {
        let sync: Weak<Self> = Arc::downgrade(self);
        let mut users = identity.watch();
        tokio::spawn(async move {
            loop {
                let user = users.borrow_and_update().clone();
                let Some(sync) = sync.upgrade() else { break };
                match user {
                    Some(user) => {
                        if let Err(err) = sync.start(user.id).await {
                            warn!("failed to follow signed-in user (error={})", err);
                        }
                    }
                    None => sync.stop(),
                }
                drop(sync);
                if users.changed().await.is_err() {
                    break;
                }
            }
        })
    }
}

impl Drop for RecordSync {
    fn drop(&mut self) {
        release(&mut self.shared.current.lock());
    }
}

/// Rolls a `start` back to `Idle` when its future is dropped mid-subscribe.
struct PendingStart<'a> {
    shared: &'a Shared,
    generation: u64,
    settled: bool,
}

impl Drop for PendingStart<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let mut current = self.shared.current.lock();
        if current.generation != self.generation {
            return;
        }
        release(&mut current);
        current.owner_id = None;
        self.shared
            .publish(&current, SyncPhase::Idle, Arc::from(Vec::new()), None);
        debug!(
            "subscription setup cancelled (generation={})",
            self.generation
        );
    }
}

/// Invalidate the active generation and abort its task.
fn release(current: &mut Current) {
    current.generation += 1;
    if let Some(task) = current.task.take() {
        task.abort();
    }
}

async fn pump(shared: Arc<Shared>, generation: u64, mut stream: SnapshotStream) {
    while let Some(item) = stream.next().await {
        match item {
            Ok(records) => {
                let count = records.len();
                if !shared.publish_for(generation, SyncPhase::Live, Arc::from(records), None) {
                    debug!("dropping stale snapshot (generation={})", generation);
                    return;
                }
                debug!(
                    "applied snapshot (generation={}, records={})",
                    generation, count
                );
            }
            Err(err) => {
                warn!("record subscription failed (error={})", err);
                shared.publish_for(
                    generation,
                    SyncPhase::Errored,
                    Arc::from(Vec::new()),
                    Some(err.to_string()),
                );
                return;
            }
        }
    }
    debug!("snapshot stream closed (generation={})", generation);
}
