//! Local client bundling the record model, ingestion, and identity for the TUI.

use jsonshelf_core::{
    IdentityProvider, IngestError, IngestReport, IngestionPipeline, LocalIdentity, RecordSync,
    RecordView, ShelfCoreError,
};
use jsonshelf_protocol::{OwnerId, RecordId, User};
use jsonshelf_store::DocumentStore;
use log::{debug, info};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Everything the TUI needs to act on the store for the signed-in user.
pub struct ShelfClient {
    sync: Arc<RecordSync>,
    pipeline: IngestionPipeline,
    identity: Arc<LocalIdentity>,
    follower: JoinHandle<()>,
}

impl ShelfClient {
    /// Wire the record model to `identity`; it subscribes as soon as a user is signed in.
    pub fn new(
        store: Arc<dyn DocumentStore>,
        identity: Arc<LocalIdentity>,
        collection: &str,
    ) -> Self {
        let sync = Arc::new(RecordSync::new(store.clone(), collection));
        let follower = sync.follow_identity(identity.clone());
        debug!("shelf client initialized (collection={})", collection);
        Self {
            sync,
            pipeline: IngestionPipeline::new(store, collection),
            identity,
            follower,
        }
    }

    pub fn views(&self) -> watch::Receiver<Arc<RecordView>> {
        self.sync.watch()
    }

    pub fn users(&self) -> watch::Receiver<Option<User>> {
        self.identity.watch()
    }

    pub fn current_owner(&self) -> Option<OwnerId> {
        self.identity.current_user().map(|user| user.id)
    }

    pub fn sign_in(&self, user_id: &str) {
        self.identity.sign_in(User::new(user_id.trim(), None));
    }

    pub async fn sign_out(&self) -> Result<(), ShelfCoreError> {
        self.identity.sign_out().await
    }

    /// Submit JSON text on behalf of `owner_id`.
    pub async fn submit(
        &self,
        text: &str,
        owner_id: &OwnerId,
    ) -> Result<IngestReport, IngestError> {
        info!("submitting json (owner_id={}, text_len={})", owner_id, text.len());
        self.pipeline.ingest(text, owner_id).await
    }

    pub async fn delete(&self, id: &RecordId) -> Result<(), ShelfCoreError> {
        info!("deleting record (id={})", id);
        self.sync.delete(id).await
    }
}

impl Drop for ShelfClient {
    fn drop(&mut self) {
        self.follower.abort();
        self.sync.stop();
    }
}
