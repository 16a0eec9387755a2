//! Error types for the core crate.

use crate::ingest::IngestError;
use jsonshelf_store::StoreError;
use thiserror::Error;

/// Errors returned by record synchronization and user actions.
#[derive(Debug, Error)]
pub enum ShelfCoreError {
    /// The live query could not be established.
    #[error("Error setting up data listener: {0}")]
    SubscriptionFailure(#[source] StoreError),
    /// A delete call was rejected by the store.
    #[error("Error deleting record: {0}")]
    MutationFailure(#[source] StoreError),
    /// The action needs a signed-in user.
    #[error("Please sign in to view data")]
    NoSession,
    /// Submitting JSON failed.
    #[error(transparent)]
    Ingest(#[from] IngestError),
}
