//! Record synchronization, ingestion, and presentation for jsonshelf.
//!
//! `RecordSync` keeps a live, owner-scoped view of the store; the ingestion
//! pipeline turns pasted JSON into inserts; the projection module derives the
//! table, previews, and detail text the front end renders.

pub mod error;
pub mod identity;
pub mod ingest;
pub mod projection;
pub mod sync;

pub use error::ShelfCoreError;
pub use identity::{IdentityProvider, LocalIdentity};
pub use ingest::{IngestError, IngestReport, IngestionPipeline, InsertFailure, JsonForm};
pub use projection::{RecordDetail, TableRow, TableView};
pub use sync::{RecordSync, RecordView, SyncPhase};
