//! Document store abstraction with push subscriptions.
//!
//! A store persists JSON records per collection, assigns ids and timestamps,
//! and pushes a full ordered snapshot of the matching records to every
//! subscriber whenever the underlying data changes.

mod error;
mod file;
mod index;
mod memory;
mod query;
mod store;

pub use error::StoreError;
pub use file::FileDocumentStore;
pub use memory::MemoryDocumentStore;
pub use query::{RecordOrder, RecordQuery};
pub use store::{DocumentStore, SnapshotStream};
