//! Test helpers shared across jsonshelf crates.

pub mod records;
pub mod store;

pub use records::record;
pub use store::{FailingStore, ScriptedStore};
