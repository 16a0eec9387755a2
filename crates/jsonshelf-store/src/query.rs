use jsonshelf_protocol::OwnerId;

/// Sort order applied to subscription snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordOrder {
    /// Newest first; records created in the same instant keep insertion order, newest first.
    #[default]
    CreatedAtDesc,
}

/// Live query over one collection, restricted to a single owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordQuery {
    pub collection: String,
    pub owner_id: OwnerId,
    pub order: RecordOrder,
}

impl RecordQuery {
    /// Records in `collection` owned by `owner_id`, newest first.
    pub fn owned_by(collection: impl Into<String>, owner_id: OwnerId) -> Self {
        Self {
            collection: collection.into(),
            owner_id,
            order: RecordOrder::CreatedAtDesc,
        }
    }
}
