use thiserror::Error;

/// Errors returned by document stores.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing backing files failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// A stored document could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    /// The caller is not allowed to read or write the requested records.
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    /// The store cannot serve the request right now.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}
