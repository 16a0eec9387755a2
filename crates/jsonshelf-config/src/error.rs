//! Errors raised while loading jsonshelf config layers.

use thiserror::Error;

/// Why a config stack could not be turned into a `ShelfConfig`.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A layer file exists but could not be read.
    #[error("cannot read jsonshelf config: {0}")]
    ReadFailed(#[from] std::io::Error),
    /// A layer is not valid JSON5.
    #[error("jsonshelf config is not valid JSON5: {0}")]
    ParseFailed(#[from] json5::Error),
    /// The merged layers do not decode into the config model.
    #[error("jsonshelf config has an unexpected shape: {0}")]
    DecodeFailed(#[from] serde_json::Error),
    /// One key of one layer is unknown or has the wrong type.
    #[error("bad config key {path}: {message}")]
    InvalidField { path: String, message: String },
    /// The effective config breaks a rule spanning several keys.
    #[error("invalid jsonshelf config: {0}")]
    Invalid(String),
}
