//! Configuration model and layered config loading for jsonshelf.
//!
//! Owns the config schema, per-layer validation, and the merge rules used by
//! the terminal front end when it resolves store, identity, and view settings.

mod error;
mod loader;
mod model;

pub use error::ConfigError;
pub use loader::{ConfigLayer, ConfigLayerSource, LayeredConfig, LayeredConfigOptions};
pub use model::{
    IdentityConfig, LoggingConfig, ShelfConfig, ShelfConfigBuilder, StoreBackend, StoreConfig,
    ViewConfig,
};
