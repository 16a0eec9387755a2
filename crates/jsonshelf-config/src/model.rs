//! Configuration schema for jsonshelf.

use jsonshelf_protocol::{DEFAULT_COLLECTION, User};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root config for jsonshelf.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ShelfConfig {
    #[serde(default, rename = "$schema")]
    pub schema: Option<String>,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub identity: IdentityConfig,
    #[serde(default)]
    pub view: ViewConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ShelfConfig {
    /// Start building a config programmatically with defaults applied.
    pub fn builder() -> ShelfConfigBuilder {
        ShelfConfigBuilder::new()
    }
}

/// Builder for assembling a `ShelfConfig` in code.
#[derive(Debug, Default, Clone)]
pub struct ShelfConfigBuilder {
    config: ShelfConfig,
}

impl ShelfConfigBuilder {
    /// Create a new builder seeded with default config values.
    pub fn new() -> Self {
        Self {
            config: ShelfConfig::default(),
        }
    }

    /// Replace the document store configuration.
    pub fn store(mut self, store: StoreConfig) -> Self {
        self.config.store = store;
        self
    }

    /// Replace the identity configuration.
    pub fn identity(mut self, identity: IdentityConfig) -> Self {
        self.config.identity = identity;
        self
    }

    /// Replace the view configuration.
    pub fn view(mut self, view: ViewConfig) -> Self {
        self.config.view = view;
        self
    }

    /// Replace the logging configuration.
    pub fn logging(mut self, logging: LoggingConfig) -> Self {
        self.config.logging = logging;
        self
    }

    /// Finalize and return the built `ShelfConfig`.
    pub fn build(self) -> ShelfConfig {
        self.config
    }
}

/// Backing implementation for the document store.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    /// Process-local store; records vanish on exit.
    #[default]
    Memory,
    /// JSONL files under `store.path`.
    File,
}

/// Document store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default = "default_collection")]
    pub collection: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            path: None,
            collection: default_collection(),
        }
    }
}

impl StoreConfig {
    /// Resolve the store root against a base directory.
    pub fn resolved_path(&self, base: &std::path::Path) -> Option<PathBuf> {
        self.path.as_ref().map(|path| {
            let path = PathBuf::from(path);
            if path.is_absolute() {
                path
            } else {
                base.join(path)
            }
        })
    }
}

fn default_collection() -> String {
    DEFAULT_COLLECTION.to_string()
}

/// Local identity used when no external identity provider is wired in.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct IdentityConfig {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl IdentityConfig {
    /// Build the configured user, if a user id is present.
    pub fn user(&self) -> Option<User> {
        let user_id = self.user_id.as_deref()?.trim();
        if user_id.is_empty() {
            return None;
        }
        Some(User::new(user_id, self.email.clone()))
    }
}

/// Presentation settings for the record table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewConfig {
    #[serde(default = "default_preview_max_chars")]
    pub preview_max_chars: usize,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            preview_max_chars: default_preview_max_chars(),
        }
    }
}

fn default_preview_max_chars() -> usize {
    100
}

/// Log output settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LoggingConfig {
    /// File that receives log output; the terminal is owned by the UI.
    #[serde(default)]
    pub file: Option<String>,
}
