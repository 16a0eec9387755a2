//! Terminal UI for storing and browsing JSON records.

use anyhow::Context;
use clap::Parser;
use jsonshelf_config::{LayeredConfigOptions, LoggingConfig, ShelfConfig, StoreBackend};
use jsonshelf_core::LocalIdentity;
use jsonshelf_protocol::User;
use jsonshelf_store::{DocumentStore, FileDocumentStore, MemoryDocumentStore};
use jsonshelf_tui::TuiConfig;
use log::{LevelFilter, debug, info};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Command-line options for the jsonshelf TUI.
#[derive(Parser)]
#[command(name = "jsonshelf", version)]
struct Cli {
    /// Extra jsonshelf.json5 applied on top of the discovered layers
    #[arg(long)]
    config: Option<PathBuf>,
    /// Sign in as this user id on startup
    #[arg(long)]
    user: Option<String>,
    /// Email shown for the signed-in user
    #[arg(long, requires = "user")]
    email: Option<String>,
    /// Directory for the file-backed store (implies the file backend)
    #[arg(long, conflicts_with = "memory")]
    store: Option<PathBuf>,
    /// Keep records in memory only
    #[arg(long)]
    memory: bool,
}

/// Entry point for the jsonshelf TUI.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cwd = std::env::current_dir().context("failed to resolve current working directory")?;

    let mut options = LayeredConfigOptions::new(&cwd);
    if let Some(path) = cli.config.as_ref() {
        options = options.with_runtime_path(path);
    }
    let layered =
        ShelfConfig::load_layered_with_options(options).context("failed to load layered config")?;
    let config = layered.config;

    init_logging(&config.logging, &cwd)?;
    info!(
        "starting jsonshelf (config_set={}, layers={}, user_set={}, memory={})",
        cli.config.is_some(),
        layered.layers.len(),
        cli.user.is_some(),
        cli.memory
    );

    let store = open_store(&cli, &config, &cwd)?;

    let user = match cli.user.as_deref().map(str::trim) {
        Some(user_id) if !user_id.is_empty() => Some(User::new(user_id, cli.email.clone())),
        _ => config.identity.user(),
    };
    debug!("initial identity resolved (signed_in={})", user.is_some());
    let identity = Arc::new(LocalIdentity::new(user));

    let tui_config = TuiConfig {
        collection: config.store.collection.clone(),
        preview_max_chars: config.view.preview_max_chars,
    };
    jsonshelf_tui::run(store, identity, tui_config)
        .await
        .context("tui exited with an error")
}

/// Pick the store backend from the command line, then the config.
fn open_store(
    cli: &Cli,
    config: &ShelfConfig,
    cwd: &Path,
) -> anyhow::Result<Arc<dyn DocumentStore>> {
    if cli.memory {
        info!("using in-memory store");
        return Ok(Arc::new(MemoryDocumentStore::new()));
    }
    let root = match (&cli.store, config.store.backend) {
        (Some(path), _) => Some(cwd.join(path)),
        (None, StoreBackend::File) => config.store.resolved_path(cwd),
        (None, StoreBackend::Memory) => None,
    };
    match root {
        Some(root) => {
            info!("using file store (root={})", root.display());
            let store = FileDocumentStore::open(&root)
                .with_context(|| format!("failed to open store at {}", root.display()))?;
            Ok(Arc::new(store))
        }
        None => {
            info!("using in-memory store");
            Ok(Arc::new(MemoryDocumentStore::new()))
        }
    }
}

/// Send logs to the configured file; without one, only `RUST_LOG` turns logging on.
///
/// Nothing goes to stderr by default since the terminal is owned by the UI.
fn init_logging(logging: &LoggingConfig, cwd: &Path) -> anyhow::Result<()> {
    let mut builder = env_logger::builder();
    builder.format_timestamp_millis();
    match logging.file.as_deref().filter(|file| !file.trim().is_empty()) {
        Some(file) => {
            let path = cwd.join(file);
            let target = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            builder
                .filter_level(LevelFilter::Info)
                .target(env_logger::Target::Pipe(Box::new(target)));
        }
        None => {
            builder.filter_level(LevelFilter::Off);
        }
    }
    let _ = builder.parse_default_env().try_init();
    Ok(())
}
