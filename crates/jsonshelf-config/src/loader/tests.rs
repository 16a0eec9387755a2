//! Tests for layered configuration loading.

use super::*;
use crate::StoreConfig;
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write_json5(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("dir");
    }
    fs::write(path, contents).expect("write");
}

/// Options that only look at files inside the temp dir.
fn isolated_options(root: &Path, cwd: &Path) -> LayeredConfigOptions {
    let mut options = LayeredConfigOptions::new(cwd);
    options.system_config_path = Some(root.join("system.json5"));
    options.user_config_path = Some(root.join("user.json5"));
    options
}

#[test]
fn empty_config_uses_defaults() {
    let config = ShelfConfig::load_from_str("{}").expect("config");
    assert_eq!(config.store.backend, StoreBackend::Memory);
    assert_eq!(config.store.collection, "records");
    assert_eq!(config.view.preview_max_chars, 100);
    assert!(config.identity.user().is_none());
    assert!(config.logging.file.is_none());
}

#[test]
fn rejects_unknown_top_level_key() {
    let err = ShelfConfig::load_from_str("{ unexpected: true }").unwrap_err();
    assert!(format!("{err}").contains("config:unexpected"));
}

#[test]
fn rejects_unknown_backend() {
    let err = ShelfConfig::load_from_str(r#"{ store: { backend: "cloud" } }"#).unwrap_err();
    let msg = format!("{err}");
    assert!(msg.contains("store.backend"), "{msg}");
}

#[test]
fn file_backend_requires_path() {
    let err = ShelfConfig::load_from_str(r#"{ store: { backend: "file" } }"#).unwrap_err();
    assert!(format!("{err}").contains("store.path"));

    let config = ShelfConfig::load_from_str(r#"{ store: { backend: "file", path: "data" } }"#)
        .expect("config");
    assert_eq!(config.store.backend, StoreBackend::File);
}

#[test]
fn rejects_blank_collection_and_zero_preview() {
    let err = ShelfConfig::load_from_str(r#"{ store: { collection: "  " } }"#).unwrap_err();
    assert!(format!("{err}").contains("store.collection"));

    let err =
        ShelfConfig::load_from_str(r#"{ store: { collection: "my.records" } }"#).unwrap_err();
    assert!(format!("{err}").contains("store.collection"));
    assert!(ShelfConfig::load_from_str(r#"{ store: { collection: "my_records-2" } }"#).is_ok());

    let err = ShelfConfig::load_from_str("{ view: { preview_max_chars: 0 } }").unwrap_err();
    assert!(format!("{err}").contains("preview_max_chars"));

    let err = ShelfConfig::load_from_str("{ view: { preview_max_chars: -4 } }").unwrap_err();
    assert!(format!("{err}").contains("view.preview_max_chars"));
}

#[test]
fn identity_builds_user_only_with_id() {
    let config = ShelfConfig::load_from_str(
        r#"{ identity: { user_id: "u1", email: "u1@example.com" } }"#,
    )
    .expect("config");
    let user = config.identity.user().expect("user");
    assert_eq!(user.id.as_str(), "u1");
    assert_eq!(user.display_name(), "u1@example.com");

    let config =
        ShelfConfig::load_from_str(r#"{ identity: { user_id: " " } }"#).expect("config");
    assert!(config.identity.user().is_none());
}

#[test]
fn layers_apply_in_precedence_order() {
    let temp = TempDir::new().expect("tmp");
    let root = temp.path();
    let project_root = root.join("project");
    fs::create_dir_all(project_root.join(".git")).expect("git");
    let cwd = project_root.join("subdir");
    fs::create_dir_all(&cwd).expect("cwd");

    write_json5(
        &root.join("system.json5"),
        r#"{ store: { collection: "system" }, view: { preview_max_chars: 10 } }"#,
    );
    write_json5(
        &root.join("user.json5"),
        r#"{ store: { collection: "user" }, identity: { user_id: "u1" } }"#,
    );
    write_json5(
        &project_root.join(DEFAULT_CONFIG_FILE),
        r#"{ store: { collection: "project" } }"#,
    );
    write_json5(
        &cwd.join(DEFAULT_CONFIG_FILE),
        r#"{ store: { collection: "cwd" } }"#,
    );

    let layered =
        ShelfConfig::load_layered_with_options(isolated_options(root, &cwd)).expect("config");
    assert_eq!(layered.config.store.collection, "cwd");
    assert_eq!(layered.config.view.preview_max_chars, 10);
    assert_eq!(
        layered.config.identity.user_id.as_deref(),
        Some("u1")
    );
    let sources: Vec<_> = layered.layers.iter().map(|layer| layer.source).collect();
    assert_eq!(
        sources,
        vec![
            ConfigLayerSource::System,
            ConfigLayerSource::User,
            ConfigLayerSource::Project,
            ConfigLayerSource::Cwd,
        ]
    );
}

#[test]
fn runtime_layer_wins_and_must_exist() {
    let temp = TempDir::new().expect("tmp");
    let root = temp.path();
    let runtime = root.join("runtime.json5");
    write_json5(&root.join("user.json5"), r#"{ store: { collection: "user" } }"#);
    write_json5(&runtime, r#"{ store: { collection: "runtime" } }"#);

    let options = isolated_options(root, root).with_runtime_path(&runtime);
    let layered = ShelfConfig::load_layered_with_options(options).expect("config");
    assert_eq!(layered.config.store.collection, "runtime");
    assert_eq!(layered.layers.last().map(|layer| layer.source), Some(ConfigLayerSource::Runtime));

    let options = isolated_options(root, root).with_runtime_path(root.join("missing.json5"));
    let err = ShelfConfig::load_layered_with_options(options).unwrap_err();
    assert!(matches!(err, ConfigError::ReadFailed(_)));
}

#[test]
fn invalid_layer_reports_its_origin() {
    let temp = TempDir::new().expect("tmp");
    let root = temp.path();
    write_json5(&root.join("user.json5"), r#"{ view: { preview_max_chars: "many" } }"#);

    let err = ShelfConfig::load_layered_with_options(isolated_options(root, root)).unwrap_err();
    let msg = format!("{err}");
    assert!(msg.contains("user("), "{msg}");
    assert!(msg.contains("view.preview_max_chars"), "{msg}");
}

#[test]
fn cwd_equal_to_project_root_loads_once() {
    let temp = TempDir::new().expect("tmp");
    let root = temp.path();
    fs::create_dir_all(root.join(".git")).expect("git");
    write_json5(
        &root.join(DEFAULT_CONFIG_FILE),
        r#"{ store: { collection: "shared" } }"#,
    );

    let layered =
        ShelfConfig::load_layered_with_options(isolated_options(root, root)).expect("config");
    assert_eq!(layered.layers.len(), 1);
    assert_eq!(layered.layers[0].source, ConfigLayerSource::Project);
}

#[test]
fn resolved_store_path_is_relative_to_base() {
    let config = ShelfConfig::builder()
        .store(StoreConfig {
            backend: StoreBackend::File,
            path: Some("data".to_string()),
            collection: "records".to_string(),
        })
        .build();
    assert_eq!(
        config.store.resolved_path(Path::new("/srv/shelf")),
        Some(PathBuf::from("/srv/shelf/data"))
    );
}
