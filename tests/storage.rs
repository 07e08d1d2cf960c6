use futures::executor::block_on;
use std::path::PathBuf;
use std::time::Duration;

use photo_canvas::config::{ConfigError, EditorConfig};
use photo_canvas::error::StoreError;
use photo_canvas::store::{JsonFileStore, Project, ProjectId, ProjectPatch, ProjectStore};

/// Fresh directory under the system temp dir
fn scratch_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("photo_canvas-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn test_missing_config_uses_defaults() {
    let dir = scratch_dir();
    let config = EditorConfig::load(&dir.join("absent.json")).unwrap();

    assert_eq!(config, EditorConfig::default());
    assert_eq!(config.save_debounce(), Duration::from_millis(2000));
    assert_eq!(config.viewport_padding, 40.0);
    assert_eq!(config.default_background, "#ffffff");
}

#[test]
fn test_partial_config_fills_defaults() {
    let dir = scratch_dir();
    let path = dir.join("config.json");
    std::fs::write(&path, r#"{ "save_debounce_ms": 500 }"#).unwrap();

    let config = EditorConfig::load(&path).unwrap();
    assert_eq!(config.save_debounce(), Duration::from_millis(500));
    assert_eq!(config.crop_inset, 0.1);
    assert_eq!(config.min_crop_size, 2.0);
}

#[test]
fn test_invalid_config_is_an_error() {
    let dir = scratch_dir();
    let path = dir.join("config.json");
    std::fs::write(&path, "not json").unwrap();

    assert!(matches!(EditorConfig::load(&path), Err(ConfigError::Parse(_))));
}

#[test]
fn test_file_store_round_trip_and_update() {
    let store = JsonFileStore::new(scratch_dir());
    let id = ProjectId::new("beach-day");
    let project = Project::new(id.clone(), "Beach", 1200, 800).with_image("photos/beach.jpg");
    store.insert(&project).unwrap();

    assert_eq!(block_on(store.get(&id)).unwrap(), project);

    let patch = ProjectPatch {
        current_image_url: Some(Some("photos/beach-cut.png".to_owned())),
        background_removed: Some(true),
        ..ProjectPatch::scene("{\"version\":1}".to_owned())
    };
    block_on(store.update(&id, patch)).unwrap();

    let stored = block_on(store.get(&id)).unwrap();
    assert_eq!(stored.canvas_state.as_deref(), Some("{\"version\":1}"));
    assert_eq!(stored.display_image_url(), Some("photos/beach-cut.png"));
    assert!(stored.background_removed);
    assert_eq!(stored.original_image_url.as_deref(), Some("photos/beach.jpg"));
    assert_eq!((stored.width, stored.height), (1200, 800));
}

#[test]
fn test_file_store_unknown_project() {
    let store = JsonFileStore::new(scratch_dir());
    let id = ProjectId::new("nowhere");

    assert!(matches!(block_on(store.get(&id)), Err(StoreError::NotFound(_))));
    let result = block_on(store.update(&id, ProjectPatch::default()));
    assert!(matches!(result, Err(StoreError::NotFound(_))));
}

#[test]
fn test_file_store_keeps_ids_inside_directory() {
    let dir = scratch_dir();
    let store = JsonFileStore::new(dir.join("projects"));
    let id = ProjectId::new("../escape");
    store.insert(&Project::new(id.clone(), "Escape", 10, 10)).unwrap();

    assert!(block_on(store.get(&id)).is_ok());
    assert!(!dir.join("escape.json").exists());
}
