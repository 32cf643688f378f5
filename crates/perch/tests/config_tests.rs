//! Loading and saving `perch.toml`.

use std::time::Duration;

use perch::{BubbleSettings, ConfigError, LogicalPosition, OverlayConfig};

#[test]
fn test_load_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("perch.toml");
    std::fs::write(
        &path,
        r#"
        [bubble]
        default_offset_x = 120.0
        content_route = "bubble/index.html"

        [hit_test]
        alpha_threshold = 10
        sprite = "duck.png"

        [logging]
        filter = "perch=debug"
        "#,
    )
    .unwrap();

    let config = OverlayConfig::load(&path).unwrap();

    let settings = config.bubble_settings();
    assert_eq!(settings.default_offset, LogicalPosition::new(120.0, 41.0));
    assert_eq!(settings.content_route, "bubble/index.html");
    assert_eq!(settings.frame_interval, Duration::from_millis(16));
    assert_eq!(config.hit_mask_builder().threshold(), 10);
    assert_eq!(config.hit_test.sprite.as_deref(), Some(std::path::Path::new("duck.png")));
    assert_eq!(config.logging.filter, "perch=debug");
}

#[test]
fn test_load_missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");

    match OverlayConfig::load(&path) {
        Err(ConfigError::Io { path: reported, .. }) => assert_eq!(reported, path),
        other => panic!("expected io error, got {other:?}"),
    }
    assert_eq!(OverlayConfig::load_or_default(&path), OverlayConfig::default());
}

#[test]
fn test_invalid_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let syntax = dir.path().join("syntax.toml");
    std::fs::write(&syntax, "[bubble\ninitial_width = 3").unwrap();
    let semantic = dir.path().join("semantic.toml");
    std::fs::write(&semantic, "[sync]\nframe_interval_ms = 0\n").unwrap();

    assert!(matches!(OverlayConfig::load(&syntax), Err(ConfigError::Parse(_))));
    assert!(matches!(OverlayConfig::load(&semantic), Err(ConfigError::Invalid(_))));
    assert_eq!(OverlayConfig::load_or_default(&syntax), OverlayConfig::default());
    assert_eq!(OverlayConfig::load_or_default(&semantic), OverlayConfig::default());
}

#[test]
fn test_save_then_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("perch.toml");

    let mut config = OverlayConfig::default();
    config.bubble.initial_width = 320;
    config.sync.frame_interval_ms = 8;
    config.hit_test.sprite = Some("sprites/duck.png".into());
    config.save(&path).unwrap();

    let loaded = OverlayConfig::load(&path).unwrap();
    assert_eq!(loaded, config);
    assert_eq!(loaded.frame_interval(), Duration::from_millis(8));
}

#[test]
fn test_defaults_match_registry_defaults() {
    assert_eq!(OverlayConfig::default().bubble_settings(), BubbleSettings::default());
}

#[test]
fn test_default_path_names_config_file() {
    // Platforms without a home directory have no default location.
    if let Some(path) = OverlayConfig::default_path() {
        assert_eq!(path.file_name().and_then(|name| name.to_str()), Some("perch.toml"));
    }
}
