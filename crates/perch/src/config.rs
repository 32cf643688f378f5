//! Overlay configuration.
//!
//! Settings live in a TOML file. Every key is optional; missing keys take the
//! defaults shown here:
//!
//! ```toml
//! [bubble]
//! default_offset_x = 150.0
//! default_offset_y = 41.0
//! initial_width = 500
//! initial_height = 200
//! content_route = "chat-bubble.html"
//!
//! [hit_test]
//! alpha_threshold = 50
//! # sprite = "assets/duck.png"
//!
//! [sync]
//! frame_interval_ms = 16
//!
//! [logging]
//! filter = "info"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use perch_core::{ALPHA_THRESHOLD, HitMaskBuilder, LogicalPosition, PhysicalSize};
use serde::{Deserialize, Serialize};

use crate::bubble::BubbleSettings;
use crate::error::ConfigError;

const CONFIG_FILE_NAME: &str = "perch.toml";

/// Complete overlay configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    pub bubble: BubbleConfig,
    pub hit_test: HitTestConfig,
    pub sync: SyncConfig,
    pub logging: LoggingConfig,
}

/// `[bubble]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BubbleConfig {
    /// Logical pixels from the anchor's left edge to the bubble's left edge.
    pub default_offset_x: f64,
    /// Logical pixels from the anchor's top edge to the bubble's bottom edge.
    pub default_offset_y: f64,
    pub initial_width: u32,
    pub initial_height: u32,
    pub content_route: String,
}

impl Default for BubbleConfig {
    fn default() -> Self {
        Self {
            default_offset_x: 150.0,
            default_offset_y: 41.0,
            initial_width: 500,
            initial_height: 200,
            content_route: "chat-bubble.html".to_string(),
        }
    }
}

/// `[hit_test]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HitTestConfig {
    pub alpha_threshold: u8,
    pub sprite: Option<PathBuf>,
}

impl Default for HitTestConfig {
    fn default() -> Self {
        Self {
            alpha_threshold: ALPHA_THRESHOLD,
            sprite: None,
        }
    }
}

/// `[sync]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub frame_interval_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self { frame_interval_ms: 16 }
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing-subscriber` filter directive; `RUST_LOG` takes precedence.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

impl OverlayConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Read, parse and validate the file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// [`load`](Self::load), falling back to defaults when the file is
    /// missing or invalid.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(config) => config,
            Err(ConfigError::Io { source, .. })
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                tracing::debug!(
                    target: "perch::config",
                    path = %path.display(),
                    "no config file, using defaults",
                );
                Self::default()
            }
            Err(err) => {
                tracing::warn!(
                    target: "perch::config",
                    path = %path.display(),
                    error = %err,
                    "ignoring config",
                );
                Self::default()
            }
        }
    }

    /// Write the configuration as TOML, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let text = self.to_toml_string()?;
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        std::fs::write(path, text).map_err(io_err)
    }

    /// `perch.toml` in the platform config directory, if one can be determined.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("dev", "perch", "perch")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sync.frame_interval_ms == 0 {
            return Err(ConfigError::Invalid("sync.frame_interval_ms must be at least 1".into()));
        }
        if self.bubble.initial_width == 0 || self.bubble.initial_height == 0 {
            return Err(ConfigError::Invalid("bubble initial size must be non-zero".into()));
        }
        if !(self.bubble.default_offset_x.is_finite() && self.bubble.default_offset_y.is_finite()) {
            return Err(ConfigError::Invalid("bubble offsets must be finite".into()));
        }
        if self.bubble.content_route.is_empty() {
            return Err(ConfigError::Invalid("bubble.content_route must not be empty".into()));
        }
        Ok(())
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.sync.frame_interval_ms)
    }

    pub fn bubble_settings(&self) -> BubbleSettings {
        BubbleSettings {
            default_offset: LogicalPosition::new(
                self.bubble.default_offset_x,
                self.bubble.default_offset_y,
            ),
            initial_size: PhysicalSize::new(self.bubble.initial_width, self.bubble.initial_height),
            content_route: self.bubble.content_route.clone(),
            frame_interval: self.frame_interval(),
        }
    }

    pub fn hit_mask_builder(&self) -> HitMaskBuilder {
        HitMaskBuilder::new().with_threshold(self.hit_test.alpha_threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_bubble_settings() {
        let config = OverlayConfig::default();
        assert_eq!(config.bubble_settings(), BubbleSettings::default());
        assert_eq!(config.hit_mask_builder().threshold(), 50);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_document() {
        let config = OverlayConfig::from_toml_str(
            r#"
            [bubble]
            default_offset_y = 60.0

            [sync]
            frame_interval_ms = 33
            "#,
        )
        .unwrap();
        assert_eq!(config.bubble.default_offset_x, 150.0);
        assert_eq!(config.bubble.default_offset_y, 60.0);
        assert_eq!(config.frame_interval(), Duration::from_millis(33));
        assert_eq!(config.logging.filter, "info");
    }

    #[test]
    fn test_zero_frame_interval_rejected() {
        let err = OverlayConfig::from_toml_str("[sync]\nframe_interval_ms = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_malformed_toml() {
        let err = OverlayConfig::from_toml_str("[bubble\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = OverlayConfig::default();
        config.hit_test.sprite = Some(PathBuf::from("assets/duck.png"));
        config.hit_test.alpha_threshold = 80;
        let text = config.to_toml_string().unwrap();
        assert_eq!(OverlayConfig::from_toml_str(&text).unwrap(), config);
    }
}
