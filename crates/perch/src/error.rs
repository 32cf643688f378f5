//! Error types for the Perch overlay.
//!
//! Most failures inside the overlay are absorbed: a failed native call is
//! logged and isolated, a failed click-through registration degrades hit
//! testing to sprite bounds. Only misuse (an empty bubble id, an empty prompt)
//! and configuration problems reach callers as [`OverlayError`].

use std::path::PathBuf;

use thiserror::Error;

use crate::window::WindowHandle;

/// A single window-manager call failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NativeCallError {
    /// The window is gone (closed natively or never existed).
    #[error("window {0} not found")]
    WindowNotFound(WindowHandle),

    /// The window manager refused or failed the operation.
    #[error("{operation} rejected: {reason}")]
    Rejected {
        operation: &'static str,
        reason: String,
    },
}

impl NativeCallError {
    pub fn rejected(operation: &'static str, reason: impl Into<String>) -> Self {
        Self::Rejected {
            operation,
            reason: reason.into(),
        }
    }
}

/// Handing the hit mask to the window manager failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    /// `set_hit_mask` failed.
    #[error("hit mask registration failed: {0}")]
    Registration(#[source] NativeCallError),

    /// `start_click_through_monitor` failed.
    #[error("click-through monitor failed to start: {0}")]
    Monitor(#[source] NativeCallError),

    /// The anchor window's bounds could not be read.
    #[error("sprite bounds unavailable: {0}")]
    Bounds(#[source] NativeCallError),

    /// The mask has no cells.
    #[error("refusing to publish an empty hit mask")]
    EmptyMask,
}

/// The target bubble is no longer registered.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("bubble {id:?} is not registered")]
pub struct MissingWindowError {
    pub id: String,
}

/// Loading or validating [`OverlayConfig`](crate::OverlayConfig) failed.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Errors surfaced by the public overlay API.
#[derive(Error, Debug)]
pub enum OverlayError {
    /// Bubble ids must be non-empty.
    #[error("bubble id must not be empty")]
    EmptyBubbleId,

    /// Prompts must contain non-whitespace text.
    #[error("prompt must not be empty")]
    EmptyPrompt,

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result type for overlay operations.
pub type OverlayResult<T> = Result<T, OverlayError>;

/// Result type for native window-manager calls.
pub type NativeResult<T> = Result<T, NativeCallError>;
