//! Error types for Perch core systems.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while constructing a [`HitMask`](crate::HitMask) from raw data.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HitMaskError {
    /// The flattened data does not cover exactly `width * height` cells.
    #[error("hit mask data length {actual} does not match {width}x{height}")]
    LengthMismatch {
        width: u32,
        height: u32,
        actual: usize,
    },

    /// Nested rows passed to [`HitMask::from_rows`](crate::HitMask::from_rows)
    /// have differing lengths.
    #[error("hit mask rows have inconsistent lengths")]
    RaggedRows,
}

/// Errors that can occur while decoding a sprite into a hit mask.
///
/// Decoding failures are never fatal for the overlay: the pointer classifier
/// stays in its pending state until the controller degrades it to bounds-based
/// detection.
#[derive(Error, Debug)]
pub enum ImageDecodeError {
    /// The sprite file could not be read.
    #[error("failed to read sprite {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The sprite data is not a supported raster format.
    #[error("failed to decode sprite: {0}")]
    Decode(#[from] image::ImageError),

    /// The blocking decode task panicked or was cancelled.
    #[error("sprite decode task failed: {0}")]
    Task(String),

    /// The decoded raster has no pixels.
    #[error("sprite has zero area ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },
}

/// Result type for hit mask construction.
pub type HitMaskResult<T> = Result<T, HitMaskError>;
