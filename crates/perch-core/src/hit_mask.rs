//! Per-pixel opacity masks for sprite hit testing.
//!
//! A [`HitMask`] records, for every pixel of the sprite, whether the pixel is
//! opaque enough to receive pointer input. Masks are built once per sprite load
//! by [`HitMaskBuilder`] and then shared read-only (usually behind an `Arc`)
//! with the pointer classifier and the native click-through bridge.
//!
//! # Example
//!
//! ```
//! use perch_core::{HitMaskBuilder, ALPHA_THRESHOLD};
//!
//! // A 2x2 sprite, alpha channel only.
//! let mask = HitMaskBuilder::new().mask_from_alpha(2, 2, &[0, 60, 200, 10]).unwrap();
//! assert_eq!(mask.data(), &[false, true, true, false]);
//! assert_eq!(ALPHA_THRESHOLD, 50);
//! ```

use std::path::PathBuf;

use image::{DynamicImage, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::error::{HitMaskError, HitMaskResult, ImageDecodeError};

/// Pixels with an alpha strictly greater than this value are interactive.
pub const ALPHA_THRESHOLD: u8 = 50;

/// Row-major boolean opacity grid.
///
/// Invariant: `data.len() == width * height`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HitMask {
    width: u32,
    height: u32,
    data: Vec<bool>,
}

impl HitMask {
    /// Create a mask from flattened row-major data.
    pub fn new(width: u32, height: u32, data: Vec<bool>) -> HitMaskResult<Self> {
        let expected = (width as usize).checked_mul(height as usize);
        if expected != Some(data.len()) {
            return Err(HitMaskError::LengthMismatch {
                width,
                height,
                actual: data.len(),
            });
        }
        Ok(Self { width, height, data })
    }

    /// Reconstruct a mask from nested rows (`rows[y][x]`).
    pub fn from_rows(rows: &[Vec<bool>]) -> HitMaskResult<Self> {
        let width = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|row| row.len() != width) {
            return Err(HitMaskError::RaggedRows);
        }
        let data: Vec<bool> = rows.iter().flatten().copied().collect();
        let width = u32::try_from(width).map_err(|_| HitMaskError::LengthMismatch {
            width: u32::MAX,
            height: 0,
            actual: data.len(),
        })?;
        let height = u32::try_from(rows.len()).map_err(|_| HitMaskError::LengthMismatch {
            width,
            height: u32::MAX,
            actual: data.len(),
        })?;
        Self::new(width, height, data)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// The flattened row-major cells.
    pub fn data(&self) -> &[bool] {
        &self.data
    }

    /// Whether the cell at `(x, y)` is opaque. Out-of-range cells are not.
    pub fn get(&self, x: u32, y: u32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        let index = y as usize * self.width as usize + x as usize;
        self.data.get(index).copied().unwrap_or(false)
    }

    /// Nested row view (`rows()[y][x]`).
    pub fn rows(&self) -> Vec<Vec<bool>> {
        if self.width == 0 {
            return vec![Vec::new(); self.height as usize];
        }
        self.data
            .chunks(self.width as usize)
            .map(<[bool]>::to_vec)
            .collect()
    }

    /// Number of interactive cells.
    pub fn opaque_count(&self) -> usize {
        self.data.iter().filter(|&&opaque| opaque).count()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Flatten into the wire form handed to the window manager.
    pub fn to_payload(&self) -> HitMaskPayload {
        HitMaskPayload {
            width: self.width,
            height: self.height,
            data: self.data.clone(),
        }
    }
}

/// Serializable flattened mask, as consumed by native click-through monitors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitMaskPayload {
    pub width: u32,
    pub height: u32,
    pub data: Vec<bool>,
}

impl TryFrom<HitMaskPayload> for HitMask {
    type Error = HitMaskError;

    fn try_from(payload: HitMaskPayload) -> Result<Self, Self::Error> {
        HitMask::new(payload.width, payload.height, payload.data)
    }
}

/// Where to load a sprite from.
#[derive(Debug, Clone)]
pub enum SpriteSource {
    /// An image file on disk.
    Path(PathBuf),
    /// Encoded image bytes (PNG, etc.).
    Bytes(Vec<u8>),
}

impl From<PathBuf> for SpriteSource {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<Vec<u8>> for SpriteSource {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

/// Decodes sprite rasters into [`HitMask`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HitMaskBuilder {
    threshold: u8,
}

impl Default for HitMaskBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl HitMaskBuilder {
    /// Builder using [`ALPHA_THRESHOLD`].
    pub const fn new() -> Self {
        Self {
            threshold: ALPHA_THRESHOLD,
        }
    }

    pub const fn with_threshold(mut self, threshold: u8) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    /// Build from a bare alpha channel, row-major.
    pub fn mask_from_alpha(&self, width: u32, height: u32, alpha: &[u8]) -> HitMaskResult<HitMask> {
        let data = alpha.iter().map(|&a| a > self.threshold).collect();
        HitMask::new(width, height, data)
    }

    /// Build from a decoded RGBA raster.
    pub fn mask_from_rgba(&self, image: &RgbaImage) -> HitMask {
        let (width, height) = image.dimensions();
        let data = image.pixels().map(|pixel| pixel.0[3] > self.threshold).collect();
        HitMask { width, height, data }
    }

    /// Build from any decoded image; non-alpha formats become fully opaque.
    pub fn mask_from_image(&self, image: &DynamicImage) -> Result<HitMask, ImageDecodeError> {
        let rgba = image.to_rgba8();
        let (width, height) = rgba.dimensions();
        if width == 0 || height == 0 {
            return Err(ImageDecodeError::EmptyImage { width, height });
        }
        Ok(self.mask_from_rgba(&rgba))
    }

    /// Decode a sprite synchronously.
    pub fn decode(&self, source: &SpriteSource) -> Result<HitMask, ImageDecodeError> {
        let image = match source {
            SpriteSource::Path(path) => {
                let bytes = std::fs::read(path).map_err(|source| ImageDecodeError::Io {
                    path: path.clone(),
                    source,
                })?;
                image::load_from_memory(&bytes)?
            }
            SpriteSource::Bytes(bytes) => image::load_from_memory(bytes)?,
        };
        self.mask_from_image(&image)
    }

    /// Decode a sprite on the blocking pool.
    ///
    /// The read and decode happen inside one blocking task, so the caller
    /// observes a single suspension point. Must be called within a Tokio
    /// runtime.
    #[tracing::instrument(skip_all, target = "perch_core::hit_mask", level = "trace")]
    pub async fn build(&self, source: SpriteSource) -> Result<HitMask, ImageDecodeError> {
        let builder = *self;
        let mask = tokio::task::spawn_blocking(move || builder.decode(&source))
            .await
            .map_err(|e| ImageDecodeError::Task(e.to_string()))??;
        tracing::debug!(
            target: "perch_core::hit_mask",
            width = mask.width(),
            height = mask.height(),
            opaque = mask.opaque_count(),
            "hit mask built"
        );
        Ok(mask)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba};
    use std::io::Cursor;

    fn png_bytes(image: &RgbaImage) -> Vec<u8> {
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_threshold_boundary() {
        let mask = HitMaskBuilder::new().mask_from_alpha(2, 1, &[50, 51]).unwrap();
        assert!(!mask.get(0, 0));
        assert!(mask.get(1, 0));
    }

    #[test]
    fn test_two_by_two_alpha() {
        let mask = HitMaskBuilder::new().mask_from_alpha(2, 2, &[0, 60, 200, 10]).unwrap();
        assert_eq!(mask.data(), &[false, true, true, false]);
        assert_eq!(mask.rows(), vec![vec![false, true], vec![true, false]]);
    }

    #[test]
    fn test_custom_threshold() {
        let mask = HitMaskBuilder::new()
            .with_threshold(100)
            .mask_from_alpha(3, 1, &[60, 100, 101])
            .unwrap();
        assert_eq!(mask.data(), &[false, false, true]);
    }

    #[test]
    fn test_length_mismatch() {
        let err = HitMask::new(3, 2, vec![true; 5]).unwrap_err();
        assert_eq!(
            err,
            HitMaskError::LengthMismatch {
                width: 3,
                height: 2,
                actual: 5
            }
        );
    }

    #[test]
    fn test_flatten_reconstruct_generated_grids() {
        for (width, height) in [(1usize, 1usize), (3, 7), (16, 4), (9, 9)] {
            let rows: Vec<Vec<bool>> = (0..height)
                .map(|y| (0..width).map(|x| (x * 31 + y * 17) % 3 == 0).collect())
                .collect();
            let mask = HitMask::from_rows(&rows).unwrap();
            assert_eq!(mask.width() as usize, width);
            assert_eq!(mask.height() as usize, height);
            assert_eq!(mask.rows(), rows);
            for (y, row) in rows.iter().enumerate() {
                for (x, &cell) in row.iter().enumerate() {
                    assert_eq!(mask.get(x as u32, y as u32), cell);
                }
            }
        }
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let rows = vec![vec![true, false], vec![true]];
        assert_eq!(HitMask::from_rows(&rows).unwrap_err(), HitMaskError::RaggedRows);
    }

    #[test]
    fn test_out_of_range_is_not_opaque() {
        let mask = HitMask::new(1, 1, vec![true]).unwrap();
        assert!(mask.get(0, 0));
        assert!(!mask.get(1, 0));
        assert!(!mask.get(0, 1));
    }

    #[test]
    fn test_payload_json_shape() {
        let mask = HitMask::new(2, 1, vec![true, false]).unwrap();
        let json = serde_json::to_value(mask.to_payload()).unwrap();
        assert_eq!(json, serde_json::json!({"width": 2, "height": 1, "data": [true, false]}));

        let parsed: HitMaskPayload = serde_json::from_value(json).unwrap();
        assert_eq!(HitMask::try_from(parsed).unwrap(), mask);
    }

    #[test]
    fn test_decode_png_bytes() {
        let mut image = RgbaImage::new(2, 2);
        image.put_pixel(0, 0, Rgba([255, 0, 0, 0]));
        image.put_pixel(1, 0, Rgba([255, 0, 0, 255]));
        image.put_pixel(0, 1, Rgba([255, 0, 0, 51]));
        image.put_pixel(1, 1, Rgba([255, 0, 0, 50]));

        let mask = HitMaskBuilder::new()
            .decode(&SpriteSource::Bytes(png_bytes(&image)))
            .unwrap();
        assert_eq!(mask.data(), &[false, true, true, false]);
    }

    #[test]
    fn test_decode_garbage_fails() {
        let err = HitMaskBuilder::new()
            .decode(&SpriteSource::Bytes(vec![1, 2, 3, 4]))
            .unwrap_err();
        assert!(matches!(err, ImageDecodeError::Decode(_)));
    }

    #[tokio::test]
    async fn test_build_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sprite.png");
        let mut image = RgbaImage::new(3, 1);
        image.put_pixel(2, 0, Rgba([0, 0, 0, 200]));
        std::fs::write(&path, png_bytes(&image)).unwrap();

        let mask = HitMaskBuilder::new().build(SpriteSource::Path(path)).await.unwrap();
        assert_eq!(mask.data(), &[false, false, true]);
    }

    #[tokio::test]
    async fn test_build_missing_file() {
        let err = HitMaskBuilder::new()
            .build(SpriteSource::Path(PathBuf::from("/definitely/not/here.png")))
            .await
            .unwrap_err();
        assert!(matches!(err, ImageDecodeError::Io { .. }));
    }
}
