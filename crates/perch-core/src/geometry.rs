//! Geometry primitives and logical/physical pixel conversion.
//!
//! All native window-manager calls speak physical pixels. Content layout and
//! configured offsets are expressed in logical pixels. [`CoordinateTransform`]
//! converts between the two using a device scale factor:
//!
//! - `physical = floor(logical * scale + 0.5)` (round half up)
//! - `logical = physical / scale`
//! - content sizes round outwards: `ceil(logical * scale)`
//!
//! # Example
//!
//! ```
//! use perch_core::{CoordinateTransform, LogicalPosition, PhysicalPosition};
//!
//! let transform = CoordinateTransform::new(2.0);
//! let physical = transform.position_to_physical(LogicalPosition::new(150.0, 41.0));
//! assert_eq!(physical, PhysicalPosition::new(300, 82));
//! assert_eq!(transform.position_to_logical(physical), LogicalPosition::new(150.0, 41.0));
//! ```

use serde::{Deserialize, Serialize};

/// A position in physical (device) pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PhysicalPosition {
    pub x: i32,
    pub y: i32,
}

impl PhysicalPosition {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Component-wise addition.
    pub const fn offset_by(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
        }
    }
}

/// A size in physical (device) pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PhysicalSize {
    pub width: u32,
    pub height: u32,
}

impl PhysicalSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// A position in logical (device-independent) pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LogicalPosition {
    pub x: f64,
    pub y: f64,
}

impl LogicalPosition {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A size in logical (device-independent) pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LogicalSize {
    pub width: f64,
    pub height: f64,
}

impl LogicalSize {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// An axis-aligned rectangle used for pointer classification.
///
/// The unit is whatever the caller measures pointer positions in; the
/// classifier only needs the ratio between the rectangle and the mask.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Whether the rectangle has a strictly positive, finite area.
    pub fn has_area(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }

    /// Half-open containment test (`x <= px < x + width`).
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x && y >= self.y && x < self.x + self.width && y < self.y + self.height
    }
}

/// The anchor window's on-screen rectangle in physical pixels, captured when
/// the hit mask is handed to the window manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SpriteBounds {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl SpriteBounds {
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Bounds from a window's outer position and size.
    pub const fn from_parts(position: PhysicalPosition, size: PhysicalSize) -> Self {
        Self::new(position.x, position.y, size.width, size.height)
    }

    pub fn to_rect(self) -> Rect {
        Rect::new(
            f64::from(self.x),
            f64::from(self.y),
            f64::from(self.width),
            f64::from(self.height),
        )
    }
}

/// Converts between logical and physical pixels for one scale factor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateTransform {
    scale: f64,
}

impl Default for CoordinateTransform {
    fn default() -> Self {
        Self { scale: 1.0 }
    }
}

impl CoordinateTransform {
    /// Create a transform for the given scale factor.
    ///
    /// A non-finite or non-positive factor is replaced with `1.0`.
    pub fn new(scale: f64) -> Self {
        if scale.is_finite() && scale > 0.0 {
            Self { scale }
        } else {
            tracing::warn!(
                target: "perch_core::geometry",
                scale,
                "invalid scale factor, falling back to 1.0"
            );
            Self::default()
        }
    }

    /// The scale factor in use.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Logical scalar to physical, rounding half up.
    pub fn to_physical(&self, logical: f64) -> i32 {
        round_half_up(logical * self.scale)
    }

    /// Physical scalar to logical.
    pub fn to_logical(&self, physical: i32) -> f64 {
        f64::from(physical) / self.scale
    }

    pub fn position_to_physical(&self, position: LogicalPosition) -> PhysicalPosition {
        PhysicalPosition::new(self.to_physical(position.x), self.to_physical(position.y))
    }

    pub fn position_to_logical(&self, position: PhysicalPosition) -> LogicalPosition {
        LogicalPosition::new(self.to_logical(position.x), self.to_logical(position.y))
    }

    /// Logical content size to physical, rounding each axis up so content is
    /// never clipped.
    pub fn size_to_physical_ceil(&self, size: LogicalSize) -> PhysicalSize {
        PhysicalSize::new(
            ceil_dimension(size.width * self.scale),
            ceil_dimension(size.height * self.scale),
        )
    }
}

/// Where a dependent window sits relative to its anchor: the offset applies to
/// the window's bottom-left corner, so the top edge is lifted by its height.
pub fn place_above_anchor(
    anchor: PhysicalPosition,
    offset: PhysicalPosition,
    height: u32,
) -> PhysicalPosition {
    let height = i32::try_from(height).unwrap_or(i32::MAX);
    anchor
        .offset_by(offset.x, offset.y)
        .offset_by(0, height.saturating_neg())
}

fn round_half_up(value: f64) -> i32 {
    let rounded = (value + 0.5).floor();
    // `as` saturates at the i32 range and maps NaN to zero.
    rounded as i32
}

fn ceil_dimension(value: f64) -> u32 {
    if value.is_finite() && value > 0.0 {
        value.ceil() as u32
    } else {
        0
    }
}

// ============================================================================
// winit interop
// ============================================================================

impl From<winit::dpi::PhysicalPosition<i32>> for PhysicalPosition {
    fn from(p: winit::dpi::PhysicalPosition<i32>) -> Self {
        Self::new(p.x, p.y)
    }
}

impl From<PhysicalPosition> for winit::dpi::PhysicalPosition<i32> {
    fn from(p: PhysicalPosition) -> Self {
        winit::dpi::PhysicalPosition::new(p.x, p.y)
    }
}

impl From<winit::dpi::PhysicalSize<u32>> for PhysicalSize {
    fn from(s: winit::dpi::PhysicalSize<u32>) -> Self {
        Self::new(s.width, s.height)
    }
}

impl From<PhysicalSize> for winit::dpi::PhysicalSize<u32> {
    fn from(s: PhysicalSize) -> Self {
        winit::dpi::PhysicalSize::new(s.width, s.height)
    }
}

impl From<winit::dpi::LogicalSize<f64>> for LogicalSize {
    fn from(s: winit::dpi::LogicalSize<f64>) -> Self {
        Self::new(s.width, s.height)
    }
}

impl From<LogicalSize> for winit::dpi::LogicalSize<f64> {
    fn from(s: LogicalSize) -> Self {
        winit::dpi::LogicalSize::new(s.width, s.height)
    }
}

impl From<LogicalPosition> for winit::dpi::LogicalPosition<f64> {
    fn from(p: LogicalPosition) -> Self {
        winit::dpi::LogicalPosition::new(p.x, p.y)
    }
}
