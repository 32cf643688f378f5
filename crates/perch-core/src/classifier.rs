//! Pointer classification against the sprite hit mask.
//!
//! [`PointerClassifier`] answers "is the pixel under the pointer interactive?"
//! for a pointer position and the rectangle the sprite currently occupies. The
//! rectangle and pointer may be in any unit (CSS pixels, logical pixels,
//! physical pixels) as long as both agree; the mask is mapped onto the
//! rectangle by ratio.

use std::sync::Arc;

use winit::keyboard::ModifiersState;

use crate::geometry::Rect;
use crate::hit_mask::HitMask;

/// How pointer positions are classified.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum HitTestMode {
    /// No mask yet. Nothing is interactive.
    #[default]
    Pending,
    /// Per-pixel classification against a mask.
    Mask(Arc<HitMask>),
    /// Coarse fallback: everything inside the sprite rectangle is interactive.
    Bounds,
}

/// Classifies pointer positions against the current [`HitTestMode`].
#[derive(Debug, Clone, Default)]
pub struct PointerClassifier {
    mode: HitTestMode,
}

impl PointerClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mask(mask: Arc<HitMask>) -> Self {
        Self {
            mode: HitTestMode::Mask(mask),
        }
    }

    pub fn mode(&self) -> &HitTestMode {
        &self.mode
    }

    /// The mask, when classifying per pixel.
    pub fn mask(&self) -> Option<&Arc<HitMask>> {
        match &self.mode {
            HitTestMode::Mask(mask) => Some(mask),
            _ => None,
        }
    }

    pub fn set_mask(&mut self, mask: Arc<HitMask>) {
        self.mode = HitTestMode::Mask(mask);
    }

    /// Switch to bounds-based detection.
    pub fn degrade_to_bounds(&mut self) {
        tracing::debug!(target: "perch_core::classifier", "hit testing degraded to sprite bounds");
        self.mode = HitTestMode::Bounds;
    }

    pub fn is_ready(&self) -> bool {
        !matches!(self.mode, HitTestMode::Pending)
    }

    /// Whether the pointer is over an interactive part of the sprite.
    ///
    /// The pointer is translated into `rect`-relative coordinates, scaled by
    /// `mask / rect` on each axis and floored. Anything outside the mask, a
    /// degenerate rectangle, or a classifier still pending yields `false`.
    pub fn is_interactive(&self, pointer_x: f64, pointer_y: f64, rect: Rect) -> bool {
        if !rect.has_area() {
            return false;
        }
        match &self.mode {
            HitTestMode::Pending => false,
            HitTestMode::Bounds => rect.contains(pointer_x, pointer_y),
            HitTestMode::Mask(mask) => {
                let scale_x = f64::from(mask.width()) / rect.width;
                let scale_y = f64::from(mask.height()) / rect.height;
                let mx = ((pointer_x - rect.x) * scale_x).floor();
                let my = ((pointer_y - rect.y) * scale_y).floor();
                if !(mx >= 0.0 && my >= 0.0) {
                    return false;
                }
                if mx >= f64::from(mask.width()) || my >= f64::from(mask.height()) {
                    return false;
                }
                mask.get(mx as u32, my as u32)
            }
        }
    }

    /// Decide what a primary-button press on the sprite should do.
    pub fn classify_press(
        &self,
        pointer_x: f64,
        pointer_y: f64,
        rect: Rect,
        modifiers: ModifiersState,
    ) -> PointerAction {
        if !self.is_interactive(pointer_x, pointer_y, rect) {
            PointerAction::PassThrough
        } else if modifiers.control_key() {
            PointerAction::ToggleRecording
        } else {
            PointerAction::Drag
        }
    }
}

/// Outcome of a press on the sprite window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerAction {
    /// Transparent pixel: let the press reach whatever is underneath.
    PassThrough,
    /// Opaque pixel: start dragging the anchor window.
    Drag,
    /// Opaque pixel with Ctrl held: toggle speech capture.
    ToggleRecording,
}

/// Tracks the OS "ignore cursor events" state of the anchor window.
///
/// Native click-through monitors poll the global cursor position and must only
/// touch the window when the decision flips. [`update`](Self::update) returns
/// the new decision on a change and `None` otherwise. Before any decision has
/// been made the window is assumed to be click-through.
#[derive(Debug, Clone, Default)]
pub struct ClickThroughGate {
    last_ignore: Option<bool>,
}

impl ClickThroughGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a screen-space cursor position and the sprite bounds.
    pub fn update(
        &mut self,
        classifier: &PointerClassifier,
        cursor_x: f64,
        cursor_y: f64,
        bounds: Rect,
    ) -> Option<bool> {
        let ignore = !classifier.is_interactive(cursor_x, cursor_y, bounds);
        if self.last_ignore == Some(ignore) {
            return None;
        }
        tracing::trace!(target: "perch_core::classifier", ignore, "click-through state changed");
        self.last_ignore = Some(ignore);
        Some(ignore)
    }

    pub fn is_ignoring(&self) -> bool {
        self.last_ignore.unwrap_or(true)
    }
}
