//! The window-manager contract consumed by the overlay.
//!
//! Everything the overlay needs from the native windowing layer goes through
//! [`WindowHost`]. All positions and sizes are physical pixels except the
//! content size carried by [`WindowEvent::Resized`], which is reported in
//! logical pixels by the bubble's content.

use std::fmt;

use perch_core::{
    HitMaskPayload, LogicalSize, PhysicalPosition, PhysicalSize, SpriteBounds, Subscription,
};

use super::floating_style::FloatingWindowStyle;
use crate::error::NativeResult;

/// Opaque identifier of a native window owned by a [`WindowHost`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowHandle(u64);

impl WindowHandle {
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for WindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Kinds of window notifications a listener can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WindowEventKind {
    Moved,
    Resized,
    Created,
    Error,
}

/// A notification from the window manager.
#[derive(Debug, Clone, PartialEq)]
pub enum WindowEvent {
    /// The window's outer position changed.
    Moved(PhysicalPosition),
    /// The window's content reported its laid-out size.
    Resized(LogicalSize),
    /// Native creation finished.
    Created,
    /// Native creation or loading failed.
    Error(String),
}

impl WindowEvent {
    pub fn kind(&self) -> WindowEventKind {
        match self {
            Self::Moved(_) => WindowEventKind::Moved,
            Self::Resized(_) => WindowEventKind::Resized,
            Self::Created => WindowEventKind::Created,
            Self::Error(_) => WindowEventKind::Error,
        }
    }
}

/// Listener callback handed to [`WindowHost::subscribe`].
///
/// Slots may run on any thread the host emits from, so they should forward
/// into a channel rather than touch overlay state directly.
pub type EventSlot = Box<dyn Fn(&WindowEvent) + Send + Sync>;

/// Parameters for [`WindowHost::create_window`].
#[derive(Debug, Clone, PartialEq)]
pub struct CreateWindowRequest {
    /// Stable label; bubbles use their id.
    pub label: String,
    /// Content reference loaded into the window.
    pub url: String,
    pub position: PhysicalPosition,
    pub size: PhysicalSize,
    pub style: FloatingWindowStyle,
}

/// Native window-manager operations.
///
/// Every method is a suspension point. Implementations report failures as
/// [`NativeCallError`](crate::NativeCallError); callers decide whether they
/// are fatal.
#[allow(async_fn_in_trait)]
pub trait WindowHost {
    async fn create_window(&self, request: CreateWindowRequest) -> NativeResult<WindowHandle>;

    async fn outer_position(&self, window: WindowHandle) -> NativeResult<PhysicalPosition>;

    async fn set_outer_position(
        &self,
        window: WindowHandle,
        position: PhysicalPosition,
    ) -> NativeResult<()>;

    async fn outer_size(&self, window: WindowHandle) -> NativeResult<PhysicalSize>;

    async fn set_outer_size(&self, window: WindowHandle, size: PhysicalSize) -> NativeResult<()>;

    async fn set_resizable(&self, window: WindowHandle, resizable: bool) -> NativeResult<()>;

    async fn show(&self, window: WindowHandle) -> NativeResult<()>;

    async fn focus(&self, window: WindowHandle) -> NativeResult<()>;

    async fn close(&self, window: WindowHandle) -> NativeResult<()>;

    async fn scale_factor(&self, window: WindowHandle) -> NativeResult<f64>;

    /// Register `slot` for `kind` notifications of `window`.
    async fn subscribe(
        &self,
        window: WindowHandle,
        kind: WindowEventKind,
        slot: EventSlot,
    ) -> NativeResult<Subscription>;

    /// Hand the flattened sprite mask to the window manager.
    async fn set_hit_mask(&self, payload: &HitMaskPayload) -> NativeResult<()>;

    /// Start OS-level click-through for the sprite at `bounds`.
    async fn start_click_through_monitor(
        &self,
        bounds: SpriteBounds,
        payload: &HitMaskPayload,
    ) -> NativeResult<()>;

    /// The window's on-screen rectangle.
    async fn bounds(&self, window: WindowHandle) -> NativeResult<SpriteBounds> {
        let position = self.outer_position(window).await?;
        let size = self.outer_size(window).await?;
        Ok(SpriteBounds::from_parts(position, size))
    }
}
