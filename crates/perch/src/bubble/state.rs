//! Per-bubble registry records.

use perch_core::{PhysicalPosition, Subscription};

use crate::window::WindowHandle;

/// Where a bubble is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BubbleLifecycle {
    /// Not registered.
    Closed,
    /// Registered; the native window is being created.
    Opening,
    /// Created hidden; waiting for its content to report a size.
    AwaitingFirstLayout,
    /// Laid out and visible; eligible for move-driven repositioning.
    Positioned,
}

/// Identifies one instance of a bubble.
///
/// Re-opening an id creates a new instance with a new generation, so work
/// started for the old instance can tell it has been superseded.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BubbleKey {
    pub id: String,
    pub generation: u64,
}

impl BubbleKey {
    pub fn new(id: impl Into<String>, generation: u64) -> Self {
        Self {
            id: id.into(),
            generation,
        }
    }
}

/// Registry record of a live bubble.
#[derive(Debug)]
pub(crate) struct BubbleEntry {
    pub(crate) generation: u64,
    pub(crate) window: Option<WindowHandle>,
    /// Physical offset from the anchor, captured at open.
    pub(crate) offset: PhysicalPosition,
    pub(crate) scale_factor: f64,
    pub(crate) lifecycle: BubbleLifecycle,
    pub(crate) layout_listener: Option<Subscription>,
    pub(crate) move_listener: Option<Subscription>,
}

impl BubbleEntry {
    pub(crate) fn opening(generation: u64) -> Self {
        Self {
            generation,
            window: None,
            offset: PhysicalPosition::default(),
            scale_factor: 1.0,
            lifecycle: BubbleLifecycle::Opening,
            layout_listener: None,
            move_listener: None,
        }
    }

    /// Cancel both listeners. Returns the window, if one was created.
    pub(crate) fn detach(&mut self) -> Option<WindowHandle> {
        if let Some(listener) = self.layout_listener.take() {
            listener.cancel();
        }
        if let Some(listener) = self.move_listener.take() {
            listener.cancel();
        }
        self.window.take()
    }
}
