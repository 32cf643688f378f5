//! Native style of frameless floating windows.

use perch_core::{PhysicalPosition, PhysicalSize};
use winit::dpi::{Position, Size};
use winit::window::{Window, WindowAttributes, WindowLevel};

/// Window-manager hints for a floating overlay window.
///
/// The defaults describe a bubble: frameless, transparent, always on top,
/// hidden from the taskbar, created invisible and revealed after its first
/// layout.
///
/// # Example
///
/// ```
/// use perch::window::FloatingWindowStyle;
///
/// let style = FloatingWindowStyle::bubble().with_visible(true);
/// assert!(style.always_on_top);
/// assert!(style.visible);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FloatingWindowStyle {
    pub decorations: bool,
    pub transparent: bool,
    pub always_on_top: bool,
    pub skip_taskbar: bool,
    pub visible: bool,
    pub resizable: bool,
}

impl Default for FloatingWindowStyle {
    fn default() -> Self {
        Self::bubble()
    }
}

impl FloatingWindowStyle {
    /// Style for dependent bubble windows.
    pub const fn bubble() -> Self {
        Self {
            decorations: false,
            transparent: true,
            always_on_top: true,
            skip_taskbar: true,
            visible: false,
            resizable: true,
        }
    }

    pub const fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    pub const fn with_resizable(mut self, resizable: bool) -> Self {
        self.resizable = resizable;
        self
    }

    pub const fn with_skip_taskbar(mut self, skip_taskbar: bool) -> Self {
        self.skip_taskbar = skip_taskbar;
        self
    }

    /// Convert to winit attributes for a window at `position` with outer
    /// `size`, both physical.
    pub fn to_window_attributes(
        &self,
        title: &str,
        position: PhysicalPosition,
        size: PhysicalSize,
    ) -> WindowAttributes {
        let level = if self.always_on_top {
            WindowLevel::AlwaysOnTop
        } else {
            WindowLevel::Normal
        };

        let attrs = Window::default_attributes()
            .with_title(title)
            .with_position(Position::Physical(position.into()))
            .with_inner_size(Size::Physical(size.into()))
            .with_decorations(self.decorations)
            .with_transparent(self.transparent)
            .with_resizable(self.resizable)
            .with_visible(self.visible)
            .with_window_level(level);

        #[cfg(target_os = "windows")]
        let attrs = {
            use winit::platform::windows::WindowAttributesExtWindows;
            attrs.with_skip_taskbar(self.skip_taskbar)
        };

        attrs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bubble_defaults() {
        let style = FloatingWindowStyle::default();
        assert!(!style.decorations);
        assert!(style.transparent);
        assert!(style.always_on_top);
        assert!(style.skip_taskbar);
        assert!(!style.visible);
        assert!(style.resizable);
    }

    #[test]
    fn test_builders() {
        let style = FloatingWindowStyle::bubble()
            .with_visible(true)
            .with_resizable(false)
            .with_skip_taskbar(false);
        assert!(style.visible);
        assert!(!style.resizable);
        assert!(!style.skip_taskbar);
    }

    #[test]
    fn test_window_attributes() {
        let attrs = FloatingWindowStyle::bubble().to_window_attributes(
            "b1",
            PhysicalPosition::new(400, -18),
            PhysicalSize::new(500, 200),
        );
        assert_eq!(attrs.title, "b1");
        assert!(!attrs.decorations);
        assert!(attrs.transparent);
        assert!(!attrs.visible);
        assert!(attrs.resizable);
        assert_eq!(attrs.window_level, WindowLevel::AlwaysOnTop);
        assert_eq!(
            attrs.position,
            Some(Position::Physical(winit::dpi::PhysicalPosition::new(400, -18)))
        );
    }
}
