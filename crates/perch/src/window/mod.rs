//! Native window contract and implementations.
//!
//! The overlay never talks to a platform API directly. It drives a
//! [`WindowHost`], which a desktop shell implements on top of its windowing
//! system; [`HeadlessHost`] implements it in memory.
//!
//! # Floating Windows
//!
//! Bubbles are created with [`FloatingWindowStyle::bubble`]: frameless,
//! transparent, always on top and initially hidden.
//!
//! ```
//! use perch::window::{CreateWindowRequest, FloatingWindowStyle};
//! use perch_core::{PhysicalPosition, PhysicalSize};
//!
//! let request = CreateWindowRequest {
//!     label: "bubble".to_string(),
//!     url: "chat-bubble.html?text=hi&id=bubble".to_string(),
//!     position: PhysicalPosition::new(400, -18),
//!     size: PhysicalSize::new(500, 200),
//!     style: FloatingWindowStyle::bubble(),
//! };
//! assert!(!request.style.visible);
//! ```

mod floating_style;
mod headless;
mod host;

pub use floating_style::FloatingWindowStyle;
pub use headless::{HeadlessHost, HostCall, HostOp, WindowSnapshot};
pub use host::{
    CreateWindowRequest, EventSlot, WindowEvent, WindowEventKind, WindowHandle, WindowHost,
};
