//! Bubble windows anchored to the sprite.
//!
//! A bubble is a frameless floating window that sits just above the anchor
//! (the sprite window) at a fixed offset and follows it as it moves. Bubbles
//! are keyed by id; opening an id that is already open replaces the old
//! bubble.
//!
//! ```text
//! Closed -> Opening -> AwaitingFirstLayout -> Positioned -> Closed
//! ```
//!
//! Only `Positioned` bubbles are moved by anchor tracking, so a bubble is
//! never repositioned before its first layout has been applied.

mod content;
mod registry;
mod state;

pub use content::BubbleContent;
pub use registry::{BubbleRegistry, BubbleSettings, DEFAULT_BUBBLE_ID, FlushReport};
pub use state::{BubbleKey, BubbleLifecycle};
