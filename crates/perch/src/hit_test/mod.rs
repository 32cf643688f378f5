//! Pixel-accurate hit testing for the sprite window.
//!
//! The sprite's alpha channel is turned into a mask, installed in the pointer
//! classifier and handed to the window manager so transparent pixels let
//! clicks through at the OS level. When any of that fails the sprite falls
//! back to rectangle hit testing: worst case it is interactive everywhere,
//! never unreachable.

mod bridge;
mod sprite;

pub use bridge::{ClickThroughPolicy, publish_hit_mask};
pub use sprite::SpriteHitTest;
