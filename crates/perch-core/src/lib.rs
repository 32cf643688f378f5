//! Core systems for Perch.
//!
//! This crate holds the platform-independent pieces of the Perch overlay:
//!
//! - **Geometry**: logical/physical pixel conversion ([`CoordinateTransform`])
//! - **Hit masks**: per-pixel opacity grids decoded from sprites ([`HitMaskBuilder`])
//! - **Classification**: pointer-over-sprite queries ([`PointerClassifier`])
//! - **Frame sync**: coalesced repositioning of dependent windows ([`PositionSyncScheduler`])
//! - **Signals**: event fan-out with cancellable [`Subscription`]s
//!
//! # Hit Testing Example
//!
//! ```
//! use std::sync::Arc;
//! use perch_core::{HitMaskBuilder, PointerClassifier, Rect};
//!
//! let mask = HitMaskBuilder::new().mask_from_alpha(2, 1, &[0, 255]).unwrap();
//! let classifier = PointerClassifier::with_mask(Arc::new(mask));
//!
//! // The sprite is drawn 100x50 at (10, 10).
//! let rect = Rect::new(10.0, 10.0, 100.0, 50.0);
//! assert!(!classifier.is_interactive(20.0, 20.0, rect));
//! assert!(classifier.is_interactive(90.0, 20.0, rect));
//! ```
//!
//! # Scheduling Example
//!
//! ```
//! use perch_core::{FlushRequest, PhysicalPosition, PositionSyncScheduler};
//!
//! let mut scheduler = PositionSyncScheduler::new();
//! assert_eq!(scheduler.enqueue("bubble", PhysicalPosition::new(1, 1)), FlushRequest::Schedule);
//! let again = scheduler.enqueue("bubble", PhysicalPosition::new(5, 5));
//! assert_eq!(again, FlushRequest::AlreadyPending);
//!
//! let batch = scheduler.take_batch();
//! assert_eq!(batch.len(), 1);
//! assert_eq!(batch[0].anchor, PhysicalPosition::new(5, 5));
//! ```

mod classifier;
mod error;
mod frame_sync;
mod geometry;
mod hit_mask;
pub mod logging;
mod signal;

pub use classifier::{ClickThroughGate, HitTestMode, PointerAction, PointerClassifier};
pub use error::{HitMaskError, HitMaskResult, ImageDecodeError};
pub use frame_sync::{DEFAULT_FRAME_INTERVAL, FlushRequest, PendingMove, PositionSyncScheduler};
pub use geometry::{
    CoordinateTransform, LogicalPosition, LogicalSize, PhysicalPosition, PhysicalSize, Rect,
    SpriteBounds, place_above_anchor,
};
pub use hit_mask::{ALPHA_THRESHOLD, HitMask, HitMaskBuilder, HitMaskPayload, SpriteSource};
pub use signal::{ConnectionId, Signal, Subscription};

/// Re-export of the winit modifier state used by [`PointerClassifier::classify_press`].
pub use winit::keyboard::ModifiersState;

static_assertions::assert_impl_all!(HitMask: Send, Sync);
static_assertions::assert_impl_all!(Signal<()>: Send, Sync);
static_assertions::assert_impl_all!(Subscription: Send, Sync);
static_assertions::assert_impl_all!(PointerClassifier: Send, Sync);
