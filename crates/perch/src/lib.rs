//! Perch - a floating desktop companion overlay.
//!
//! A borderless, always-on-top sprite window that lets clicks through its
//! transparent pixels, plus "bubble" windows that stay attached to it as it
//! moves. The crate drives any window manager implementing
//! [`WindowHost`](window::WindowHost); [`HeadlessHost`](window::HeadlessHost)
//! is an in-memory implementation for simulation and tests.
//!
//! # Example
//!
//! ```no_run
//! use std::rc::Rc;
//!
//! use perch::window::HeadlessHost;
//! use perch::{Overlay, OverlayConfig};
//! use perch_core::{PhysicalPosition, PhysicalSize};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let host = Rc::new(HeadlessHost::new());
//!     let anchor =
//!         host.add_anchor("main", PhysicalPosition::new(100, 100), PhysicalSize::new(128, 128));
//!
//!     let local = tokio::task::LocalSet::new();
//!     local
//!         .run_until(async {
//!             let config = OverlayConfig::default();
//!             let (overlay, driver) = Overlay::new(host.clone(), anchor, config);
//!             let pump = tokio::task::spawn_local(driver.run());
//!
//!             overlay.open_bubble("Quack!", "bubble").await?;
//!             overlay.shutdown().await;
//!             pump.await?;
//!             Ok::<(), Box<dyn std::error::Error>>(())
//!         })
//!         .await
//! }
//! ```

pub use perch_core::*;

mod collaborators;
mod config;
mod driver;
mod error;
mod overlay;

pub mod bubble;
pub mod hit_test;
pub mod logging;
pub mod window;

pub use bubble::{
    BubbleContent, BubbleKey, BubbleLifecycle, BubbleRegistry, BubbleSettings, DEFAULT_BUBBLE_ID,
    FlushReport,
};
pub use collaborators::{
    DISPATCH_FAILURE_TEXT, PromptDispatcher, RecognitionEvent, SpeechRecognizer, TranscriptSession,
    send_prompt,
};
pub use config::{BubbleConfig, HitTestConfig, LoggingConfig, OverlayConfig, SyncConfig};
pub use driver::{OverlayDriver, OverlayEvent};
pub use error::{
    BridgeError, ConfigError, MissingWindowError, NativeCallError, NativeResult, OverlayError,
    OverlayResult,
};
pub use hit_test::{ClickThroughPolicy, SpriteHitTest};
pub use overlay::Overlay;

static_assertions::assert_impl_all!(OverlayConfig: Send, Sync);
static_assertions::assert_impl_all!(OverlayError: Send, Sync);
static_assertions::assert_impl_all!(window::HeadlessHost: Send, Sync);
