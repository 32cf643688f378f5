//! The top-level overlay controller.

use std::rc::Rc;

use perch_core::{LogicalPosition, ModifiersState, PointerAction, Rect, SpriteSource};
use tokio::sync::mpsc::{self, UnboundedSender};

use crate::bubble::{BubbleContent, BubbleRegistry};
use crate::collaborators::{PromptDispatcher, send_prompt};
use crate::config::OverlayConfig;
use crate::driver::{OverlayDriver, OverlayEvent};
use crate::error::OverlayResult;
use crate::hit_test::{ClickThroughPolicy, SpriteHitTest};
use crate::window::{WindowHandle, WindowHost};

/// A sprite window with pixel-accurate click-through and anchored bubbles.
///
/// Created together with its [`OverlayDriver`], which must be spawned on the
/// same thread (a `LocalSet`) for bubbles to lay out and follow the anchor.
/// Dropping the overlay stops the driver and closes its bubbles.
pub struct Overlay<H> {
    registry: Rc<BubbleRegistry<H>>,
    hit_test: SpriteHitTest,
    config: OverlayConfig,
    events: UnboundedSender<OverlayEvent>,
}

impl<H: WindowHost> Overlay<H> {
    /// Build an overlay for the sprite window `anchor` of `host`.
    pub fn new(
        host: Rc<H>,
        anchor: WindowHandle,
        config: OverlayConfig,
    ) -> (Self, OverlayDriver<H>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let registry = Rc::new(BubbleRegistry::new(
            host,
            anchor,
            config.bubble_settings(),
            events.downgrade(),
        ));
        let driver = OverlayDriver::new(registry.clone(), receiver);
        let overlay = Self {
            registry,
            hit_test: SpriteHitTest::new(config.hit_mask_builder()),
            config,
            events,
        };
        (overlay, driver)
    }

    pub fn registry(&self) -> &BubbleRegistry<H> {
        &self.registry
    }

    pub fn host(&self) -> &Rc<H> {
        self.registry.host()
    }

    pub fn anchor(&self) -> WindowHandle {
        self.registry.anchor()
    }

    pub fn config(&self) -> &OverlayConfig {
        &self.config
    }

    pub fn hit_test(&self) -> &SpriteHitTest {
        &self.hit_test
    }

    // ========================================================================
    // Bubbles
    // ========================================================================

    /// Open the bubble named [`DEFAULT_BUBBLE_ID`](crate::DEFAULT_BUBBLE_ID).
    pub async fn open_default_bubble(
        &self,
        content: impl Into<BubbleContent>,
    ) -> OverlayResult<String> {
        self.registry.open_default_bubble(content).await
    }

    pub async fn open_bubble(
        &self,
        content: impl Into<BubbleContent>,
        id: &str,
    ) -> OverlayResult<String> {
        self.registry.open_bubble(content, id).await
    }

    pub async fn open_bubble_at(
        &self,
        content: impl Into<BubbleContent>,
        id: &str,
        offset: LogicalPosition,
    ) -> OverlayResult<String> {
        self.registry.open_bubble_at(content, id, offset).await
    }

    pub async fn close_bubble(&self, id: &str) {
        self.registry.close_bubble(id).await;
    }

    /// Ask `dispatcher` for an answer to `prompt` and show it in bubble `id`.
    ///
    /// Returns the text shown, which is [`DISPATCH_FAILURE_TEXT`] when the
    /// dispatcher fails.
    ///
    /// [`DISPATCH_FAILURE_TEXT`]: crate::DISPATCH_FAILURE_TEXT
    pub async fn respond<D: PromptDispatcher>(
        &self,
        dispatcher: &D,
        prompt: &str,
        id: &str,
    ) -> OverlayResult<String> {
        let answer = send_prompt(dispatcher, prompt).await?;
        self.registry.open_bubble(answer.as_str(), id).await?;
        Ok(answer)
    }

    // ========================================================================
    // Hit testing
    // ========================================================================

    /// Decode `source` into the sprite's hit mask and publish it.
    pub async fn load_sprite(&self, source: SpriteSource) -> ClickThroughPolicy {
        self.hit_test
            .load_sprite(self.registry.host().as_ref(), self.anchor(), source)
            .await
    }

    /// Load the sprite named by `[hit_test] sprite`, if any.
    pub async fn load_configured_sprite(&self) -> Option<ClickThroughPolicy> {
        let path = self.config.hit_test.sprite.clone()?;
        Some(self.load_sprite(SpriteSource::Path(path)).await)
    }

    pub fn is_interactive(&self, x: f64, y: f64, rect: Rect) -> bool {
        self.hit_test.is_interactive(x, y, rect)
    }

    pub fn classify_press(
        &self,
        x: f64,
        y: f64,
        rect: Rect,
        modifiers: ModifiersState,
    ) -> PointerAction {
        self.hit_test.classify_press(x, y, rect, modifiers)
    }

    // ========================================================================
    // Shutdown
    // ========================================================================

    /// Close every bubble and stop the driver.
    pub async fn shutdown(&self) {
        tracing::debug!(
            target: "perch::overlay",
            bubbles = self.registry.len(),
            "overlay shutting down",
        );
        self.registry.close_all().await;
        let _ = self.events.send(OverlayEvent::Shutdown);
    }
}
