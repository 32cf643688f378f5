//! Sprite hit testing for the anchor window.

use std::cell::RefCell;
use std::sync::Arc;

use perch_core::{
    ClickThroughGate, HitMaskBuilder, HitTestMode, ModifiersState, PointerAction, PointerClassifier,
    Rect, SpriteBounds, SpriteSource,
};

use super::bridge::{ClickThroughPolicy, publish_hit_mask};
use crate::error::BridgeError;
use crate::window::{WindowHandle, WindowHost};

/// Hit-testing state of the sprite: the classifier plus the cursor gate.
///
/// Starts [`HitTestMode::Pending`] (nothing interactive) until
/// [`load_sprite`](Self::load_sprite) finishes.
#[derive(Debug, Default)]
pub struct SpriteHitTest {
    builder: HitMaskBuilder,
    classifier: RefCell<PointerClassifier>,
    gate: RefCell<ClickThroughGate>,
}

impl SpriteHitTest {
    pub fn new(builder: HitMaskBuilder) -> Self {
        Self {
            builder,
            ..Self::default()
        }
    }

    /// Decode the sprite, install its mask and publish it to the host.
    ///
    /// A decode failure or a failed publish degrades hit testing to the sprite
    /// rectangle. Neither is reported as an error.
    pub async fn load_sprite<H: WindowHost>(
        &self,
        host: &H,
        anchor: WindowHandle,
        source: SpriteSource,
    ) -> ClickThroughPolicy {
        let mask = match self.builder.build(source).await {
            Ok(mask) => Arc::new(mask),
            Err(err) => {
                tracing::warn!(
                    target: "perch::hit_test",
                    error = %err,
                    "sprite decode failed, using sprite bounds",
                );
                self.classifier.borrow_mut().degrade_to_bounds();
                return ClickThroughPolicy::Bounds;
            }
        };
        self.classifier.borrow_mut().set_mask(mask.clone());

        let result = match host.bounds(anchor).await {
            Ok(bounds) => publish_hit_mask(host, bounds, &mask).await,
            Err(err) => Err(BridgeError::Bounds(err)),
        };
        if let Err(err) = &result {
            tracing::warn!(
                target: "perch::hit_test",
                error = %err,
                "click-through unavailable, using sprite bounds",
            );
        }
        let policy = ClickThroughPolicy::after_publish(&result);
        policy.apply(&mut self.classifier.borrow_mut());
        policy
    }

    pub fn mode(&self) -> HitTestMode {
        self.classifier.borrow().mode().clone()
    }

    pub fn is_interactive(&self, x: f64, y: f64, rect: Rect) -> bool {
        self.classifier.borrow().is_interactive(x, y, rect)
    }

    pub fn classify_press(
        &self,
        x: f64,
        y: f64,
        rect: Rect,
        modifiers: ModifiersState,
    ) -> PointerAction {
        self.classifier.borrow().classify_press(x, y, rect, modifiers)
    }

    /// Feed a screen cursor position; returns the new "ignore cursor events"
    /// state of the anchor when it changes.
    pub fn update_cursor(&self, x: f64, y: f64, bounds: SpriteBounds) -> Option<bool> {
        let classifier = self.classifier.borrow();
        self.gate
            .borrow_mut()
            .update(&classifier, x, y, bounds.to_rect())
    }
}
