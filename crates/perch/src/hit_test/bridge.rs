//! Hands the sprite mask to the window manager for OS-level click-through.

use perch_core::{HitMask, PointerClassifier, SpriteBounds};

use crate::error::BridgeError;
use crate::window::WindowHost;

/// Register `mask` with the host and start its click-through monitor for a
/// sprite at `bounds`.
///
/// The mask is flattened once and the same payload goes to both calls.
#[tracing::instrument(skip(host, mask), target = "perch::hit_test", level = "debug")]
pub async fn publish_hit_mask<H: WindowHost>(
    host: &H,
    bounds: SpriteBounds,
    mask: &HitMask,
) -> Result<(), BridgeError> {
    if mask.is_empty() {
        return Err(BridgeError::EmptyMask);
    }
    let payload = mask.to_payload();
    host.set_hit_mask(&payload)
        .await
        .map_err(BridgeError::Registration)?;
    host.start_click_through_monitor(bounds, &payload)
        .await
        .map_err(BridgeError::Monitor)?;
    tracing::debug!(
        target: "perch::hit_test",
        width = payload.width,
        height = payload.height,
        "hit mask published"
    );
    Ok(())
}

/// How pointer input is routed once publishing has been attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickThroughPolicy {
    /// The window manager routes input per pixel; keep the mask.
    PerPixel,
    /// Registration failed; treat the whole sprite rectangle as interactive.
    Bounds,
}

impl ClickThroughPolicy {
    pub fn after_publish(result: &Result<(), BridgeError>) -> Self {
        match result {
            Ok(()) => Self::PerPixel,
            Err(_) => Self::Bounds,
        }
    }

    pub fn apply(self, classifier: &mut PointerClassifier) {
        if self == Self::Bounds {
            classifier.degrade_to_bounds();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::{HeadlessHost, HostCall, HostOp};
    use perch_core::HitTestMode;
    use std::sync::Arc;

    fn mask() -> HitMask {
        HitMask::new(2, 1, vec![false, true]).unwrap()
    }

    #[tokio::test]
    async fn test_publish_registers_then_monitors() {
        let host = HeadlessHost::new();
        let bounds = SpriteBounds::new(10, 20, 2, 1);
        publish_hit_mask(&host, bounds, &mask()).await.unwrap();

        assert_eq!(
            host.calls(),
            vec![
                HostCall::SetHitMask { width: 2, height: 1 },
                HostCall::StartClickThroughMonitor(bounds),
            ]
        );
        assert_eq!(host.published_mask(), Some(mask().to_payload()));
        assert_eq!(host.monitor_bounds(), Some(bounds));
    }

    #[tokio::test]
    async fn test_registration_failure_skips_monitor() {
        let host = HeadlessHost::new();
        host.fail(HostOp::SetHitMask);
        let err = publish_hit_mask(&host, SpriteBounds::default(), &mask())
            .await
            .unwrap_err();
        assert!(matches!(err, BridgeError::Registration(_)));
        assert!(host.calls_of(HostOp::StartClickThroughMonitor).is_empty());
    }

    #[tokio::test]
    async fn test_empty_mask_rejected_without_calls() {
        let host = HeadlessHost::new();
        let empty = HitMask::new(0, 0, Vec::new()).unwrap();
        let err = publish_hit_mask(&host, SpriteBounds::default(), &empty)
            .await
            .unwrap_err();
        assert_eq!(err, BridgeError::EmptyMask);
        assert!(host.calls().is_empty());
    }

    #[test]
    fn test_policy_degrades_classifier() {
        let mut classifier = PointerClassifier::with_mask(Arc::new(mask()));
        let policy = ClickThroughPolicy::after_publish(&Err(BridgeError::EmptyMask));
        assert_eq!(policy, ClickThroughPolicy::Bounds);
        policy.apply(&mut classifier);
        assert!(matches!(classifier.mode(), HitTestMode::Bounds));

        let mut classifier = PointerClassifier::with_mask(Arc::new(mask()));
        ClickThroughPolicy::after_publish(&Ok(())).apply(&mut classifier);
        assert!(classifier.mask().is_some());
    }
}
