//! The overlay event pump.
//!
//! Window-manager listeners never touch overlay state. They forward
//! [`OverlayEvent`]s into a channel, and [`OverlayDriver`] handles them one at
//! a time in arrival order. Anchor moves are coalesced: the first move after a
//! flush arms a single-shot timer of one frame interval, and only the latest
//! anchor position per bubble is applied when it fires.
//!
//! The driver shares the registry through an `Rc`, so it runs on the same
//! thread as the [`Overlay`](crate::Overlay):
//!
//! ```ignore
//! let local = tokio::task::LocalSet::new();
//! local.run_until(async {
//!     let (overlay, driver) = Overlay::new(host, anchor, config);
//!     tokio::task::spawn_local(driver.run());
//!     overlay.open_bubble("hello", "bubble").await?;
//! }).await;
//! ```

use std::ops::ControlFlow;
use std::rc::Rc;

use perch_core::{FlushRequest, LogicalSize, PhysicalPosition};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::time::Instant;

use crate::bubble::{BubbleKey, BubbleRegistry, FlushReport};
use crate::window::WindowHost;

/// Work delivered to the [`OverlayDriver`].
#[derive(Debug, Clone, PartialEq)]
pub enum OverlayEvent {
    /// The anchor moved; `bubble` should follow it.
    AnchorMoved {
        bubble: BubbleKey,
        position: PhysicalPosition,
    },
    /// The content of `bubble` reported its logical size.
    BubbleLaidOut { bubble: BubbleKey, size: LogicalSize },
    /// Stop the pump.
    Shutdown,
}

/// Processes overlay events and drives the frame-bounded position flush.
pub struct OverlayDriver<H> {
    registry: Rc<BubbleRegistry<H>>,
    events: UnboundedReceiver<OverlayEvent>,
    flush_at: Option<Instant>,
}

impl<H: WindowHost> OverlayDriver<H> {
    pub(crate) fn new(
        registry: Rc<BubbleRegistry<H>>,
        events: UnboundedReceiver<OverlayEvent>,
    ) -> Self {
        Self {
            registry,
            events,
            flush_at: None,
        }
    }

    /// Pump events until [`OverlayEvent::Shutdown`] or the [`Overlay`](crate::Overlay)
    /// is dropped.
    ///
    /// On shutdown a flush that is still armed is applied before returning.
    /// When the overlay is dropped instead, pending moves are discarded and
    /// every bubble is closed.
    pub async fn run(mut self) {
        tracing::debug!(target: "perch::driver", "overlay driver started");
        loop {
            let deadline = self.flush_at.unwrap_or_else(Instant::now);
            tokio::select! {
                biased;

                () = tokio::time::sleep_until(deadline), if self.flush_at.is_some() => {
                    self.flush_now().await;
                }
                event = self.events.recv() => {
                    let Some(event) = event else {
                        tracing::debug!(
                            target: "perch::driver",
                            "overlay dropped, closing bubbles",
                        );
                        self.flush_at = None;
                        self.registry.close_all().await;
                        break;
                    };
                    if self.dispatch(event).await.is_break() {
                        break;
                    }
                }
            }
        }
        if self.flush_at.is_some() {
            self.flush_now().await;
        }
        tracing::debug!(target: "perch::driver", "overlay driver stopped");
    }

    /// Handle one event.
    pub async fn dispatch(&mut self, event: OverlayEvent) -> ControlFlow<()> {
        tracing::trace!(target: "perch::driver", ?event, "dispatch");
        match event {
            OverlayEvent::AnchorMoved { bubble, position } => {
                let request = self.registry.enqueue_anchor_move(bubble, position);
                if let Some(FlushRequest::Schedule) = request {
                    self.flush_at = Some(Instant::now() + self.registry.frame_interval());
                }
            }
            OverlayEvent::BubbleLaidOut { bubble, size } => {
                self.registry.apply_layout(&bubble, size).await;
            }
            OverlayEvent::Shutdown => return ControlFlow::Break(()),
        }
        ControlFlow::Continue(())
    }

    /// Handle every event already queued, without waiting for more.
    ///
    /// Returns the number of events handled. A shutdown request stops the
    /// drain and is not counted.
    pub async fn drain(&mut self) -> usize {
        let mut handled = 0;
        loop {
            match self.events.try_recv() {
                Ok(event) => {
                    if self.dispatch(event).await.is_break() {
                        break;
                    }
                    handled += 1;
                }
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
        handled
    }

    /// Apply queued repositions immediately and disarm the timer.
    pub async fn flush_now(&mut self) -> FlushReport {
        self.flush_at = None;
        self.registry.flush_positions().await
    }

    /// Whether a flush timer is armed.
    pub fn flush_armed(&self) -> bool {
        self.flush_at.is_some()
    }

    pub fn flush_deadline(&self) -> Option<Instant> {
        self.flush_at
    }
}
