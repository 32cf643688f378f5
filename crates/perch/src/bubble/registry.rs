//! Lifecycle and anchoring of bubble windows.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use perch_core::{
    CoordinateTransform, DEFAULT_FRAME_INTERVAL, FlushRequest, LogicalPosition, LogicalSize,
    PendingMove, PhysicalPosition, PhysicalSize, PositionSyncScheduler, place_above_anchor,
};
use tokio::sync::mpsc::WeakUnboundedSender;

use super::content::BubbleContent;
use super::state::{BubbleEntry, BubbleKey, BubbleLifecycle};
use crate::driver::OverlayEvent;
use crate::error::{MissingWindowError, NativeCallError, OverlayError, OverlayResult};
use crate::window::{
    CreateWindowRequest, EventSlot, FloatingWindowStyle, WindowEvent, WindowEventKind, WindowHandle,
    WindowHost,
};

/// Id used when the caller does not name a bubble.
pub const DEFAULT_BUBBLE_ID: &str = "bubble";

/// Tunables for bubble placement.
#[derive(Debug, Clone, PartialEq)]
pub struct BubbleSettings {
    /// Offset from the anchor's top-left corner to the bubble's bottom-left
    /// corner, in logical pixels.
    pub default_offset: LogicalPosition,
    /// Outer size of a bubble before its content reports a layout.
    pub initial_size: PhysicalSize,
    /// Page that renders bubble content.
    pub content_route: String,
    /// Delay between the first queued anchor move and the flush.
    pub frame_interval: Duration,
}

impl Default for BubbleSettings {
    fn default() -> Self {
        Self {
            default_offset: LogicalPosition::new(150.0, 41.0),
            initial_size: PhysicalSize::new(500, 200),
            content_route: "chat-bubble.html".to_string(),
            frame_interval: DEFAULT_FRAME_INTERVAL,
        }
    }
}

/// Outcome of one [`BubbleRegistry::flush_positions`] pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushReport {
    /// Bubbles moved.
    pub applied: usize,
    /// Moves dropped because the bubble was closed, superseded or not yet laid out.
    pub skipped: usize,
    /// Moves whose native calls failed.
    pub failed: usize,
}

/// Why a multi-step native sequence stopped early.
enum Interrupted {
    /// The bubble was closed or re-opened while the sequence was suspended.
    Superseded,
    Native(NativeCallError),
}

impl From<NativeCallError> for Interrupted {
    fn from(err: NativeCallError) -> Self {
        Self::Native(err)
    }
}

type Step<T = ()> = Result<T, Interrupted>;

/// Owns every bubble window anchored to one host window.
///
/// The registry is single-threaded: it lives behind an `Rc` shared by the
/// [`Overlay`](crate::Overlay) and its [`OverlayDriver`](crate::OverlayDriver),
/// and every method takes `&self`. State is only borrowed between native
/// calls, and every continuation re-checks that the bubble instance it works
/// on is still registered.
pub struct BubbleRegistry<H> {
    host: Rc<H>,
    anchor: WindowHandle,
    settings: BubbleSettings,
    entries: RefCell<HashMap<String, BubbleEntry>>,
    scheduler: RefCell<PositionSyncScheduler<BubbleKey>>,
    /// Weak so that dropping the [`Overlay`](crate::Overlay) ends the driver.
    events: WeakUnboundedSender<OverlayEvent>,
    next_generation: Cell<u64>,
}

impl<H: WindowHost> BubbleRegistry<H> {
    pub fn new(
        host: Rc<H>,
        anchor: WindowHandle,
        settings: BubbleSettings,
        events: WeakUnboundedSender<OverlayEvent>,
    ) -> Self {
        let scheduler = PositionSyncScheduler::with_frame_interval(settings.frame_interval);
        Self {
            host,
            anchor,
            settings,
            entries: RefCell::new(HashMap::new()),
            scheduler: RefCell::new(scheduler),
            events,
            next_generation: Cell::new(0),
        }
    }

    pub fn host(&self) -> &Rc<H> {
        &self.host
    }

    pub fn anchor(&self) -> WindowHandle {
        self.anchor
    }

    pub fn settings(&self) -> &BubbleSettings {
        &self.settings
    }

    // ========================================================================
    // Open / close
    // ========================================================================

    /// Open [`DEFAULT_BUBBLE_ID`] at the default offset.
    pub async fn open_default_bubble(
        &self,
        content: impl Into<BubbleContent>,
    ) -> OverlayResult<String> {
        self.open_bubble(content, DEFAULT_BUBBLE_ID).await
    }

    /// Open `id` at the default offset. See [`open_bubble_at`](Self::open_bubble_at).
    pub async fn open_bubble(
        &self,
        content: impl Into<BubbleContent>,
        id: &str,
    ) -> OverlayResult<String> {
        let offset = self.settings.default_offset;
        self.open_bubble_at(content, id, offset).await
    }

    /// Open a bubble showing `content`, replacing any bubble already open
    /// under `id`.
    ///
    /// The window is created hidden just above the anchor and revealed once
    /// its content reports a size. Native failures are logged and leave the
    /// bubble closed; only an empty `id` is an error.
    #[tracing::instrument(skip(self, content), target = "perch::bubble", level = "debug")]
    pub async fn open_bubble_at(
        &self,
        content: impl Into<BubbleContent>,
        id: &str,
        offset: LogicalPosition,
    ) -> OverlayResult<String> {
        if id.is_empty() {
            return Err(OverlayError::EmptyBubbleId);
        }
        let content = content.into();

        self.close_bubble(id).await;

        let key = BubbleKey::new(id, self.bump_generation());
        let displaced = self
            .entries
            .borrow_mut()
            .insert(id.to_string(), BubbleEntry::opening(key.generation));
        if let Some(displaced) = displaced {
            // Another open for the same id slipped in while we were closing.
            self.teardown(id, displaced).await;
        }

        match self.open_instance(&key, &content, offset).await {
            Ok(()) => {}
            Err(Interrupted::Superseded) => {
                tracing::debug!(target: "perch::bubble", id, "open superseded");
            }
            Err(Interrupted::Native(err)) => {
                tracing::warn!(target: "perch::bubble", id, error = %err, "failed to open bubble");
                if self.is_current(&key) {
                    self.close_bubble(id).await;
                }
            }
        }
        Ok(id.to_string())
    }

    async fn open_instance(
        &self,
        key: &BubbleKey,
        content: &BubbleContent,
        offset: LogicalPosition,
    ) -> Step {
        let scale = self.host.scale_factor(self.anchor).await?;
        let anchor = self.host.outer_position(self.anchor).await?;
        self.ensure_current(key)?;

        let transform = CoordinateTransform::new(scale);
        let offset = transform.position_to_physical(offset);
        self.with_entry(key, |entry| {
            entry.offset = offset;
            entry.scale_factor = transform.scale();
        });

        let size = self.settings.initial_size;
        let request = CreateWindowRequest {
            label: key.id.clone(),
            url: content.to_url(&self.settings.content_route, &key.id),
            position: place_above_anchor(anchor, offset, size.height),
            size,
            style: FloatingWindowStyle::bubble(),
        };
        let window = self.host.create_window(request).await?;

        let adopted = self.with_entry(key, |entry| {
            entry.window = Some(window);
            entry.lifecycle = BubbleLifecycle::AwaitingFirstLayout;
        });
        if adopted.is_none() {
            // Orphaned: the instance was closed while the window was being created.
            if let Err(err) = self.host.close(window).await {
                tracing::debug!(
                    target: "perch::bubble",
                    error = %err,
                    "closing orphaned bubble window failed",
                );
            }
            return Err(Interrupted::Superseded);
        }
        tracing::debug!(target: "perch::bubble", id = %key.id, %window, "bubble window created");

        match self.host.subscribe(window, WindowEventKind::Resized, self.layout_slot(key)).await {
            Ok(subscription) => {
                if self
                    .with_entry(key, |entry| entry.layout_listener = Some(subscription))
                    .is_none()
                {
                    return Err(Interrupted::Superseded);
                }
            }
            Err(err) => {
                self.ensure_current(key)?;
                tracing::warn!(
                    target: "perch::bubble",
                    id = %key.id,
                    error = %err,
                    "layout notifications unavailable, revealing at initial size"
                );
                self.reveal(key, window).await;
            }
        }

        match self.host.subscribe(self.anchor, WindowEventKind::Moved, self.move_slot(key)).await {
            Ok(subscription) => {
                if self
                    .with_entry(key, |entry| entry.move_listener = Some(subscription))
                    .is_none()
                {
                    return Err(Interrupted::Superseded);
                }
            }
            Err(err) => {
                tracing::warn!(
                    target: "perch::bubble",
                    id = %key.id,
                    error = %err,
                    "anchor move notifications unavailable, bubble will not follow"
                );
            }
        }
        Ok(())
    }

    /// Close the bubble registered under `id`.
    ///
    /// Registry removal, queue removal and listener cancellation happen
    /// before the first suspension point. Native close errors are ignored.
    /// Unknown ids are a no-op that makes no native calls.
    pub async fn close_bubble(&self, id: &str) {
        let removed = self.take_entry(id);
        match removed {
            Ok(entry) => self.teardown(id, entry).await,
            Err(missing) => tracing::trace!(target: "perch::bubble", %missing, "close ignored"),
        }
    }

    /// Close every bubble.
    pub async fn close_all(&self) {
        for id in self.ids() {
            self.close_bubble(&id).await;
        }
    }

    async fn teardown(&self, id: &str, mut entry: BubbleEntry) {
        self.scheduler
            .borrow_mut()
            .forget(&BubbleKey::new(id, entry.generation));
        let window = entry.detach();
        tracing::debug!(target: "perch::bubble", id, "bubble closed");
        if let Some(window) = window {
            if let Err(err) = self.host.close(window).await {
                tracing::debug!(
                    target: "perch::bubble",
                    id,
                    error = %err,
                    "native close failed, ignoring",
                );
            }
        }
    }

    // ========================================================================
    // Layout
    // ========================================================================

    /// Size and place a bubble after its content reported `size` (logical),
    /// then reveal and focus it.
    ///
    /// If any step fails the bubble is still shown. Work for a closed or
    /// re-opened instance is dropped.
    #[tracing::instrument(skip(self), target = "perch::bubble", level = "trace")]
    pub async fn apply_layout(&self, key: &BubbleKey, size: LogicalSize) {
        let Some((window, scale)) =
            self.read_entry(key, |entry| (entry.window, entry.scale_factor))
        else {
            tracing::trace!(
                target: "perch::bubble",
                id = %key.id,
                "layout for stale bubble ignored",
            );
            return;
        };
        let Some(window) = window else {
            return;
        };
        let size = CoordinateTransform::new(scale).size_to_physical_ceil(size);

        match self.layout_sequence(key, window, size).await {
            Ok(()) => {}
            Err(Interrupted::Superseded) => return,
            Err(Interrupted::Native(err)) => {
                tracing::warn!(
                    target: "perch::bubble",
                    id = %key.id,
                    error = %err,
                    "bubble layout failed",
                );
                if !self.is_current(key) {
                    return;
                }
                if let Err(err) = self.host.show(window).await {
                    tracing::warn!(
                        target: "perch::bubble",
                        id = %key.id,
                        error = %err,
                        "showing bubble failed",
                    );
                }
            }
        }
        self.with_entry(key, |entry| entry.lifecycle = BubbleLifecycle::Positioned);
    }

    async fn layout_sequence(
        &self,
        key: &BubbleKey,
        window: WindowHandle,
        size: PhysicalSize,
    ) -> Step {
        let anchor = self.host.outer_position(self.anchor).await?;
        let offset = self.read_entry(key, |entry| entry.offset).ok_or(Interrupted::Superseded)?;

        self.host.set_outer_size(window, size).await?;
        self.ensure_current(key)?;
        self.host
            .set_outer_position(window, place_above_anchor(anchor, offset, size.height))
            .await?;
        self.ensure_current(key)?;
        self.host.set_resizable(window, false).await?;
        self.ensure_current(key)?;
        self.host.show(window).await?;
        self.ensure_current(key)?;

        if let Err(err) = self.host.focus(window).await {
            tracing::debug!(
                target: "perch::bubble",
                id = %key.id,
                error = %err,
                "focusing bubble failed",
            );
        }
        tracing::debug!(target: "perch::bubble", id = %key.id, ?size, "bubble laid out");
        Ok(())
    }

    /// Show a bubble that will never receive a layout.
    async fn reveal(&self, key: &BubbleKey, window: WindowHandle) {
        if let Err(err) = self.host.show(window).await {
            tracing::warn!(
                target: "perch::bubble",
                id = %key.id,
                error = %err,
                "showing bubble failed",
            );
        }
        self.with_entry(key, |entry| entry.lifecycle = BubbleLifecycle::Positioned);
    }

    // ========================================================================
    // Anchor tracking
    // ========================================================================

    /// Queue a reposition of `bubble` for the anchor at `anchor`.
    ///
    /// Returns `None` for a stale bubble, otherwise whether the caller must
    /// arm the flush timer.
    pub fn enqueue_anchor_move(
        &self,
        bubble: BubbleKey,
        anchor: PhysicalPosition,
    ) -> Option<FlushRequest> {
        if !self.is_current(&bubble) {
            return None;
        }
        Some(self.scheduler.borrow_mut().enqueue(bubble, anchor))
    }

    /// Apply every queued reposition.
    ///
    /// The queue is taken before the first native call, so moves arriving
    /// during the flush start a new cycle. Each bubble is moved independently;
    /// a failure for one does not affect the others.
    #[tracing::instrument(skip(self), target = "perch::bubble", level = "trace")]
    pub async fn flush_positions(&self) -> FlushReport {
        let batch = self.scheduler.borrow_mut().take_batch();
        let mut report = FlushReport::default();

        for PendingMove { bubble, anchor } in batch {
            match self.reposition(&bubble, anchor).await {
                Ok(()) => report.applied += 1,
                Err(Interrupted::Superseded) => report.skipped += 1,
                Err(Interrupted::Native(err)) => {
                    tracing::warn!(
                        target: "perch::bubble",
                        id = %bubble.id,
                        error = %err,
                        "bubble reposition failed",
                    );
                    report.failed += 1;
                }
            }
        }
        tracing::trace!(target: "perch::bubble", ?report, "position flush done");
        report
    }

    async fn reposition(&self, bubble: &BubbleKey, anchor: PhysicalPosition) -> Step {
        let (window, offset) = self.positioned(bubble)?;
        let size = self.host.outer_size(window).await?;
        self.positioned(bubble)?;
        self.host
            .set_outer_position(window, place_above_anchor(anchor, offset, size.height))
            .await?;
        Ok(())
    }

    fn positioned(&self, bubble: &BubbleKey) -> Step<(WindowHandle, PhysicalPosition)> {
        self.read_entry(bubble, |entry| match (entry.lifecycle, entry.window) {
            (BubbleLifecycle::Positioned, Some(window)) => Some((window, entry.offset)),
            _ => None,
        })
        .flatten()
        .ok_or(Interrupted::Superseded)
    }

    pub fn is_flush_pending(&self) -> bool {
        self.scheduler.borrow().is_flush_pending()
    }

    pub fn pending_moves(&self) -> usize {
        self.scheduler.borrow().pending_len()
    }

    pub fn frame_interval(&self) -> Duration {
        self.scheduler.borrow().frame_interval()
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn contains(&self, id: &str) -> bool {
        self.entries.borrow().contains_key(id)
    }

    /// [`BubbleLifecycle::Closed`] for unknown ids.
    pub fn lifecycle(&self, id: &str) -> BubbleLifecycle {
        self.entries
            .borrow()
            .get(id)
            .map_or(BubbleLifecycle::Closed, |entry| entry.lifecycle)
    }

    /// The current instance of `id`.
    pub fn key(&self, id: &str) -> Option<BubbleKey> {
        self.entries
            .borrow()
            .get(id)
            .map(|entry| BubbleKey::new(id, entry.generation))
    }

    pub fn window(&self, id: &str) -> Option<WindowHandle> {
        self.entries.borrow().get(id).and_then(|entry| entry.window)
    }

    /// Physical offset captured when `id` was opened.
    pub fn offset(&self, id: &str) -> Option<PhysicalPosition> {
        self.entries.borrow().get(id).map(|entry| entry.offset)
    }

    /// Whether `id` currently follows anchor moves.
    pub fn anchor_attached(&self, id: &str) -> bool {
        self.entries
            .borrow()
            .get(id)
            .is_some_and(|entry| entry.move_listener.is_some())
    }

    /// Registered ids, sorted.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.entries.borrow().keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn bump_generation(&self) -> u64 {
        let generation = self.next_generation.get() + 1;
        self.next_generation.set(generation);
        generation
    }

    fn take_entry(&self, id: &str) -> Result<BubbleEntry, MissingWindowError> {
        self.entries
            .borrow_mut()
            .remove(id)
            .ok_or_else(|| MissingWindowError { id: id.to_string() })
    }

    fn is_current(&self, key: &BubbleKey) -> bool {
        self.entries
            .borrow()
            .get(&key.id)
            .is_some_and(|entry| entry.generation == key.generation)
    }

    fn ensure_current(&self, key: &BubbleKey) -> Step {
        if self.is_current(key) {
            Ok(())
        } else {
            Err(Interrupted::Superseded)
        }
    }

    fn read_entry<T>(&self, key: &BubbleKey, f: impl FnOnce(&BubbleEntry) -> T) -> Option<T> {
        self.entries
            .borrow()
            .get(&key.id)
            .filter(|entry| entry.generation == key.generation)
            .map(f)
    }

    fn with_entry<T>(&self, key: &BubbleKey, f: impl FnOnce(&mut BubbleEntry) -> T) -> Option<T> {
        self.entries
            .borrow_mut()
            .get_mut(&key.id)
            .filter(|entry| entry.generation == key.generation)
            .map(f)
    }

    fn layout_slot(&self, key: &BubbleKey) -> EventSlot {
        let events = self.events.clone();
        let bubble = key.clone();
        Box::new(move |event| {
            if let WindowEvent::Resized(size) = event {
                forward(
                    &events,
                    OverlayEvent::BubbleLaidOut {
                        bubble: bubble.clone(),
                        size: *size,
                    },
                );
            }
        })
    }

    fn move_slot(&self, key: &BubbleKey) -> EventSlot {
        let events = self.events.clone();
        let bubble = key.clone();
        Box::new(move |event| {
            if let WindowEvent::Moved(position) = event {
                forward(
                    &events,
                    OverlayEvent::AnchorMoved {
                        bubble: bubble.clone(),
                        position: *position,
                    },
                );
            }
        })
    }
}

/// Hand `event` to the driver, if it is still listening.
fn forward(events: &WeakUnboundedSender<OverlayEvent>, event: OverlayEvent) {
    let delivered = events
        .upgrade()
        .is_some_and(|sender| sender.send(event).is_ok());
    if !delivered {
        tracing::trace!(
            target: "perch::bubble",
            "overlay event channel closed, window event dropped",
        );
    }
}
