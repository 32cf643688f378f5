//! Frame-bounded coalescing of dependent-window repositioning.
//!
//! Anchor windows emit move events far faster than a display refreshes.
//! [`PositionSyncScheduler`] keeps only the latest anchor coordinate per
//! dependent window and arms at most one flush at a time; the owner of the
//! scheduler waits one frame interval after [`FlushRequest::Schedule`] and then
//! calls [`take_batch`](PositionSyncScheduler::take_batch).
//!
//! The scheduler is plain data. It performs no I/O and owns no timer, so the
//! same type drives both the live event pump and deterministic tests.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;

use crate::geometry::PhysicalPosition;

/// One display refresh at 60 Hz.
pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// What the caller should do after [`PositionSyncScheduler::enqueue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushRequest {
    /// The queue went from idle to pending: arm a single-shot frame timer.
    Schedule,
    /// A flush is already armed; nothing to do.
    AlreadyPending,
}

/// A coalesced reposition waiting for the next flush.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingMove<K> {
    pub bubble: K,
    pub anchor: PhysicalPosition,
}

/// Last-write-wins queue of anchor positions keyed by dependent window.
#[derive(Debug)]
pub struct PositionSyncScheduler<K> {
    queue: HashMap<K, PhysicalPosition>,
    /// Arrival order of first insertion since the last flush.
    order: Vec<K>,
    flush_pending: bool,
    frame_interval: Duration,
    coalesced: u64,
}

impl<K: Eq + Hash + Clone> Default for PositionSyncScheduler<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + Hash + Clone> PositionSyncScheduler<K> {
    pub fn new() -> Self {
        Self::with_frame_interval(DEFAULT_FRAME_INTERVAL)
    }

    pub fn with_frame_interval(frame_interval: Duration) -> Self {
        Self {
            queue: HashMap::new(),
            order: Vec::new(),
            flush_pending: false,
            frame_interval,
            coalesced: 0,
        }
    }

    pub fn frame_interval(&self) -> Duration {
        self.frame_interval
    }

    /// Record the latest anchor coordinate for `bubble`.
    pub fn enqueue(&mut self, bubble: K, anchor: PhysicalPosition) -> FlushRequest {
        if self.queue.insert(bubble.clone(), anchor).is_some() {
            self.coalesced += 1;
        } else {
            self.order.push(bubble);
        }

        if self.flush_pending {
            FlushRequest::AlreadyPending
        } else {
            self.flush_pending = true;
            tracing::trace!(target: "perch_core::frame_sync", "position flush scheduled");
            FlushRequest::Schedule
        }
    }

    /// Take every pending move and reset the pending flag.
    ///
    /// Moves enqueued after this call start a new cycle. Moves come out in the
    /// order their bubble first entered the current cycle.
    pub fn take_batch(&mut self) -> Vec<PendingMove<K>> {
        self.flush_pending = false;
        let mut queue = std::mem::take(&mut self.queue);
        let batch: Vec<PendingMove<K>> = std::mem::take(&mut self.order)
            .into_iter()
            .filter_map(|bubble| {
                queue
                    .remove(&bubble)
                    .map(|anchor| PendingMove { bubble, anchor })
            })
            .collect();
        tracing::trace!(
            target: "perch_core::frame_sync",
            count = batch.len(),
            "position batch taken",
        );
        batch
    }

    /// Drop any pending move for `bubble`. Returns whether one was queued.
    pub fn forget(&mut self, bubble: &K) -> bool {
        let removed = self.queue.remove(bubble).is_some();
        if removed {
            self.order.retain(|k| k != bubble);
        }
        removed
    }

    /// Whether a flush is armed and not yet taken.
    pub fn is_flush_pending(&self) -> bool {
        self.flush_pending
    }

    pub fn pending_len(&self) -> usize {
        self.queue.len()
    }

    pub fn pending_for(&self, bubble: &K) -> Option<PhysicalPosition> {
        self.queue.get(bubble).copied()
    }

    /// Total number of moves overwritten before reaching a flush.
    pub fn coalesced_count(&self) -> u64 {
        self.coalesced
    }
}
