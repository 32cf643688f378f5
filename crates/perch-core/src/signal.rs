//! Signal/slot notifications with cancellable subscriptions.
//!
//! A [`Signal`] fans one event out to every connected slot. Slots run
//! synchronously on the emitting thread. Window hosts keep one signal per
//! window and event kind; listeners hold a [`Subscription`] and cancel it
//! explicitly or by dropping it.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicI32, Ordering};
//! use perch_core::Signal;
//!
//! let moved = Arc::new(Signal::<i32>::new());
//! let seen = Arc::new(AtomicI32::new(0));
//!
//! let seen_clone = seen.clone();
//! let subscription = moved.subscribe(move |&x| {
//!     seen_clone.store(x, Ordering::SeqCst);
//! });
//! moved.emit(7);
//! assert_eq!(seen.load(Ordering::SeqCst), 7);
//!
//! subscription.cancel();
//! moved.emit(9);
//! assert_eq!(seen.load(Ordering::SeqCst), 7);
//! ```

use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use slotmap::{SlotMap, new_key_type};

new_key_type! {
    /// A unique identifier for a signal-slot connection.
    pub struct ConnectionId;
}

type Slot<Args> = Arc<dyn Fn(&Args) + Send + Sync>;

/// A type-safe signal that can have multiple connected slots.
pub struct Signal<Args> {
    connections: Mutex<SlotMap<ConnectionId, Slot<Args>>>,
}

impl<Args> Default for Signal<Args> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Args> fmt::Debug for Signal<Args> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("connections", &self.connection_count())
            .finish()
    }
}

impl<Args> Signal<Args> {
    /// Create a new signal with no connections.
    pub fn new() -> Self {
        Self {
            connections: Mutex::new(SlotMap::with_key()),
        }
    }

    /// Connect a slot. Returns the id used to [`disconnect`](Self::disconnect) it.
    pub fn connect<F>(&self, slot: F) -> ConnectionId
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        self.connections.lock().insert(Arc::new(slot))
    }

    /// Returns `true` if the connection was found and removed.
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        self.connections.lock().remove(id).is_some()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.lock().len()
    }

    /// Invoke every connected slot with `args`.
    ///
    /// The connection table is snapshotted before dispatch, so slots may
    /// connect or disconnect (including themselves) while running.
    #[tracing::instrument(skip_all, target = "perch_core::signal", level = "trace")]
    pub fn emit(&self, args: Args) {
        let slots: Vec<Slot<Args>> = self.connections.lock().values().cloned().collect();
        tracing::trace!(
            target: "perch_core::signal",
            connection_count = slots.len(),
            "emitting signal",
        );
        for slot in slots {
            slot(&args);
        }
    }
}

impl<Args: 'static> Signal<Args> {
    /// Connect a slot and return a [`Subscription`] that disconnects it.
    ///
    /// The subscription holds only a weak reference, so it never keeps the
    /// signal alive.
    pub fn subscribe<F>(self: &Arc<Self>, slot: F) -> Subscription
    where
        F: Fn(&Args) + Send + Sync + 'static,
        Args: Send,
    {
        let id = self.connect(slot);
        let weak: Weak<Self> = Arc::downgrade(self);
        Subscription::new(move || {
            if let Some(signal) = weak.upgrade() {
                signal.disconnect(id);
            }
        })
    }
}

/// A cancellable registration with an event source.
///
/// Cancelling is idempotent. Dropping an active subscription cancels it;
/// call [`detach`](Self::detach) to keep the registration alive for the
/// lifetime of the source instead.
#[must_use = "dropping a Subscription cancels it immediately"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    /// Wrap a cancellation routine.
    pub fn new<F>(cancel: F) -> Self
    where
        F: FnOnce() + Send + Sync + 'static,
    {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// A subscription with nothing to cancel.
    pub fn empty() -> Self {
        Self { cancel: None }
    }

    /// Cancel now.
    pub fn cancel(mut self) {
        self.run_cancel();
    }

    /// Give up the ability to cancel; the registration stays in place.
    pub fn detach(mut self) {
        self.cancel = None;
    }

    pub fn is_active(&self) -> bool {
        self.cancel.is_some()
    }

    fn run_cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.run_cancel();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}
