//! In-memory [`WindowHost`] for simulation and tests.
//!
//! [`HeadlessHost`] keeps windows as plain records, logs every native call,
//! and lets callers inject failures per operation. Every trait method yields
//! to the runtime once before doing its work, so async interleavings (a close
//! racing a layout, a move racing an open) behave as they would against a
//! real window manager.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::Mutex;
use perch_core::{
    HitMaskPayload, LogicalSize, PhysicalPosition, PhysicalSize, Signal, SpriteBounds, Subscription,
};

use super::floating_style::FloatingWindowStyle;
use super::host::{
    CreateWindowRequest, EventSlot, WindowEvent, WindowEventKind, WindowHandle, WindowHost,
};
use crate::error::{NativeCallError, NativeResult};

/// Native operations, for failure injection and call filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostOp {
    CreateWindow,
    OuterPosition,
    SetOuterPosition,
    OuterSize,
    SetOuterSize,
    SetResizable,
    Show,
    Focus,
    Close,
    ScaleFactor,
    Subscribe,
    SetHitMask,
    StartClickThroughMonitor,
}

impl HostOp {
    fn name(self) -> &'static str {
        match self {
            Self::CreateWindow => "create_window",
            Self::OuterPosition => "outer_position",
            Self::SetOuterPosition => "set_outer_position",
            Self::OuterSize => "outer_size",
            Self::SetOuterSize => "set_outer_size",
            Self::SetResizable => "set_resizable",
            Self::Show => "show",
            Self::Focus => "focus",
            Self::Close => "close",
            Self::ScaleFactor => "scale_factor",
            Self::Subscribe => "subscribe",
            Self::SetHitMask => "set_hit_mask",
            Self::StartClickThroughMonitor => "start_click_through_monitor",
        }
    }
}

/// One recorded native call.
#[derive(Debug, Clone, PartialEq)]
pub enum HostCall {
    CreateWindow {
        label: String,
        url: String,
        position: PhysicalPosition,
        size: PhysicalSize,
    },
    OuterPosition(WindowHandle),
    SetOuterPosition(WindowHandle, PhysicalPosition),
    OuterSize(WindowHandle),
    SetOuterSize(WindowHandle, PhysicalSize),
    SetResizable(WindowHandle, bool),
    Show(WindowHandle),
    Focus(WindowHandle),
    Close(WindowHandle),
    ScaleFactor(WindowHandle),
    Subscribe(WindowHandle, WindowEventKind),
    SetHitMask { width: u32, height: u32 },
    StartClickThroughMonitor(SpriteBounds),
}

impl HostCall {
    pub fn op(&self) -> HostOp {
        match self {
            Self::CreateWindow { .. } => HostOp::CreateWindow,
            Self::OuterPosition(_) => HostOp::OuterPosition,
            Self::SetOuterPosition(..) => HostOp::SetOuterPosition,
            Self::OuterSize(_) => HostOp::OuterSize,
            Self::SetOuterSize(..) => HostOp::SetOuterSize,
            Self::SetResizable(..) => HostOp::SetResizable,
            Self::Show(_) => HostOp::Show,
            Self::Focus(_) => HostOp::Focus,
            Self::Close(_) => HostOp::Close,
            Self::ScaleFactor(_) => HostOp::ScaleFactor,
            Self::Subscribe(..) => HostOp::Subscribe,
            Self::SetHitMask { .. } => HostOp::SetHitMask,
            Self::StartClickThroughMonitor(_) => HostOp::StartClickThroughMonitor,
        }
    }
}

/// Observable state of a simulated window.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowSnapshot {
    pub handle: WindowHandle,
    pub label: String,
    pub url: String,
    pub position: PhysicalPosition,
    pub size: PhysicalSize,
    pub scale_factor: f64,
    pub visible: bool,
    pub resizable: bool,
    pub focused: bool,
    pub style: FloatingWindowStyle,
}

struct HeadlessWindow {
    snapshot: WindowSnapshot,
    signals: HashMap<WindowEventKind, Arc<Signal<WindowEvent>>>,
}

impl HeadlessWindow {
    fn signal(&mut self, kind: WindowEventKind) -> Arc<Signal<WindowEvent>> {
        self.signals.entry(kind).or_default().clone()
    }
}

#[derive(Default)]
struct HostState {
    next_handle: u64,
    windows: HashMap<WindowHandle, HeadlessWindow>,
    calls: Vec<HostCall>,
    failures: HashSet<HostOp>,
    hit_mask: Option<HitMaskPayload>,
    monitor: Option<SpriteBounds>,
}

impl HostState {
    fn insert(&mut self, snapshot: impl FnOnce(WindowHandle) -> WindowSnapshot) -> WindowHandle {
        self.next_handle += 1;
        let handle = WindowHandle::from_raw(self.next_handle);
        self.windows.insert(
            handle,
            HeadlessWindow {
                snapshot: snapshot(handle),
                signals: HashMap::new(),
            },
        );
        handle
    }

    fn window(&mut self, handle: WindowHandle) -> NativeResult<&mut HeadlessWindow> {
        self.windows
            .get_mut(&handle)
            .ok_or(NativeCallError::WindowNotFound(handle))
    }
}

/// A window manager that lives entirely in memory.
pub struct HeadlessHost {
    state: Mutex<HostState>,
    default_scale: f64,
}

impl Default for HeadlessHost {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessHost {
    pub fn new() -> Self {
        Self::with_scale_factor(1.0)
    }

    /// Host whose new windows report `scale` as their scale factor.
    pub fn with_scale_factor(scale: f64) -> Self {
        Self {
            state: Mutex::new(HostState::default()),
            default_scale: scale,
        }
    }

    /// Add a visible anchor window without recording a call.
    pub fn add_anchor(
        &self,
        label: &str,
        position: PhysicalPosition,
        size: PhysicalSize,
    ) -> WindowHandle {
        let scale = self.default_scale;
        self.state.lock().insert(|handle| WindowSnapshot {
            handle,
            label: label.to_string(),
            url: String::new(),
            position,
            size,
            scale_factor: scale,
            visible: true,
            resizable: false,
            focused: false,
            style: FloatingWindowStyle::bubble().with_visible(true).with_skip_taskbar(false),
        })
    }

    pub fn set_window_scale_factor(&self, window: WindowHandle, scale: f64) {
        if let Some(w) = self.state.lock().windows.get_mut(&window) {
            w.snapshot.scale_factor = scale;
        }
    }

    /// Move a window as the user would and emit [`WindowEvent::Moved`].
    pub fn move_window(&self, window: WindowHandle, position: PhysicalPosition) {
        if let Some(w) = self.state.lock().windows.get_mut(&window) {
            w.snapshot.position = position;
        }
        self.emit(window, WindowEvent::Moved(position));
    }

    /// Report a content layout as the window's content would.
    pub fn report_layout(&self, window: WindowHandle, size: LogicalSize) {
        self.emit(window, WindowEvent::Resized(size));
    }

    /// Deliver `event` to the window's listeners of the matching kind.
    pub fn emit(&self, window: WindowHandle, event: WindowEvent) {
        let signal = self
            .state
            .lock()
            .windows
            .get(&window)
            .and_then(|w| w.signals.get(&event.kind()).cloned());
        if let Some(signal) = signal {
            signal.emit(event);
        }
    }

    pub fn snapshot(&self, window: WindowHandle) -> Option<WindowSnapshot> {
        self.state.lock().windows.get(&window).map(|w| w.snapshot.clone())
    }

    /// Live windows carrying `label`.
    pub fn windows_labeled(&self, label: &str) -> Vec<WindowSnapshot> {
        let mut found: Vec<WindowSnapshot> = self
            .state
            .lock()
            .windows
            .values()
            .filter(|w| w.snapshot.label == label)
            .map(|w| w.snapshot.clone())
            .collect();
        found.sort_by_key(|s| s.handle);
        found
    }

    pub fn window_count(&self) -> usize {
        self.state.lock().windows.len()
    }

    pub fn is_open(&self, window: WindowHandle) -> bool {
        self.state.lock().windows.contains_key(&window)
    }

    pub fn listener_count(&self, window: WindowHandle, kind: WindowEventKind) -> usize {
        self.state
            .lock()
            .windows
            .get(&window)
            .and_then(|w| w.signals.get(&kind))
            .map_or(0, |signal| signal.connection_count())
    }

    /// Every native call since creation or the last [`clear_calls`](Self::clear_calls).
    pub fn calls(&self) -> Vec<HostCall> {
        self.state.lock().calls.clone()
    }

    pub fn calls_of(&self, op: HostOp) -> Vec<HostCall> {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|call| call.op() == op)
            .cloned()
            .collect()
    }

    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    /// Make every subsequent `op` call fail.
    pub fn fail(&self, op: HostOp) {
        self.state.lock().failures.insert(op);
    }

    pub fn heal(&self, op: HostOp) {
        self.state.lock().failures.remove(&op);
    }

    pub fn published_mask(&self) -> Option<HitMaskPayload> {
        self.state.lock().hit_mask.clone()
    }

    pub fn monitor_bounds(&self) -> Option<SpriteBounds> {
        self.state.lock().monitor
    }

    /// Yield, record `call`, and fail if its operation is poisoned.
    async fn enter(&self, call: HostCall) -> NativeResult<()> {
        tokio::task::yield_now().await;
        let op = call.op();
        let mut state = self.state.lock();
        state.calls.push(call);
        if state.failures.contains(&op) {
            tracing::trace!(target: "perch::headless", op = op.name(), "injected failure");
            return Err(NativeCallError::rejected(op.name(), "injected failure"));
        }
        Ok(())
    }

    async fn with_window<T>(
        &self,
        call: HostCall,
        window: WindowHandle,
        f: impl FnOnce(&mut HeadlessWindow) -> T,
    ) -> NativeResult<T> {
        self.enter(call).await?;
        let mut state = self.state.lock();
        Ok(f(state.window(window)?))
    }
}

impl WindowHost for HeadlessHost {
    async fn create_window(&self, request: CreateWindowRequest) -> NativeResult<WindowHandle> {
        self.enter(HostCall::CreateWindow {
            label: request.label.clone(),
            url: request.url.clone(),
            position: request.position,
            size: request.size,
        })
        .await?;
        let scale = self.default_scale;
        let handle = self.state.lock().insert(|handle| WindowSnapshot {
            handle,
            label: request.label,
            url: request.url,
            position: request.position,
            size: request.size,
            scale_factor: scale,
            visible: request.style.visible,
            resizable: request.style.resizable,
            focused: false,
            style: request.style,
        });
        Ok(handle)
    }

    async fn outer_position(&self, window: WindowHandle) -> NativeResult<PhysicalPosition> {
        self.with_window(HostCall::OuterPosition(window), window, |w| w.snapshot.position)
            .await
    }

    async fn set_outer_position(
        &self,
        window: WindowHandle,
        position: PhysicalPosition,
    ) -> NativeResult<()> {
        self.with_window(HostCall::SetOuterPosition(window, position), window, |w| {
            w.snapshot.position = position;
        })
        .await
    }

    async fn outer_size(&self, window: WindowHandle) -> NativeResult<PhysicalSize> {
        self.with_window(HostCall::OuterSize(window), window, |w| w.snapshot.size)
            .await
    }

    async fn set_outer_size(&self, window: WindowHandle, size: PhysicalSize) -> NativeResult<()> {
        self.with_window(HostCall::SetOuterSize(window, size), window, |w| {
            w.snapshot.size = size;
        })
        .await
    }

    async fn set_resizable(&self, window: WindowHandle, resizable: bool) -> NativeResult<()> {
        self.with_window(HostCall::SetResizable(window, resizable), window, |w| {
            w.snapshot.resizable = resizable;
        })
        .await
    }

    async fn show(&self, window: WindowHandle) -> NativeResult<()> {
        self.with_window(HostCall::Show(window), window, |w| {
            w.snapshot.visible = true;
        })
        .await
    }

    async fn focus(&self, window: WindowHandle) -> NativeResult<()> {
        self.enter(HostCall::Focus(window)).await?;
        let mut state = self.state.lock();
        state.window(window)?;
        for (handle, w) in state.windows.iter_mut() {
            w.snapshot.focused = *handle == window;
        }
        Ok(())
    }

    async fn close(&self, window: WindowHandle) -> NativeResult<()> {
        self.enter(HostCall::Close(window)).await?;
        let removed = self.state.lock().windows.remove(&window);
        match removed {
            Some(_) => Ok(()),
            None => Err(NativeCallError::WindowNotFound(window)),
        }
    }

    async fn scale_factor(&self, window: WindowHandle) -> NativeResult<f64> {
        self.with_window(HostCall::ScaleFactor(window), window, |w| w.snapshot.scale_factor)
            .await
    }

    async fn subscribe(
        &self,
        window: WindowHandle,
        kind: WindowEventKind,
        slot: EventSlot,
    ) -> NativeResult<Subscription> {
        let signal = self
            .with_window(HostCall::Subscribe(window, kind), window, |w| w.signal(kind))
            .await?;
        Ok(signal.subscribe(slot))
    }

    async fn set_hit_mask(&self, payload: &HitMaskPayload) -> NativeResult<()> {
        self.enter(HostCall::SetHitMask {
            width: payload.width,
            height: payload.height,
        })
        .await?;
        self.state.lock().hit_mask = Some(payload.clone());
        Ok(())
    }

    async fn start_click_through_monitor(
        &self,
        bounds: SpriteBounds,
        _payload: &HitMaskPayload,
    ) -> NativeResult<()> {
        self.enter(HostCall::StartClickThroughMonitor(bounds)).await?;
        self.state.lock().monitor = Some(bounds);
        Ok(())
    }
}
