//! Bubble open/layout/close behavior against the headless host.

use std::rc::Rc;

use perch::window::{HeadlessHost, HostCall, HostOp, WindowEventKind, WindowHandle};
use perch::{
    BubbleLifecycle, DEFAULT_BUBBLE_ID, DISPATCH_FAILURE_TEXT, LogicalPosition, LogicalSize,
    Overlay, OverlayConfig, OverlayDriver, OverlayError, PhysicalPosition, PhysicalSize,
    PromptDispatcher,
};

type Fixture = (Rc<HeadlessHost>, WindowHandle, Overlay<HeadlessHost>, OverlayDriver<HeadlessHost>);

fn setup(scale: f64) -> Fixture {
    let host = Rc::new(HeadlessHost::with_scale_factor(scale));
    let anchor =
        host.add_anchor("main", PhysicalPosition::new(100, 100), PhysicalSize::new(128, 128));
    let (overlay, driver) = Overlay::new(host.clone(), anchor, OverlayConfig::default());
    (host, anchor, overlay, driver)
}

#[tokio::test]
async fn test_open_creates_hidden_window_above_anchor() {
    let (host, _anchor, overlay, _driver) = setup(2.0);

    let id = overlay.open_bubble("hi", "b1").await.unwrap();
    assert_eq!(id, "b1");

    let registry = overlay.registry();
    let window = registry.window("b1").unwrap();
    let snapshot = host.snapshot(window).unwrap();
    assert_eq!(snapshot.position, PhysicalPosition::new(400, -18));
    assert_eq!(snapshot.size, PhysicalSize::new(500, 200));
    assert_eq!(snapshot.url, "chat-bubble.html?text=hi&id=b1");
    assert!(!snapshot.visible);
    assert!(!snapshot.style.decorations);
    assert!(snapshot.style.always_on_top);

    assert_eq!(registry.offset("b1"), Some(PhysicalPosition::new(300, 82)));
    assert_eq!(registry.lifecycle("b1"), BubbleLifecycle::AwaitingFirstLayout);
    assert!(registry.anchor_attached("b1"));
}

#[tokio::test]
async fn test_open_twice_keeps_one_window_and_one_listener() {
    let (host, anchor, overlay, _driver) = setup(1.0);

    overlay.open_bubble("first", "b1").await.unwrap();
    overlay.open_bubble("second", "b1").await.unwrap();

    let live = host.windows_labeled("b1");
    assert_eq!(live.len(), 1);
    assert_eq!(live[0].url, "chat-bubble.html?text=second&id=b1");
    assert_eq!(host.listener_count(anchor, WindowEventKind::Moved), 1);
    assert_eq!(host.listener_count(live[0].handle, WindowEventKind::Resized), 1);
    assert_eq!(overlay.registry().len(), 1);
}

#[tokio::test]
async fn test_close_unknown_bubble_makes_no_native_calls() {
    let (host, _anchor, overlay, _driver) = setup(1.0);
    overlay.open_bubble("hi", "b1").await.unwrap();
    host.clear_calls();

    overlay.close_bubble("nonexistent").await;

    assert!(host.calls().is_empty());
    assert!(overlay.registry().contains("b1"));
}

#[tokio::test]
async fn test_close_removes_window_and_listeners() {
    let (host, anchor, overlay, _driver) = setup(1.0);
    overlay.open_bubble("hi", "b1").await.unwrap();
    let window = overlay.registry().window("b1").unwrap();

    overlay.close_bubble("b1").await;

    assert!(!host.is_open(window));
    assert_eq!(host.window_count(), 1);
    assert_eq!(host.listener_count(anchor, WindowEventKind::Moved), 0);
    assert_eq!(overlay.registry().lifecycle("b1"), BubbleLifecycle::Closed);
    assert!(!overlay.registry().anchor_attached("b1"));
}

#[tokio::test]
async fn test_close_ignores_native_failure() {
    let (host, _anchor, overlay, _driver) = setup(1.0);
    overlay.open_bubble("hi", "b1").await.unwrap();
    host.fail(HostOp::Close);

    overlay.close_bubble("b1").await;

    assert!(overlay.registry().is_empty());
    assert_eq!(host.calls_of(HostOp::Close).len(), 1);
}

#[tokio::test]
async fn test_first_layout_sizes_places_and_reveals() {
    let (host, anchor, overlay, mut driver) = setup(2.0);
    overlay.open_bubble("hi", "b1").await.unwrap();
    let window = overlay.registry().window("b1").unwrap();
    host.clear_calls();

    host.report_layout(window, LogicalSize::new(120.5, 40.0));
    assert_eq!(driver.drain().await, 1);

    let size = PhysicalSize::new(241, 80);
    let position = PhysicalPosition::new(400, 102);
    assert_eq!(
        host.calls(),
        vec![
            HostCall::OuterPosition(anchor),
            HostCall::SetOuterSize(window, size),
            HostCall::SetOuterPosition(window, position),
            HostCall::SetResizable(window, false),
            HostCall::Show(window),
            HostCall::Focus(window),
        ]
    );
    let snapshot = host.snapshot(window).unwrap();
    assert!(snapshot.visible);
    assert!(snapshot.focused);
    assert!(!snapshot.resizable);
    assert_eq!(overlay.registry().lifecycle("b1"), BubbleLifecycle::Positioned);
}

#[tokio::test]
async fn test_layout_uses_fresh_anchor_position() {
    let (host, anchor, overlay, mut driver) = setup(1.0);
    overlay.open_bubble("hi", "b1").await.unwrap();
    let window = overlay.registry().window("b1").unwrap();

    host.move_window(anchor, PhysicalPosition::new(300, 400));
    host.report_layout(window, LogicalSize::new(100.0, 30.0));
    driver.drain().await;

    assert_eq!(host.snapshot(window).unwrap().position, PhysicalPosition::new(450, 411));
}

#[tokio::test]
async fn test_layout_failure_still_reveals() {
    let (host, _anchor, overlay, mut driver) = setup(1.0);
    overlay.open_bubble("hi", "b1").await.unwrap();
    let window = overlay.registry().window("b1").unwrap();
    host.fail(HostOp::SetOuterSize);

    host.report_layout(window, LogicalSize::new(100.0, 30.0));
    driver.drain().await;

    assert!(host.snapshot(window).unwrap().visible);
    assert_eq!(overlay.registry().lifecycle("b1"), BubbleLifecycle::Positioned);
}

#[tokio::test]
async fn test_focus_failure_is_not_fatal() {
    let (host, _anchor, overlay, mut driver) = setup(1.0);
    overlay.open_bubble("hi", "b1").await.unwrap();
    let window = overlay.registry().window("b1").unwrap();
    host.fail(HostOp::Focus);

    host.report_layout(window, LogicalSize::new(100.0, 30.0));
    driver.drain().await;

    assert_eq!(host.calls_of(HostOp::Show).len(), 1);
    assert_eq!(overlay.registry().lifecycle("b1"), BubbleLifecycle::Positioned);
}

#[tokio::test]
async fn test_close_during_layout_is_a_no_op() {
    let (host, anchor, overlay, _driver) = setup(1.0);
    overlay.open_bubble("hi", "b1").await.unwrap();
    let registry = overlay.registry();
    let key = registry.key("b1").unwrap();
    let window = registry.window("b1").unwrap();
    host.clear_calls();

    tokio::join!(
        registry.apply_layout(&key, LogicalSize::new(100.0, 30.0)),
        registry.close_bubble("b1"),
    );

    let calls = host.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls.contains(&HostCall::OuterPosition(anchor)));
    assert!(calls.contains(&HostCall::Close(window)));
    assert!(!host.is_open(window));
    assert!(registry.is_empty());
}

#[tokio::test]
async fn test_close_while_creating_discards_orphaned_window() {
    let (host, anchor, overlay, _driver) = setup(1.0);
    host.clear_calls();

    let closer = async {
        while !host
            .calls()
            .iter()
            .any(|call| *call == HostCall::OuterPosition(anchor))
        {
            tokio::task::yield_now().await;
        }
        overlay.close_bubble("b1").await;
    };
    let (opened, ()) = tokio::join!(overlay.open_bubble("hi", "b1"), closer);

    assert_eq!(opened.unwrap(), "b1");
    assert_eq!(host.calls_of(HostOp::CreateWindow).len(), 1);
    assert_eq!(host.calls_of(HostOp::Close).len(), 1);
    assert!(host.windows_labeled("b1").is_empty());
    assert!(overlay.registry().is_empty());
}

#[tokio::test]
async fn test_stale_layout_after_reopen_is_ignored() {
    let (host, _anchor, overlay, _driver) = setup(1.0);
    overlay.open_bubble("first", "b1").await.unwrap();
    let stale = overlay.registry().key("b1").unwrap();
    overlay.open_bubble("second", "b1").await.unwrap();
    host.clear_calls();

    overlay
        .registry()
        .apply_layout(&stale, LogicalSize::new(10.0, 10.0))
        .await;

    assert!(host.calls().is_empty());
    assert_eq!(overlay.registry().lifecycle("b1"), BubbleLifecycle::AwaitingFirstLayout);
}

#[tokio::test]
async fn test_empty_id_is_rejected() {
    let (host, _anchor, overlay, _driver) = setup(1.0);
    let err = overlay.open_bubble("hi", "").await.unwrap_err();
    assert!(matches!(err, OverlayError::EmptyBubbleId));
    assert!(host.calls().is_empty());
}

#[tokio::test]
async fn test_default_bubble_uses_default_id() {
    let (host, _anchor, overlay, _driver) = setup(1.0);

    let id = overlay.open_default_bubble("hi").await.unwrap();

    assert_eq!(id, DEFAULT_BUBBLE_ID);
    let window = overlay.registry().window(DEFAULT_BUBBLE_ID).unwrap();
    assert_eq!(host.snapshot(window).unwrap().url, "chat-bubble.html?text=hi&id=bubble");
    assert_eq!(overlay.registry().ids(), vec![DEFAULT_BUBBLE_ID.to_string()]);
}

#[tokio::test]
async fn test_create_failure_leaves_bubble_closed() {
    let (host, anchor, overlay, _driver) = setup(1.0);
    host.fail(HostOp::CreateWindow);

    let id = overlay.open_bubble("hi", "b1").await.unwrap();

    assert_eq!(id, "b1");
    assert_eq!(overlay.registry().lifecycle("b1"), BubbleLifecycle::Closed);
    assert_eq!(host.window_count(), 1);
    assert_eq!(host.listener_count(anchor, WindowEventKind::Moved), 0);
}

#[tokio::test]
async fn test_subscribe_failure_reveals_at_initial_size() {
    let (host, _anchor, overlay, _driver) = setup(1.0);
    host.fail(HostOp::Subscribe);

    overlay.open_bubble("hi", "b1").await.unwrap();

    let window = overlay.registry().window("b1").unwrap();
    let snapshot = host.snapshot(window).unwrap();
    assert!(snapshot.visible);
    assert_eq!(snapshot.size, PhysicalSize::new(500, 200));
    assert_eq!(overlay.registry().lifecycle("b1"), BubbleLifecycle::Positioned);
    assert!(!overlay.registry().anchor_attached("b1"));
}

#[tokio::test]
async fn test_custom_offset() {
    let (host, _anchor, overlay, _driver) = setup(1.5);
    overlay
        .open_bubble_at("hi", "b1", LogicalPosition::new(-20.0, 10.0))
        .await
        .unwrap();

    let window = overlay.registry().window("b1").unwrap();
    assert_eq!(overlay.registry().offset("b1"), Some(PhysicalPosition::new(-30, 15)));
    assert_eq!(host.snapshot(window).unwrap().position, PhysicalPosition::new(70, -85));
}

#[tokio::test]
async fn test_shutdown_closes_every_bubble() {
    let (host, _anchor, overlay, _driver) = setup(1.0);
    overlay.open_bubble("a", "a").await.unwrap();
    overlay.open_bubble("b", "b").await.unwrap();
    assert_eq!(overlay.registry().ids(), vec!["a".to_string(), "b".to_string()]);

    overlay.shutdown().await;

    assert!(overlay.registry().is_empty());
    assert_eq!(host.window_count(), 1);
}

struct Scripted(Result<&'static str, &'static str>);

impl PromptDispatcher for Scripted {
    type Error = &'static str;

    async fn dispatch(&self, _prompt: &str) -> Result<String, &'static str> {
        self.0.map(str::to_string)
    }
}

#[tokio::test]
async fn test_respond_shows_answer_in_bubble() {
    let (host, _anchor, overlay, _driver) = setup(1.0);

    let answer = overlay.respond(&Scripted(Ok("quack")), "hello?", "bubble").await.unwrap();

    assert_eq!(answer, "quack");
    let window = overlay.registry().window("bubble").unwrap();
    assert_eq!(host.snapshot(window).unwrap().url, "chat-bubble.html?text=quack&id=bubble");
}

#[tokio::test]
async fn test_respond_substitutes_failure_text() {
    let (_host, _anchor, overlay, _driver) = setup(1.0);

    let answer = overlay.respond(&Scripted(Err("offline")), "hello?", "bubble").await.unwrap();
    assert_eq!(answer, DISPATCH_FAILURE_TEXT);

    let err = overlay.respond(&Scripted(Ok("x")), "   ", "bubble").await.unwrap_err();
    assert!(matches!(err, OverlayError::EmptyPrompt));
}
