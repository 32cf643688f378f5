//! Drives a full overlay session against the in-memory window host.
//!
//! Run with `RUST_LOG=perch=debug` to watch bubbles open, lay out and follow
//! the sprite.

use std::rc::Rc;
use std::time::Duration;

use perch::window::{HeadlessHost, HostOp};
use perch::{
    LogicalSize, ModifiersState, Overlay, OverlayConfig, PhysicalPosition, PhysicalSize,
    PointerAction, PromptDispatcher, RecognitionEvent, Rect, SpeechRecognizer, SpriteSource,
    TranscriptSession, logging,
};

/// Answers every prompt with a canned line.
struct CannedDispatcher;

impl PromptDispatcher for CannedDispatcher {
    type Error = std::convert::Infallible;

    async fn dispatch(&self, prompt: &str) -> Result<String, Self::Error> {
        Ok(format!("Quack! You said: {prompt}"))
    }
}

/// Recognizer that only counts restarts.
#[derive(Default)]
struct SilentRecognizer {
    starts: usize,
}

impl SpeechRecognizer for SilentRecognizer {
    fn start(&mut self) {
        self.starts += 1;
    }

    fn stop(&mut self) {}
}

fn sprite_png() -> Vec<u8> {
    let image = image::RgbaImage::from_fn(16, 16, |x, y| {
        let (dx, dy) = (x as i32 - 8, y as i32 - 8);
        let alpha = if dx * dx + dy * dy <= 49 { 255 } else { 0 };
        image::Rgba([250, 210, 40, alpha])
    });
    let mut bytes = Vec::new();
    image
        .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
        .expect("encode sprite");
    bytes
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = OverlayConfig::default_path()
        .map(OverlayConfig::load_or_default)
        .unwrap_or_default();
    logging::init(&config.logging.filter);

    let host = Rc::new(HeadlessHost::new());
    let anchor =
        host.add_anchor("main", PhysicalPosition::new(200, 300), PhysicalSize::new(128, 128));

    let local = tokio::task::LocalSet::new();
    local
        .run_until(async {
            let (overlay, driver) = Overlay::new(host.clone(), anchor, config);
            let pump = tokio::task::spawn_local(driver.run());

            let policy = overlay.load_sprite(SpriteSource::Bytes(sprite_png())).await;
            println!("click-through: {policy:?}");

            let sprite = Rect::new(0.0, 0.0, 128.0, 128.0);
            let mut session = TranscriptSession::new(SilentRecognizer::default());
            let press = overlay.classify_press(64.0, 64.0, sprite, ModifiersState::CONTROL);
            if press == PointerAction::ToggleRecording {
                session.toggle();
                session.handle(RecognitionEvent::Transcript("hello".into()));
                session.handle(RecognitionEvent::End);
                session.handle(RecognitionEvent::Transcript("little duck".into()));
            }
            let prompt = session.toggle().unwrap_or_default();
            println!("transcript: {prompt:?}");

            let answer = overlay.respond(&CannedDispatcher, &prompt, "bubble").await?;
            println!("bubble says: {answer}");

            let window = overlay.registry().window("bubble").ok_or("bubble window missing")?;
            host.report_layout(window, LogicalSize::new(220.0, 64.0));
            tokio::time::sleep(Duration::from_millis(5)).await;

            for step in 0..30 {
                host.move_window(anchor, PhysicalPosition::new(200 + step * 4, 300 - step));
                tokio::time::sleep(Duration::from_millis(2)).await;
            }
            tokio::time::sleep(Duration::from_millis(40)).await;

            let snapshot = host.snapshot(window).ok_or("bubble window missing")?;
            println!(
                "bubble at {:?}, size {:?}, {} repositions for 30 anchor moves",
                snapshot.position,
                snapshot.size,
                host.calls_of(HostOp::SetOuterPosition).len(),
            );

            overlay.shutdown().await;
            pump.await?;
            Ok::<(), Box<dyn std::error::Error>>(())
        })
        .await
}
