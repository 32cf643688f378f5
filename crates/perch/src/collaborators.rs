//! Contracts for the overlay's external collaborators.
//!
//! Language-model prompting and speech recognition live outside the overlay.
//! This module fixes the interfaces the overlay drives them through, plus the
//! small amount of policy that belongs on this side of the boundary.

use std::fmt;

use crate::error::{OverlayError, OverlayResult};

/// Text shown in place of an answer when dispatch fails.
pub const DISPATCH_FAILURE_TEXT: &str = "ERROR SENDING PROMPT OR GETTING RESPONSE";

/// Sends a prompt to whatever produces the companion's answers.
#[allow(async_fn_in_trait)]
pub trait PromptDispatcher {
    type Error: fmt::Display;

    async fn dispatch(&self, prompt: &str) -> Result<String, Self::Error>;
}

/// Dispatch `prompt`, substituting [`DISPATCH_FAILURE_TEXT`] for any failure.
///
/// Only a blank prompt is an error.
pub async fn send_prompt<D: PromptDispatcher>(
    dispatcher: &D,
    prompt: &str,
) -> OverlayResult<String> {
    if prompt.trim().is_empty() {
        return Err(OverlayError::EmptyPrompt);
    }
    match dispatcher.dispatch(prompt).await {
        Ok(answer) => Ok(answer),
        Err(err) => {
            tracing::warn!(target: "perch::overlay", error = %err, "prompt dispatch failed");
            Ok(DISPATCH_FAILURE_TEXT.to_string())
        }
    }
}

/// Notifications from a speech recognizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionEvent {
    /// A final transcript for one utterance.
    Transcript(String),
    /// The recognizer stopped listening on its own.
    End,
}

/// A speech-to-text engine that listens one utterance at a time.
pub trait SpeechRecognizer {
    fn start(&mut self);

    fn stop(&mut self);

    /// Whether the engine exists on this platform.
    fn is_available(&self) -> bool {
        true
    }
}

/// Push-to-toggle dictation.
///
/// While recording, the recognizer is restarted every time it ends on its own,
/// so pauses between utterances do not stop capture. Stopping returns every
/// transcript joined by spaces.
#[derive(Debug)]
pub struct TranscriptSession<R> {
    recognizer: R,
    recording: bool,
    transcripts: Vec<String>,
}

impl<R: SpeechRecognizer> TranscriptSession<R> {
    pub fn new(recognizer: R) -> Self {
        Self {
            recognizer,
            recording: false,
            transcripts: Vec::new(),
        }
    }

    /// Start or stop recording. Returns the full transcript when stopping.
    pub fn toggle(&mut self) -> Option<String> {
        if !self.recognizer.is_available() {
            tracing::warn!(target: "perch::overlay", "speech recognition not supported");
            return None;
        }
        if self.recording {
            self.recording = false;
            self.recognizer.stop();
            let text = self.full_transcript();
            tracing::debug!(target: "perch::overlay", chars = text.len(), "recording stopped");
            Some(text)
        } else {
            self.transcripts.clear();
            self.recording = true;
            self.recognizer.start();
            tracing::debug!(target: "perch::overlay", "recording started");
            None
        }
    }

    pub fn handle(&mut self, event: RecognitionEvent) {
        match event {
            RecognitionEvent::Transcript(text) => self.transcripts.push(text),
            RecognitionEvent::End if self.recording => self.recognizer.start(),
            RecognitionEvent::End => {}
        }
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    pub fn transcripts(&self) -> &[String] {
        &self.transcripts
    }

    pub fn full_transcript(&self) -> String {
        self.transcripts.join(" ")
    }

    pub fn recognizer(&self) -> &R {
        &self.recognizer
    }
}
