//! Speech coordinator: Narrates a storyboard once, in step with playback.
//!
//! The synthesizer is an injected `SpeechEngine`: one per session, and only
//! one utterance in flight. The coordinator strips markup, waits for the
//! engine's voice list (which may load in the background), picks a voice
//! for the hint's language and speaks exactly once. Engine failures are
//! logged and never reach the visual side.

mod command;
mod silent;

pub use command::CommandSpeech;
pub use silent::SilentSpeech;

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info, warn};

use crate::error::SpeechError;
use crate::schedule::Millis;
use crate::storyboard::VoiceHint;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Voice {
    pub name: String,
    /// BCP-47-ish code, e.g. `en-us`.
    pub language: String,
    pub default: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceList {
    /// Still loading.
    Pending,
    Ready(Vec<Voice>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub text: String,
    /// `None` lets the engine use its default voice.
    pub voice: Option<Voice>,
    pub rate: f64,
    pub pitch: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechEvent {
    Finished,
    Failed(String),
}

/// A speech synthesizer. Implementations own at most one utterance.
pub trait SpeechEngine {
    fn voices(&mut self) -> VoiceList;
    /// Start speaking, replacing anything in flight.
    fn speak(&mut self, utterance: Utterance) -> Result<(), SpeechError>;
    fn pause(&mut self) -> Result<(), SpeechError>;
    fn resume(&mut self) -> Result<(), SpeechError>;
    /// Stop immediately. Safe to call when idle.
    fn cancel(&mut self);
    /// Completion or failure of the current utterance, if any happened.
    fn poll_event(&mut self) -> Option<SpeechEvent>;
}

static MARKUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]+>").expect("markup pattern is valid"));

/// Remove all tags and normalise whitespace.
pub fn strip_markup(markup: &str) -> String {
    MARKUP
        .replace_all(markup, " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// First voice whose language starts with `language`, else the engine's
/// default-flagged voice, else none.
pub fn select_voice(voices: &[Voice], language: &str) -> Option<Voice> {
    let wanted = language.trim().to_ascii_lowercase();
    voices
        .iter()
        .find(|v| !wanted.is_empty() && v.language.to_ascii_lowercase().starts_with(&wanted))
        .or_else(|| voices.iter().find(|v| v.default))
        .cloned()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechStatus {
    Idle,
    /// Narration was empty after stripping markup.
    Skipped,
    /// Waiting for the voice list (or for resume).
    Waiting,
    Speaking,
    Finished,
    Failed,
    Cancelled,
}

impl SpeechStatus {
    pub fn label(self) -> &'static str {
        match self {
            SpeechStatus::Idle => "idle",
            SpeechStatus::Skipped => "silent",
            SpeechStatus::Waiting => "waiting for voice",
            SpeechStatus::Speaking => "speaking",
            SpeechStatus::Finished => "done",
            SpeechStatus::Failed => "unavailable",
            SpeechStatus::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone)]
struct Pending {
    text: String,
    hint: VoiceHint,
    since: Millis,
}

pub struct SpeechCoordinator {
    engine: Box<dyn SpeechEngine>,
    status: SpeechStatus,
    pending: Option<Pending>,
    /// When the current pause began.
    paused_at: Option<Millis>,
    voice_wait_ms: Millis,
}

impl SpeechCoordinator {
    pub fn new(engine: Box<dyn SpeechEngine>, voice_wait_ms: Millis) -> Self {
        SpeechCoordinator {
            engine,
            status: SpeechStatus::Idle,
            pending: None,
            paused_at: None,
            voice_wait_ms,
        }
    }

    /// Narrate a new document. Anything still playing is cancelled first.
    pub fn start(&mut self, narration: &str, hint: &VoiceHint, now: Millis) {
        self.cancel_all();
        self.paused_at = None;

        let text = strip_markup(narration);
        if text.is_empty() {
            debug!("narration empty after stripping markup, skipping speech");
            self.status = SpeechStatus::Skipped;
            return;
        }

        self.pending = Some(Pending {
            text,
            hint: hint.clone(),
            since: now,
        });
        self.status = SpeechStatus::Waiting;
        self.try_speak(now);
    }

    /// Drive deferred synthesis and collect engine events.
    pub fn poll(&mut self, now: Millis) {
        match self.status {
            SpeechStatus::Waiting => self.try_speak(now),
            SpeechStatus::Speaking => match self.engine.poll_event() {
                Some(SpeechEvent::Finished) => {
                    debug!("narration finished");
                    self.status = SpeechStatus::Finished;
                }
                Some(SpeechEvent::Failed(reason)) => {
                    warn!(%reason, "speech synthesis failed");
                    self.status = SpeechStatus::Failed;
                }
                None => {}
            },
            _ => {}
        }
    }

    pub fn pause(&mut self, now: Millis) {
        self.paused_at.get_or_insert(now);
        if self.status == SpeechStatus::Speaking {
            if let Err(e) = self.engine.pause() {
                warn!(error = %e, "could not pause speech");
            }
        }
    }

    /// Time spent paused does not count against the voice wait.
    pub fn resume(&mut self, now: Millis) {
        if let Some(at) = self.paused_at.take() {
            if let Some(pending) = &mut self.pending {
                pending.since = pending.since.saturating_add(now.saturating_sub(at));
            }
        }
        match self.status {
            SpeechStatus::Speaking => {
                if let Err(e) = self.engine.resume() {
                    warn!(error = %e, "could not resume speech");
                }
            }
            SpeechStatus::Waiting => self.try_speak(now),
            _ => {}
        }
    }

    /// Stop any utterance immediately and drop a deferred one.
    pub fn cancel_all(&mut self) {
        self.engine.cancel();
        self.pending = None;
        if matches!(self.status, SpeechStatus::Waiting | SpeechStatus::Speaking) {
            self.status = SpeechStatus::Cancelled;
        }
    }

    /// End of session.
    pub fn release(&mut self) {
        self.cancel_all();
        self.paused_at = None;
    }

    pub fn status(&self) -> SpeechStatus {
        self.status
    }

    pub fn is_active(&self) -> bool {
        matches!(self.status, SpeechStatus::Waiting | SpeechStatus::Speaking)
    }

    fn try_speak(&mut self, now: Millis) {
        if self.paused_at.is_some() {
            return;
        }
        let Some(pending) = &self.pending else {
            return;
        };

        let voice = match self.engine.voices() {
            VoiceList::Ready(voices) => select_voice(&voices, &pending.hint.language),
            VoiceList::Pending if now.saturating_sub(pending.since) >= self.voice_wait_ms => {
                debug!(waited = now - pending.since, "voice list not ready, using default voice");
                None
            }
            VoiceList::Pending => return,
        };

        let Some(pending) = self.pending.take() else {
            return;
        };
        let utterance = Utterance {
            text: pending.text,
            voice,
            rate: pending.hint.rate,
            pitch: pending.hint.pitch,
        };
        info!(
            chars = utterance.text.len(),
            voice = utterance.voice.as_ref().map(|v| v.name.as_str()).unwrap_or("default"),
            "speaking narration"
        );
        match self.engine.speak(utterance) {
            Ok(()) => self.status = SpeechStatus::Speaking,
            Err(e) => {
                warn!(error = %e, "speech synthesis failed to start");
                self.status = SpeechStatus::Failed;
            }
        }
    }
}

impl Drop for SpeechCoordinator {
    fn drop(&mut self) {
        self.engine.cancel();
    }
}
