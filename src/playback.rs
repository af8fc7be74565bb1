//! Playback orchestrator.
//!
//! Owns one session: the scene clock, the narration, glyph-frame cycling
//! and the pointer. The host feeds it time, input and the canvas surface;
//! it answers with what to draw. Pause is a single call that reaches every
//! clock before it returns, so audio and visuals cannot disagree.

use tracing::{debug, info};

use crate::assets::{AgentAction, AnimatedAsset, AssetLibrary};
use crate::clock::{ClockTick, PlaybackState, SceneClock};
use crate::glyph::{self, FRAME_INTERVAL_MS, FrameCycler, GlyphCell, GlyphLayout, SYMBOL_SCALE};
use crate::pointer::PointerTracker;
use crate::schedule::Millis;
use crate::speech::{SpeechCoordinator, SpeechEngine, SpeechStatus};
use crate::storyboard::{Point, Scene, StoryboardDocument};
use crate::surface::Surface;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackOptions {
    pub symbol_scale: usize,
    pub frame_interval_ms: Millis,
    /// How long narration waits for the voice list before using the default.
    pub voice_wait_ms: Millis,
}

impl Default for PlaybackOptions {
    fn default() -> Self {
        PlaybackOptions {
            symbol_scale: SYMBOL_SCALE,
            frame_interval_ms: FRAME_INTERVAL_MS,
            voice_wait_ms: 2_000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickOutcome {
    pub clock: ClockTick,
    /// Something visible changed since the previous tick.
    pub redraw: bool,
}

/// Everything needed to paint one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameView {
    pub agent: Vec<GlyphCell>,
    pub symbol: Vec<GlyphCell>,
    pub caption: Option<String>,
    pub scene_index: usize,
    pub scene_count: usize,
    pub paused: bool,
    pub speech: SpeechStatus,
}

/// The current scene's symbol, scaled once when the scene starts.
struct SymbolArt {
    source: String,
    asset: AnimatedAsset,
}

pub struct Playback {
    document: StoryboardDocument,
    options: PlaybackOptions,
    clock: SceneClock,
    speech: SpeechCoordinator,
    pointer: PointerTracker,
    agent_action: AgentAction,
    agent_cycle: FrameCycler,
    symbol: Option<SymbolArt>,
    symbol_cycle: FrameCycler,
    closed: bool,
}

impl Playback {
    /// Mount a session and start playing `document` at `now`.
    pub fn new(
        document: StoryboardDocument,
        engine: Box<dyn SpeechEngine>,
        options: PlaybackOptions,
        now: Millis,
    ) -> Self {
        let mut playback = Playback {
            clock: SceneClock::new(Vec::new()),
            speech: SpeechCoordinator::new(engine, options.voice_wait_ms),
            pointer: PointerTracker::new(),
            agent_action: AgentAction::Idle,
            agent_cycle: FrameCycler::new(options.frame_interval_ms),
            symbol: None,
            symbol_cycle: FrameCycler::new(options.frame_interval_ms),
            closed: false,
            document,
            options,
        };
        playback.pointer.attach();
        playback.start_session(now);
        playback
    }

    /// Replace the document and restart from its first scene, unpaused.
    pub fn load(&mut self, document: StoryboardDocument, now: Millis) {
        self.speech.cancel_all();
        self.clock.cancel();
        self.document = document;
        self.closed = false;
        self.pointer.attach();
        self.start_session(now);
    }

    fn start_session(&mut self, now: Millis) {
        let durations = self.document.scenes().iter().map(|s| s.duration_ms).collect();
        self.clock = SceneClock::new(durations);
        self.clock.start();
        self.agent_cycle.resume(now);
        self.symbol_cycle.resume(now);
        self.sync_assets(now, true);
        self.speech
            .start(self.document.narration(), self.document.voice_hint(), now);
        info!(
            scenes = self.document.scenes().len(),
            duration_ms = self.document.total_duration_ms(),
            "playback started"
        );
    }

    pub fn tick(&mut self, now: Millis) -> TickOutcome {
        if self.closed {
            return TickOutcome {
                clock: ClockTick::Stopped,
                redraw: false,
            };
        }

        let clock = self.clock.tick(now);
        let mut redraw = false;
        if let ClockTick::Advanced(_) = clock {
            self.sync_assets(now, false);
            redraw = true;
        }

        let speech_before = self.speech.status();
        self.speech.poll(now);
        redraw |= self.speech.status() != speech_before;

        redraw |= self.agent_cycle.tick(now);
        redraw |= self.symbol_cycle.tick(now);

        TickOutcome { clock, redraw }
    }

    /// Flip pause for the clock, the narration and the glyph loops together.
    /// Returns the new paused state.
    pub fn toggle_pause(&mut self, now: Millis) -> bool {
        if self.clock.is_paused() {
            self.clock.resume(now);
            self.speech.resume(now);
            self.agent_cycle.resume(now);
            self.symbol_cycle.resume(now);
            debug!(at = now, "resumed");
            false
        } else {
            self.clock.pause(now);
            self.speech.pause(now);
            self.agent_cycle.pause();
            self.symbol_cycle.pause();
            debug!(at = now, "paused");
            true
        }
    }

    pub fn pointer_moved(&mut self, surface: &Surface, column: u16, row: u16) -> bool {
        self.pointer.on_move(surface, column, row)
    }

    pub fn pointer_left(&mut self) -> bool {
        self.pointer.on_leave()
    }

    pub fn current_scene(&self) -> &Scene {
        &self.document.scenes()[self.clock.current_index()]
    }

    pub fn state(&self) -> &PlaybackState {
        self.clock.state()
    }

    pub fn document(&self) -> &StoryboardDocument {
        &self.document
    }

    pub fn is_paused(&self) -> bool {
        self.clock.is_paused()
    }

    /// The last scene's time has run out.
    pub fn is_finished(&self) -> bool {
        self.clock.is_finished()
    }

    pub fn speech_status(&self) -> SpeechStatus {
        self.speech.status()
    }

    /// Lay out the current scene on `surface`.
    pub fn view(&self, surface: &Surface) -> FrameView {
        let scene = self.current_scene();
        let pointer = self.pointer.position();

        let agent_frame = AssetLibrary::get()
            .agent(self.agent_action)
            .frame(self.agent_cycle.cursor());
        let agent_layout = GlyphLayout::centered(
            surface,
            scene.agent_position,
            agent_frame.width(),
            agent_frame.height(),
        );
        let agent = glyph::render(agent_frame, agent_layout, surface, pointer);

        let symbol = match &self.symbol {
            Some(art) => {
                let frame = art.asset.frame(self.symbol_cycle.cursor());
                let anchor = scene.symbol_anchor().unwrap_or(Point::CENTER);
                let layout = GlyphLayout::centered(surface, anchor, frame.width(), frame.height());
                glyph::render(frame, layout, surface, pointer)
            }
            None => Vec::new(),
        };

        FrameView {
            agent,
            symbol,
            caption: scene.caption.clone(),
            scene_index: self.clock.current_index(),
            scene_count: self.document.scenes().len(),
            paused: self.clock.is_paused(),
            speech: self.speech.status(),
        }
    }

    /// Tear down: stop every loop and any narration.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.clock.cancel();
        self.agent_cycle.cancel();
        self.symbol_cycle.cancel();
        self.speech.release();
        self.pointer.detach();
        self.closed = true;
        debug!("playback closed");
    }

    /// Loops and utterances still running. Zero after `close`.
    pub fn active_tasks(&self) -> usize {
        [
            self.clock.is_running(),
            self.agent_cycle.is_active(),
            self.symbol_cycle.is_active(),
            self.speech.is_active(),
        ]
        .into_iter()
        .filter(|&active| active)
        .count()
    }

    /// Point the glyph loops at the current scene's assets. Unchanged assets
    /// keep their frame position unless `force` is set.
    fn sync_assets(&mut self, now: Millis, force: bool) {
        let scene = &self.document.scenes()[self.clock.current_index()];
        let action = scene.agent_action;
        let art = scene.symbol_art.clone();

        if force || action != self.agent_action {
            self.agent_action = action;
            let frames = AssetLibrary::get().agent(action).len();
            self.agent_cycle.set_asset(frames, now);
        }

        let same_symbol = match (&self.symbol, &art) {
            (Some(current), Some(next)) => current.source == *next,
            (None, None) => true,
            _ => false,
        };
        if force || !same_symbol {
            self.symbol = art.and_then(|source| {
                let asset = AnimatedAsset::symbol(&source)?;
                if !asset.frames().iter().all(glyph::Frame::is_rectangular) {
                    debug!("symbol art has ragged rows, drawing as given");
                }
                Some(SymbolArt {
                    asset: asset.scaled(self.options.symbol_scale),
                    source,
                })
            });
            let frames = self.symbol.as_ref().map_or(0, |s| s.asset.len());
            self.symbol_cycle.set_asset(frames, now);
        }
    }
}

impl Drop for Playback {
    fn drop(&mut self) {
        self.close();
    }
}
