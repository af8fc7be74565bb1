//! Scene clock: Decides when the current scene is over.
//!
//! The host calls `tick` once per display frame. Elapsed time in a scene is
//! `now - anchor`; pausing freezes it and resuming shifts the anchor by the
//! exact paused duration, so a pause never gains or loses scene time.
//! Scenes only move forward, and the clock stops for good on the last one.

use tracing::{debug, trace};

use crate::schedule::Millis;

/// Mutable playback position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaybackState {
    pub current_scene_index: usize,
    pub is_paused: bool,
    /// When the current scene became active, shifted forward by pauses.
    /// `None` until the first unpaused tick.
    pub scene_clock_anchor: Option<Millis>,
    pub paused_at: Option<Millis>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockTick {
    /// Loop not running (never started, cancelled, or finished earlier).
    Stopped,
    Paused,
    /// Still inside the current scene.
    Holding,
    /// Moved to the given scene.
    Advanced(usize),
    /// The last scene's time is up; the loop stops after this tick.
    Finished,
}

#[derive(Debug, Clone)]
pub struct SceneClock {
    durations: Vec<Millis>,
    state: PlaybackState,
    running: bool,
    finished: bool,
}

impl SceneClock {
    pub fn new(durations: Vec<Millis>) -> Self {
        SceneClock {
            durations,
            state: PlaybackState::default(),
            running: false,
            finished: false,
        }
    }

    /// Start the tick loop. The anchor is taken on the first unpaused tick.
    pub fn start(&mut self) {
        if !self.finished {
            self.running = true;
        }
    }

    /// Stop the tick loop without finishing.
    pub fn cancel(&mut self) {
        self.running = false;
    }

    pub fn tick(&mut self, now: Millis) -> ClockTick {
        if !self.running {
            return ClockTick::Stopped;
        }
        if self.state.is_paused {
            return ClockTick::Paused;
        }

        let anchor = *self.state.scene_clock_anchor.get_or_insert(now);
        let elapsed = now.saturating_sub(anchor);
        let index = self.state.current_scene_index;

        let Some(&duration) = self.durations.get(index) else {
            return self.finish(index);
        };
        if elapsed < duration {
            trace!(index, elapsed, duration, "holding scene");
            return ClockTick::Holding;
        }

        let next = index + 1;
        if next < self.durations.len() {
            self.state.current_scene_index = next;
            self.state.scene_clock_anchor = Some(now);
            debug!(scene = next, at = now, "scene advanced");
            ClockTick::Advanced(next)
        } else {
            self.finish(index)
        }
    }

    pub fn pause(&mut self, now: Millis) {
        if self.state.is_paused {
            return;
        }
        self.state.is_paused = true;
        self.state.paused_at = Some(now);
    }

    pub fn resume(&mut self, now: Millis) {
        if !self.state.is_paused {
            return;
        }
        self.state.is_paused = false;
        if let (Some(anchor), Some(paused_at)) =
            (self.state.scene_clock_anchor, self.state.paused_at.take())
        {
            let paused_for = now.saturating_sub(paused_at);
            self.state.scene_clock_anchor = Some(anchor + paused_for);
        }
    }

    /// Time spent in the current scene, excluding pauses.
    pub fn elapsed(&self, now: Millis) -> Millis {
        let Some(anchor) = self.state.scene_clock_anchor else {
            return 0;
        };
        let until = match (self.state.is_paused, self.state.paused_at) {
            (true, Some(paused_at)) => paused_at,
            _ => now,
        };
        until.saturating_sub(anchor)
    }

    /// Index of the current scene, clamped to the scene list.
    pub fn current_index(&self) -> usize {
        self.state
            .current_scene_index
            .min(self.durations.len().saturating_sub(1))
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn scene_count(&self) -> usize {
        self.durations.len()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_paused(&self) -> bool {
        self.state.is_paused
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn finish(&mut self, index: usize) -> ClockTick {
        self.running = false;
        self.finished = true;
        debug!(scene = index, "final scene reached");
        ClockTick::Finished
    }
}
