//! Asset library: Static binary art for the guide character.
//!
//! Every action maps to an ordered, non-empty list of frames of identical
//! size. Symbol art from a storyboard becomes a single-frame asset.

use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use crate::glyph::{Frame, scale_frame};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentAction {
    #[default]
    Idle,
    Wave,
    Blink,
}

impl AgentAction {
    /// Resolve an action name. Anything unrecognised is `Idle`.
    pub fn from_key(key: &str) -> AgentAction {
        match key.trim().to_ascii_lowercase().as_str() {
            "wave" => AgentAction::Wave,
            "blink" => AgentAction::Blink,
            _ => AgentAction::Idle,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            AgentAction::Idle => "idle",
            AgentAction::Wave => "wave",
            AgentAction::Blink => "blink",
        }
    }
}

/// An animation loop. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnimatedAsset {
    frames: Vec<Frame>,
}

impl AnimatedAsset {
    fn new(frames: Vec<Frame>) -> Self {
        debug_assert!(!frames.is_empty());
        AnimatedAsset { frames }
    }

    /// A one-frame asset from storyboard symbol art, or `None` if the art
    /// is blank.
    pub fn symbol(art: &str) -> Option<AnimatedAsset> {
        let frame = Frame::parse(art);
        (!frame.is_empty()).then(|| AnimatedAsset::new(vec![frame]))
    }

    /// Every frame blown up by `factor`.
    pub fn scaled(&self, factor: usize) -> AnimatedAsset {
        AnimatedAsset::new(self.frames.iter().map(|f| scale_frame(f, factor)).collect())
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Frame at `cursor`, wrapping.
    pub fn frame(&self, cursor: usize) -> &Frame {
        &self.frames[cursor % self.frames.len()]
    }
}

// ---------------------------------------------------------------------------
// Robot art
// ---------------------------------------------------------------------------

const ROBOT: [&str; 16] = [
    "000000000000000000000000000000000000000000",
    "000000000011111111111111111111110000000000",
    "000000001111111111111111111111111100000000",
    "000000011100000000000000000000001110000000",
    "000000011100111111000000111111001110000000",
    "000000011100111111000000111111001110000000",
    "000000011100111111000000111111001110000000",
    "000000011100000000000000000000001110000000",
    "000000011100000011111111110000001110000000",
    "000000011100000000000000000000001110000000",
    "000000001111111111111111111111111100000000",
    "000000000000001111111111111100000000000000",
    "000000000001111111111111111111100111100000",
    "000000000111111111111111111111111111100000",
    "000000000001111111111111111111100000110000",
    "000000000000000000000000000000000000000000",
];

const ROBOT_ARM_UP: [&str; 16] = [
    "000000000000000000000000000000000000000000",
    "000000000011111111111111111111110000111100",
    "000000001111111111111111111111111100111100",
    "000000011100000000000000000000001110011000",
    "000000011100111111000000111111001110011000",
    "000000011100111111000000111111001110011000",
    "000000011100111111000000111111001110011000",
    "000000011100000000000000000000001110011000",
    "000000011100000011111111110000001110011000",
    "000000011100000000000000000000001110011000",
    "000000001111111111111111111111111100011000",
    "000000000000001111111111111100000000011000",
    "000000000001111111111111111111100000000000",
    "000000000111111111111111111111111000000000",
    "000000000001111111111111111111100000000000",
    "000000000000000000000000000000000000000000",
];

struct EyeBox {
    top: usize,
    bottom: usize,
    left: usize,
    right: usize,
    lid_row: usize,
}

const EYES: [EyeBox; 2] = [
    EyeBox { top: 4, bottom: 6, left: 12, right: 17, lid_row: 5 },
    EyeBox { top: 4, bottom: 6, left: 24, right: 29, lid_row: 5 },
];

/// Close both eyes: clear the eye boxes and draw a lid line through them.
fn blink(base: &Frame) -> Frame {
    let mut frame = base.clone();
    let rows = frame.rows_mut();
    for eye in &EYES {
        for row in rows.iter_mut().take(eye.bottom + 1).skip(eye.top) {
            for cell in row.iter_mut().take(eye.right + 1).skip(eye.left) {
                *cell = '0';
            }
        }
        if let Some(row) = rows.get_mut(eye.lid_row) {
            for cell in row.iter_mut().take(eye.right + 2).skip(eye.left.saturating_sub(1)) {
                *cell = '1';
            }
        }
    }
    frame
}

/// Frames per idle loop; the last one blinks.
const IDLE_LOOP: usize = 10;

pub struct AssetLibrary {
    idle: AnimatedAsset,
    wave: AnimatedAsset,
    blink: AnimatedAsset,
}

static LIBRARY: LazyLock<AssetLibrary> = LazyLock::new(AssetLibrary::build);

impl AssetLibrary {
    pub fn get() -> &'static AssetLibrary {
        &LIBRARY
    }

    fn build() -> AssetLibrary {
        let base = Frame::from_rows(&ROBOT);
        let arm_up = Frame::from_rows(&ROBOT_ARM_UP);
        let closed = blink(&base);

        let mut idle = vec![base.clone(); IDLE_LOOP - 1];
        idle.push(closed.clone());

        AssetLibrary {
            idle: AnimatedAsset::new(idle),
            wave: AnimatedAsset::new(vec![base, arm_up]),
            blink: AnimatedAsset::new(vec![closed]),
        }
    }

    pub fn agent(&self, action: AgentAction) -> &AnimatedAsset {
        match action {
            AgentAction::Idle => &self.idle,
            AgentAction::Wave => &self.wave,
            AgentAction::Blink => &self.blink,
        }
    }

    /// Look up by name, defaulting to idle.
    pub fn agent_by_key(&self, key: &str) -> &AnimatedAsset {
        self.agent(AgentAction::from_key(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_keys_fall_back_to_idle() {
        let lib = AssetLibrary::get();
        assert_eq!(lib.agent_by_key("moonwalk"), lib.agent(AgentAction::Idle));
        assert_eq!(lib.agent_by_key(""), lib.agent(AgentAction::Idle));
        assert_eq!(lib.agent_by_key(" WAVE "), lib.agent(AgentAction::Wave));
    }

    #[test]
    fn every_asset_is_uniform() {
        let lib = AssetLibrary::get();
        for action in [AgentAction::Idle, AgentAction::Wave, AgentAction::Blink] {
            let asset = lib.agent(action);
            assert!(!asset.is_empty());
            let first = &asset.frames()[0];
            for frame in asset.frames() {
                assert!(frame.is_rectangular(), "{} has ragged rows", action.key());
                assert_eq!(
                    (frame.width(), frame.height()),
                    (first.width(), first.height())
                );
            }
        }
    }

    #[test]
    fn idle_loop_ends_with_a_blink() {
        let lib = AssetLibrary::get();
        let idle = lib.agent(AgentAction::Idle);
        assert_eq!(idle.len(), IDLE_LOOP);
        assert_eq!(idle.frame(IDLE_LOOP - 1), &lib.agent(AgentAction::Blink).frames()[0]);
        assert_ne!(idle.frame(0), idle.frame(IDLE_LOOP - 1));
    }

    #[test]
    fn blink_closes_eyes_to_a_line() {
        let base = Frame::from_rows(&ROBOT);
        let closed = blink(&base);
        assert_eq!(closed.get(4, 14), Some('0'));
        assert_eq!(closed.get(6, 26), Some('0'));
        assert_eq!(closed.get(5, 14), Some('1'));
        // Outline untouched.
        assert_eq!(closed.get(4, 8), Some('1'));
    }

    #[test]
    fn symbol_asset_from_art() {
        let asset = AnimatedAsset::symbol("01\n10").unwrap();
        assert_eq!(asset.len(), 1);
        assert_eq!(asset.frame(7).width(), 2);
        assert!(AnimatedAsset::symbol(" \n ").is_none());
    }

    #[test]
    fn scaled_symbol_keeps_frame_count() {
        let asset = AnimatedAsset::symbol("01\n10").unwrap().scaled(8);
        assert_eq!(asset.len(), 1);
        assert_eq!((asset.frame(0).width(), asset.frame(0).height()), (16, 16));
    }
}
