//! Storyboard documents: The authored script for one explanation.
//!
//! A document is produced by an external collaborator (usually a
//! generative model answering a question) and arrives as JSON. It is
//! decoded leniently field by field, then validated as a whole: a document
//! without narration or without scenes never reaches the playback engine.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::assets::AgentAction;
use crate::error::{StoryboardError, StoryboardResult};

// ---------------------------------------------------------------------------
// Public model
// ---------------------------------------------------------------------------

/// A point on the canvas in percent, `{0,0}` top-left to `{100,100}`
/// bottom-right. Art is centered on the point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const CENTER: Point = Point { x: 50.0, y: 50.0 };

    pub fn clamped(self) -> Point {
        let clamp = |v: f64| if v.is_finite() { v.clamp(0.0, 100.0) } else { 50.0 };
        Point {
            x: clamp(self.x),
            y: clamp(self.y),
        }
    }
}

impl Default for Point {
    fn default() -> Self {
        Point::CENTER
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceHint {
    pub language: String,
    /// Advisory only; no engine interprets it.
    pub style: String,
    pub rate: f64,
    pub pitch: f64,
}

impl Default for VoiceHint {
    fn default() -> Self {
        VoiceHint {
            language: "en".into(),
            style: "friendly".into(),
            rate: 1.0,
            pitch: 1.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scene {
    pub duration_ms: u64,
    pub agent_action: AgentAction,
    pub agent_position: Point,
    /// Newline-joined rows of `'0'`/`'1'`.
    pub symbol_art: Option<String>,
    pub symbol_position: Option<Point>,
    pub caption: Option<String>,
}

impl Scene {
    /// Where the symbol is drawn, if this scene shows one.
    pub fn symbol_anchor(&self) -> Option<Point> {
        self.symbol_art
            .as_ref()
            .map(|_| self.symbol_position.unwrap_or(Point::CENTER))
    }
}

/// A validated storyboard. Immutable once built; `scenes` is never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct StoryboardDocument {
    narration: String,
    voice_hint: VoiceHint,
    scenes: Vec<Scene>,
}

impl StoryboardDocument {
    pub fn new(
        narration: impl Into<String>,
        voice_hint: VoiceHint,
        scenes: Vec<Scene>,
    ) -> StoryboardResult<Self> {
        if scenes.is_empty() {
            return Err(StoryboardError::NoScenes);
        }
        Ok(StoryboardDocument {
            narration: narration.into(),
            voice_hint,
            scenes,
        })
    }

    /// Decode and validate a document from its JSON wire form.
    pub fn from_json(json: &str) -> StoryboardResult<Self> {
        let raw: RawDocument = serde_json::from_str(json)?;
        raw.validate()
    }

    /// The idle screen shown before any question has been answered.
    pub fn standby() -> Self {
        StoryboardDocument {
            narration: String::new(),
            voice_hint: VoiceHint::default(),
            scenes: vec![Scene {
                duration_ms: 9_999_999,
                ..Scene::default()
            }],
        }
    }

    pub fn narration(&self) -> &str {
        &self.narration
    }

    pub fn voice_hint(&self) -> &VoiceHint {
        &self.voice_hint
    }

    pub fn scenes(&self) -> &[Scene] {
        &self.scenes
    }

    pub fn total_duration_ms(&self) -> u64 {
        self.scenes.iter().map(|s| s.duration_ms).sum()
    }
}

// ---------------------------------------------------------------------------
// Collaborator boundary
// ---------------------------------------------------------------------------

/// Turns a question into a storyboard, or explains why it could not.
pub trait StoryboardSource {
    fn get_storyboard(&self, question: &str) -> StoryboardResult<StoryboardDocument>;
}

/// Serves a storyboard that was generated ahead of time and saved to disk.
/// The question is only logged.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFileSource { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StoryboardSource for JsonFileSource {
    fn get_storyboard(&self, question: &str) -> StoryboardResult<StoryboardDocument> {
        debug!(path = %self.path.display(), question, "loading storyboard");
        let json = fs::read_to_string(&self.path)?;
        StoryboardDocument::from_json(&json)
    }
}

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RawDocument {
    narration_ssml: Option<String>,
    voice_hint: Option<RawVoiceHint>,
    scenes: Option<Vec<RawScene>>,
}

#[derive(Debug, Default, Deserialize)]
struct RawVoiceHint {
    language: Option<String>,
    style: Option<String>,
    rate: Option<f64>,
    pitch: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawScene {
    duration_ms: Option<f64>,
    agent_action: Option<String>,
    agent_position: Option<Point>,
    symbol_art: Option<String>,
    symbol_position: Option<Point>,
    caption: Option<String>,
}

impl RawDocument {
    fn validate(self) -> StoryboardResult<StoryboardDocument> {
        let narration = self
            .narration_ssml
            .ok_or(StoryboardError::MissingField("narration_ssml"))?;
        let raw_scenes = self.scenes.ok_or(StoryboardError::MissingField("scenes"))?;
        let voice_hint = self.voice_hint.unwrap_or_default().resolve();

        let scenes = raw_scenes
            .into_iter()
            .enumerate()
            .map(|(i, s)| s.resolve(i))
            .collect();

        StoryboardDocument::new(narration, voice_hint, scenes)
    }
}

impl RawVoiceHint {
    fn resolve(self) -> VoiceHint {
        let defaults = VoiceHint::default();
        VoiceHint {
            language: self
                .language
                .filter(|l| !l.trim().is_empty())
                .unwrap_or(defaults.language),
            style: self.style.unwrap_or(defaults.style),
            rate: self
                .rate
                .filter(|r| r.is_finite() && *r > 0.0)
                .unwrap_or(defaults.rate),
            pitch: self
                .pitch
                .filter(|p| p.is_finite())
                .unwrap_or(defaults.pitch),
        }
    }
}

impl RawScene {
    fn resolve(self, index: usize) -> Scene {
        let duration_ms = match self.duration_ms {
            Some(d) if d.is_finite() && d >= 0.0 => d.round() as u64,
            other => {
                warn!(scene = index, duration = ?other, "scene duration missing or negative, using 0");
                0
            }
        };

        let agent_action = match self.agent_action.as_deref() {
            Some(key) => AgentAction::from_key(key),
            None => AgentAction::Idle,
        };

        let symbol_art = self.symbol_art.filter(|art| !art.trim().is_empty());

        Scene {
            duration_ms,
            agent_action,
            agent_position: self.agent_position.unwrap_or_default(),
            symbol_art,
            symbol_position: self.symbol_position,
            caption: self.caption.filter(|c| !c.trim().is_empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_SCENES: &str = r#"{
        "narration_ssml": "<speak>Hello there.</speak>",
        "voice_hint": { "language": "en", "style": "friendly", "rate": 0.98, "pitch": 0 },
        "scenes": [
            { "duration_ms": 1200, "agent_action": "wave", "agent_position": {"x": 50, "y": 50}, "caption": "Hello!" },
            { "duration_ms": 4000, "agent_action": "idle", "agent_position": {"x": 25, "y": 50},
              "symbol_art": "01\n10", "symbol_position": {"x": 65, "y": 50} }
        ]
    }"#;

    #[test]
    fn decodes_wire_format() {
        let doc = StoryboardDocument::from_json(TWO_SCENES).unwrap();
        assert_eq!(doc.narration(), "<speak>Hello there.</speak>");
        assert_eq!(doc.voice_hint().rate, 0.98);
        assert_eq!(doc.scenes().len(), 2);
        assert_eq!(doc.scenes()[0].agent_action, AgentAction::Wave);
        assert_eq!(doc.scenes()[0].caption.as_deref(), Some("Hello!"));
        assert_eq!(doc.scenes()[1].symbol_anchor(), Some(Point { x: 65.0, y: 50.0 }));
        assert_eq!(doc.total_duration_ms(), 5200);
    }

    #[test]
    fn missing_narration_is_rejected() {
        let err = StoryboardDocument::from_json(r#"{"scenes": [{"duration_ms": 1}]}"#).unwrap_err();
        assert!(matches!(err, StoryboardError::MissingField("narration_ssml")));
    }

    #[test]
    fn missing_scenes_is_rejected() {
        let err = StoryboardDocument::from_json(r#"{"narration_ssml": "hi"}"#).unwrap_err();
        assert!(matches!(err, StoryboardError::MissingField("scenes")));
    }

    #[test]
    fn empty_scenes_is_rejected() {
        let err =
            StoryboardDocument::from_json(r#"{"narration_ssml": "hi", "scenes": []}"#).unwrap_err();
        assert!(matches!(err, StoryboardError::NoScenes));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = StoryboardDocument::from_json("{ not json").unwrap_err();
        assert!(matches!(err, StoryboardError::Parse(_)));
    }

    #[test]
    fn lenient_scene_fields() {
        let doc = StoryboardDocument::from_json(
            r#"{"narration_ssml": "", "scenes": [
                {"duration_ms": -5, "agent_action": "moonwalk"},
                {"duration_ms": 250.4, "symbol_art": "11\n11", "symbol_art_extra": 1}
            ]}"#,
        )
        .unwrap();
        let s = doc.scenes();
        assert_eq!(s[0].duration_ms, 0);
        assert_eq!(s[0].agent_action, AgentAction::Idle);
        assert_eq!(s[0].agent_position, Point::CENTER);
        assert_eq!(s[1].duration_ms, 250);
        assert_eq!(s[1].symbol_anchor(), Some(Point::CENTER));
        assert_eq!(doc.voice_hint(), &VoiceHint::default());
    }

    #[test]
    fn blank_symbol_art_means_no_symbol() {
        let doc = StoryboardDocument::from_json(
            r#"{"narration_ssml": "x", "scenes": [{"duration_ms": 10, "symbol_art": "  "}]}"#,
        )
        .unwrap();
        assert_eq!(doc.scenes()[0].symbol_anchor(), None);
    }

    #[test]
    fn bad_rate_falls_back() {
        let doc = StoryboardDocument::from_json(
            r#"{"narration_ssml": "x", "voice_hint": {"language": "", "rate": 0}, "scenes": [{"duration_ms": 10}]}"#,
        )
        .unwrap();
        assert_eq!(doc.voice_hint().rate, 1.0);
        assert_eq!(doc.voice_hint().language, "en");
    }

    #[test]
    fn point_clamps_into_canvas() {
        let p = Point { x: -4.0, y: 180.0 }.clamped();
        assert_eq!(p, Point { x: 0.0, y: 100.0 });
        assert_eq!(Point { x: f64::NAN, y: 3.0 }.clamped().x, 50.0);
    }

    #[test]
    fn standby_is_a_single_idle_scene() {
        let doc = StoryboardDocument::standby();
        assert_eq!(doc.scenes().len(), 1);
        assert!(doc.narration().is_empty());
    }
}
