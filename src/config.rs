use std::path::PathBuf;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::glyph::{MAX_SYMBOL_SCALE, SYMBOL_SCALE};
use crate::playback::PlaybackOptions;
use crate::surface::CellMetrics;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub key_bindings: KeyBindings,
    /// Host frame loop period.
    pub frame_interval_ms: u64,
    /// Blow-up factor for storyboard symbol art.
    pub symbol_scale: usize,
    /// Cell size to assume when the terminal does not report pixels.
    pub cell_metrics: CellMetrics,
    pub speech: SpeechConfig,
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyBindings {
    pub pause: String,
    pub reload: String,
    pub quit: String,
    pub quit_alt: String,
    pub fullscreen: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    pub enabled: bool,
    /// Synthesizer program, invoked with espeak-style arguments.
    pub command: String,
    pub voice_wait_ms: u64,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        PlayerConfig {
            key_bindings: KeyBindings::default(),
            frame_interval_ms: 16,
            symbol_scale: SYMBOL_SCALE,
            cell_metrics: CellMetrics::default(),
            speech: SpeechConfig::default(),
            log_file: None,
        }
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        KeyBindings {
            pause: "Space".into(),
            reload: "r".into(),
            quit: "q".into(),
            quit_alt: "Esc".into(),
            fullscreen: "F11".into(),
        }
    }
}

impl Default for SpeechConfig {
    fn default() -> Self {
        SpeechConfig {
            enabled: true,
            command: "espeak-ng".into(),
            voice_wait_ms: 2_000,
        }
    }
}

/// A config together with anything wrong with the file it came from.
/// Problems are held back until `report`, so they reach the log once the
/// subscriber is installed.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedConfig {
    pub config: PlayerConfig,
    pub problems: Vec<String>,
}

impl LoadedConfig {
    pub fn report(&self) {
        for problem in &self.problems {
            warn!(%problem, "invalid player config");
        }
    }
}

impl PlayerConfig {
    pub fn load() -> LoadedConfig {
        let config_path = Self::config_path();
        match std::fs::read_to_string(&config_path) {
            Ok(json) => Self::parse(&json),
            Err(_) => LoadedConfig {
                config: Self::default(),
                problems: Vec::new(),
            },
        }
    }

    /// Parse a config file. An unreadable file yields the defaults; values
    /// that cannot work are replaced field by field.
    pub fn parse(json: &str) -> LoadedConfig {
        let mut problems = Vec::new();
        let mut config: PlayerConfig = match serde_json::from_str(json) {
            Ok(config) => config,
            Err(e) => {
                problems.push(format!("{e}, using defaults"));
                Self::default()
            }
        };

        if !config.cell_metrics.is_valid() {
            problems.push(format!(
                "cell_metrics {}x{} must be positive, using defaults",
                config.cell_metrics.width, config.cell_metrics.height
            ));
            config.cell_metrics = CellMetrics::default();
        }
        let scale = config.symbol_scale.clamp(1, MAX_SYMBOL_SCALE);
        if scale != config.symbol_scale {
            problems.push(format!(
                "symbol_scale {} outside 1..={MAX_SYMBOL_SCALE}, using {scale}",
                config.symbol_scale
            ));
            config.symbol_scale = scale;
        }

        LoadedConfig { config, problems }
    }

    /// Parse a config file and log whatever had to be replaced.
    pub fn from_json(json: &str) -> Self {
        let loaded = Self::parse(json);
        loaded.report();
        loaded.config
    }

    pub fn playback_options(&self) -> PlaybackOptions {
        PlaybackOptions {
            symbol_scale: self.symbol_scale.clamp(1, MAX_SYMBOL_SCALE),
            voice_wait_ms: self.speech.voice_wait_ms,
            ..PlaybackOptions::default()
        }
    }

    fn config_path() -> PathBuf {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
        let mut path = PathBuf::from(home);
        path.push(".config");
        path.push("binary-explainer");
        path.push("player.json");
        path
    }
}

/// Check whether a crossterm `KeyEvent` matches a binding string from config.
pub fn matches_binding(binding: &str, event: &KeyEvent) -> bool {
    if let Some(rest) = binding.strip_prefix("Alt-") {
        return event.modifiers.contains(KeyModifiers::ALT) && matches_key(rest, event.code);
    }
    if let Some(rest) = binding.strip_prefix("Ctrl-") {
        return event.modifiers.contains(KeyModifiers::CONTROL) && matches_key(rest, event.code);
    }

    // Plain bindings like "r" must not fire on Ctrl-r or Alt-r.
    if event.modifiers.contains(KeyModifiers::CONTROL)
        || event.modifiers.contains(KeyModifiers::ALT)
    {
        return false;
    }
    matches_key(binding, event.code)
}

fn matches_key(name: &str, code: KeyCode) -> bool {
    match name {
        "Enter" => code == KeyCode::Enter,
        "Esc" => code == KeyCode::Esc,
        "Space" => code == KeyCode::Char(' '),
        "Tab" => code == KeyCode::Tab,
        "Backspace" => code == KeyCode::Backspace,
        s => {
            if let Some(n) = s.strip_prefix('F').and_then(|rest| rest.parse::<u8>().ok()) {
                return code == KeyCode::F(n);
            }
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => code == KeyCode::Char(c),
                _ => false,
            }
        }
    }
}
