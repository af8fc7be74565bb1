//! Error taxonomy.
//!
//! Only document-level problems are errors that stop playback. Speech
//! failures are reported but never abort the visual channel.

use std::io;

pub type StoryboardResult<T> = Result<T, StoryboardError>;

#[derive(thiserror::Error, Debug)]
pub enum StoryboardError {
    #[error("failed to read storyboard: {0}")]
    Io(#[from] io::Error),

    #[error("failed to parse storyboard: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid storyboard: missing `{0}`")]
    MissingField(&'static str),

    #[error("invalid storyboard: `scenes` must not be empty")]
    NoScenes,
}

#[derive(thiserror::Error, Debug)]
pub enum SpeechError {
    #[error("failed to start synthesizer `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to signal synthesizer: {0}")]
    Signal(#[source] io::Error),
}
