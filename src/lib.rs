pub mod assets;
pub mod clock;
pub mod config;
pub mod error;
pub mod glyph;
pub mod logging;
pub mod menubar;
pub mod playback;
pub mod player;
pub mod pointer;
pub mod renderer;
pub mod schedule;
pub mod speech;
pub mod storyboard;
pub mod surface;
pub mod types;
