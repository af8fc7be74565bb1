//! Player: The terminal host for a playback session.
//!
//! Owns the terminal: raw mode, the alternate screen and mouse capture. It
//! feeds the session wall-clock time, key presses and pointer moves, and
//! repaints only the cells that changed. The player makes no playback
//! decisions of its own.

use std::io::{self, Write};
use std::time::{Duration, Instant};

use anyhow::{Result, bail};
use crossterm::event::{self, Event, KeyEvent, KeyEventKind, MouseEventKind};
use crossterm::{cursor, execute, queue, style, terminal};
use tracing::{info, warn};

use crate::config::{PlayerConfig, matches_binding};
use crate::menubar::{player_items, print_menubar};
use crate::playback::{FrameView, Playback};
use crate::renderer::{Grid, Renderer};
use crate::schedule::Millis;
use crate::speech::SpeechEngine;
use crate::storyboard::{StoryboardDocument, StoryboardSource};
use crate::surface::{CellMetrics, Surface};
use crate::types::{CellChange, Color, NamedColor, Style};

/// Rows reserved above the canvas for the menu bar.
const CANVAS_OFFSET: u16 = 1;
/// Rows taken by the menu bar and the status bar.
const CHROME_ROWS: u16 = 2;

pub struct Player {
    playback: Playback,
    source: Option<Box<dyn StoryboardSource>>,
    question: String,
    config: PlayerConfig,
    epoch: Instant,
    surface: Surface,
    grid: Grid,
    notice: Option<String>,
    fullscreen: bool,
}

impl Player {
    /// Start a session for `document`. With a `source`, the reload key asks
    /// it for a fresh storyboard for `question`.
    pub fn new(
        document: StoryboardDocument,
        engine: Box<dyn SpeechEngine>,
        source: Option<Box<dyn StoryboardSource>>,
        question: impl Into<String>,
        config: PlayerConfig,
    ) -> Self {
        let playback = Playback::new(document, engine, config.playback_options(), 0);
        Self {
            playback,
            source,
            question: question.into(),
            surface: Surface::new(0, CANVAS_OFFSET, 0, 0, config.cell_metrics),
            config,
            epoch: Instant::now(),
            grid: Vec::new(),
            notice: None,
            fullscreen: false,
        }
    }

    /// Play in the terminal until the user quits.
    ///
    /// Sets up the terminal, enters the event loop, and restores the terminal
    /// on exit (even on error).
    pub fn play(&mut self) -> Result<()> {
        let (term_w, term_h) = terminal::size()?;
        if term_w == 0 || term_h <= CHROME_ROWS {
            bail!(
                "Terminal too small: need at least 1x{}, have {}x{}",
                CHROME_ROWS + 1,
                term_w,
                term_h,
            );
        }

        let mut stdout = io::stdout();
        terminal::enable_raw_mode()?;
        execute!(
            stdout,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            event::EnableMouseCapture,
            event::EnableFocusChange,
            terminal::Clear(terminal::ClearType::All),
        )?;

        let result = self.run_loop(&mut stdout);

        self.playback.close();

        // Always restore terminal state.
        let _ = execute!(
            stdout,
            event::DisableFocusChange,
            event::DisableMouseCapture,
            cursor::Show,
            terminal::LeaveAlternateScreen
        );
        let _ = terminal::disable_raw_mode();

        result
    }

    fn now(&self) -> Millis {
        Millis::try_from(self.epoch.elapsed().as_millis()).unwrap_or(Millis::MAX)
    }

    // -----------------------------------------------------------------------
    // Event loop
    // -----------------------------------------------------------------------

    fn run_loop(&mut self, stdout: &mut io::Stdout) -> Result<()> {
        self.measure()?;
        self.render_menubar(stdout)?;
        self.repaint(stdout, true)?;

        let frame = Duration::from_millis(self.config.frame_interval_ms.max(1));
        loop {
            let now = self.now();
            let mut dirty = self.playback.tick(now).redraw;
            let mut full = false;

            if event::poll(frame)? {
                match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => {
                        match self.handle_key(&key, stdout)? {
                            KeyOutcome::Quit => break,
                            KeyOutcome::Redraw => dirty = true,
                            KeyOutcome::Nothing => {}
                        }
                    }
                    Event::Mouse(mouse) => {
                        if matches!(mouse.kind, MouseEventKind::Moved | MouseEventKind::Drag(_)) {
                            dirty |= self.playback.pointer_moved(
                                &self.surface,
                                mouse.column,
                                mouse.row,
                            );
                        }
                    }
                    Event::FocusLost => dirty |= self.playback.pointer_left(),
                    Event::Resize(_, _) => {
                        self.measure()?;
                        self.playback.pointer_left();
                        execute!(stdout, terminal::Clear(terminal::ClearType::All))?;
                        self.render_menubar(stdout)?;
                        dirty = true;
                        full = true;
                    }
                    _ => {}
                }
            }

            if dirty {
                self.repaint(stdout, full)?;
            }
        }

        Ok(())
    }

    fn handle_key(&mut self, key: &KeyEvent, stdout: &mut io::Stdout) -> Result<KeyOutcome> {
        let bindings = self.config.key_bindings.clone();
        if matches_binding(&bindings.quit, key) || matches_binding(&bindings.quit_alt, key) {
            return Ok(KeyOutcome::Quit);
        }
        if matches_binding(&bindings.pause, key) {
            let now = self.now();
            let paused = self.playback.toggle_pause(now);
            info!(paused, "pause toggled");
            return Ok(KeyOutcome::Redraw);
        }
        if matches_binding(&bindings.reload, key) {
            self.reload();
            return Ok(KeyOutcome::Redraw);
        }
        if matches_binding(&bindings.fullscreen, key) {
            self.fullscreen = !self.fullscreen;
            if self.fullscreen {
                stdout.write_all(b"\x1b[10;1t")?;
            } else {
                stdout.write_all(b"\x1b[10;0t")?;
            }
            stdout.flush()?;
        }
        Ok(KeyOutcome::Nothing)
    }

    /// Ask the source for a new storyboard and restart with it. A failed
    /// fetch leaves the current session playing.
    fn reload(&mut self) {
        let Some(source) = &self.source else {
            self.notice = Some("nothing to reload".into());
            return;
        };
        match source.get_storyboard(&self.question) {
            Ok(document) => {
                let now = self.now();
                self.playback.load(document, now);
                self.notice = None;
            }
            Err(e) => {
                warn!(error = %e, "reload failed");
                self.notice = Some(format!("reload failed: {e}"));
            }
        }
    }

    /// Re-read the terminal size and cell metrics. Called once per layout.
    fn measure(&mut self) -> Result<()> {
        let (cols, rows) = terminal::size()?;
        let metrics = match terminal::window_size() {
            Ok(size) => CellMetrics::from_window(
                size.columns,
                size.rows,
                size.width,
                size.height,
                self.config.cell_metrics,
            ),
            Err(_) => self.config.cell_metrics,
        };
        self.surface = Surface::new(0, CANVAS_OFFSET, cols, rows.saturating_sub(CHROME_ROWS), metrics);
        self.grid.clear();
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Terminal output
    // -----------------------------------------------------------------------

    fn repaint(&mut self, stdout: &mut io::Stdout, full: bool) -> Result<()> {
        let view = self.playback.view(&self.surface);
        let grid = Renderer::render(&view, &self.surface);
        if full || self.grid.len() != grid.len() {
            self.render_full(stdout, &grid)?;
        } else {
            self.render_changes(stdout, &Renderer::diff(&self.grid, &grid))?;
        }
        self.grid = grid;
        self.render_status(stdout, &view)?;
        stdout.flush()?;
        Ok(())
    }

    fn render_menubar(&self, stdout: &mut io::Stdout) -> Result<()> {
        print_menubar(stdout, 0, &player_items(&self.config.key_bindings))?;
        stdout.flush()?;
        Ok(())
    }

    fn render_full(&self, stdout: &mut io::Stdout, grid: &Grid) -> Result<()> {
        for (y, row) in grid.iter().enumerate() {
            queue!(stdout, cursor::MoveTo(self.surface.left, y as u16 + self.surface.top))?;
            for cell in row {
                let cs = to_content_style(&cell.style);
                queue!(
                    stdout,
                    style::PrintStyledContent(style::StyledContent::new(cs, cell.ch))
                )?;
            }
        }
        Ok(())
    }

    fn render_changes(&self, stdout: &mut io::Stdout, changes: &[CellChange]) -> Result<()> {
        for change in changes {
            let cs = to_content_style(&change.cell.style);
            queue!(
                stdout,
                cursor::MoveTo(change.x + self.surface.left, change.y + self.surface.top),
                style::PrintStyledContent(style::StyledContent::new(cs, change.cell.ch)),
            )?;
        }
        Ok(())
    }

    fn render_status(&self, stdout: &mut io::Stdout, view: &FrameView) -> Result<()> {
        let status_y = self.surface.top + self.surface.rows;
        let mut status = status_line(view, self.playback.is_finished());
        if let Some(notice) = &self.notice {
            status.push_str(&format!("| {notice} "));
        }

        let mut cs = style::ContentStyle::default();
        cs.attributes.set(style::Attribute::Dim);

        queue!(
            stdout,
            cursor::MoveTo(0, status_y),
            terminal::Clear(terminal::ClearType::CurrentLine),
            style::PrintStyledContent(style::StyledContent::new(cs, status)),
        )?;
        Ok(())
    }
}

enum KeyOutcome {
    Quit,
    Redraw,
    Nothing,
}

fn status_line(view: &FrameView, finished: bool) -> String {
    let state = if view.paused {
        "paused"
    } else if finished {
        "ended"
    } else {
        "playing"
    };
    format!(
        " Scene {}/{} | {} | speech: {} ",
        view.scene_index + 1,
        view.scene_count,
        state,
        view.speech.label(),
    )
}

// ---------------------------------------------------------------------------
// Style conversion
// ---------------------------------------------------------------------------

pub fn to_content_style(s: &Style) -> style::ContentStyle {
    let mut cs = style::ContentStyle::default();
    if let Some(fg) = &s.fg {
        cs.foreground_color = Some(to_ct_color(fg));
    }
    if let Some(bg) = &s.bg {
        cs.background_color = Some(to_ct_color(bg));
    }
    if s.bold {
        cs.attributes.set(style::Attribute::Bold);
    }
    if s.dim {
        cs.attributes.set(style::Attribute::Dim);
    }
    cs
}

pub fn to_ct_color(c: &Color) -> style::Color {
    match c {
        Color::Named(n) => match n {
            NamedColor::Black => style::Color::Black,
            NamedColor::Red => style::Color::Red,
            NamedColor::Green => style::Color::Green,
            NamedColor::Yellow => style::Color::Yellow,
            NamedColor::Blue => style::Color::Blue,
            NamedColor::Magenta => style::Color::Magenta,
            NamedColor::Cyan => style::Color::Cyan,
            NamedColor::White => style::Color::White,
        },
        Color::Rgb { r, g, b } => style::Color::Rgb {
            r: *r,
            g: *g,
            b: *b,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::speech::SpeechStatus;

    fn view(paused: bool) -> FrameView {
        FrameView {
            agent: Vec::new(),
            symbol: Vec::new(),
            caption: None,
            scene_index: 1,
            scene_count: 3,
            paused,
            speech: SpeechStatus::Speaking,
        }
    }

    #[test]
    fn status_line_reports_position_and_state() {
        assert_eq!(status_line(&view(false), false), " Scene 2/3 | playing | speech: speaking ");
        assert_eq!(status_line(&view(true), true), " Scene 2/3 | paused | speech: speaking ");
        assert_eq!(status_line(&view(false), true), " Scene 2/3 | ended | speech: speaking ");
    }

    #[test]
    fn styles_convert_to_crossterm() {
        let cs = to_content_style(&Style {
            fg: Some(Color::Rgb { r: 1, g: 2, b: 3 }),
            bold: true,
            ..Style::default()
        });
        assert_eq!(cs.foreground_color, Some(style::Color::Rgb { r: 1, g: 2, b: 3 }));
        assert!(cs.attributes.has(style::Attribute::Bold));
        assert!(!cs.attributes.has(style::Attribute::Dim));
    }
}
