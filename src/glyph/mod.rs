//! Glyph renderer: Binary art as a grid of styled cells.
//!
//! A `Frame` is one bitmap of `'0'`/`'1'` characters. Rendering places the
//! frame on the surface, and for every cell near the pointer computes a
//! radial push and a highlight whose strength falls off with distance.
//! The result is a flat list of `GlyphCell`s; rasterizing them onto the
//! terminal grid is the renderer's job.

mod cycle;

pub use cycle::FrameCycler;

use std::ops::Range;

use crate::schedule::Millis;
use crate::storyboard::Point;
use crate::surface::{Surface, SurfacePoint};
use crate::types::{Color, NamedColor, Style};

/// Symbols are authored small (16×16) and blown up by this factor.
pub const SYMBOL_SCALE: usize = 8;
/// Largest factor `scale_frame` applies.
pub const MAX_SYMBOL_SCALE: usize = 32;
/// Pointer distance in pixels beyond which cells are unaffected.
pub const INTERACTION_RADIUS: f64 = 80.0;
/// Push applied to a cell directly under the pointer, in pixels.
pub const MAX_DISPLACEMENT: f64 = 6.0;
/// Frame period for multi-frame assets.
pub const FRAME_INTERVAL_MS: Millis = 200;

const DIM_ZERO: Color = Color::Rgb { r: 55, g: 65, b: 81 };
const GLOW: (u8, u8, u8) = (6, 182, 212);

// ---------------------------------------------------------------------------
// Frames
// ---------------------------------------------------------------------------

/// One bitmap. Rows may be ragged when the art came from outside; nothing
/// here assumes a rectangle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    rows: Vec<Vec<char>>,
}

impl Frame {
    /// Parse newline-joined art. Surrounding blank lines are dropped.
    pub fn parse(art: &str) -> Frame {
        let rows = art
            .trim()
            .lines()
            .map(|line| line.trim_end_matches('\r').chars().collect())
            .collect();
        Frame { rows }
    }

    pub fn from_rows(rows: &[&str]) -> Frame {
        Frame {
            rows: rows.iter().map(|r| r.chars().collect()).collect(),
        }
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Width of the widest row.
    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.iter().all(Vec::is_empty)
    }

    /// True when every row has the same length.
    pub fn is_rectangular(&self) -> bool {
        self.rows.windows(2).all(|w| w[0].len() == w[1].len())
    }

    pub fn get(&self, row: usize, col: usize) -> Option<char> {
        self.rows.get(row)?.get(col).copied()
    }

    pub fn rows(&self) -> impl Iterator<Item = &[char]> {
        self.rows.iter().map(Vec::as_slice)
    }

    pub(crate) fn rows_mut(&mut self) -> &mut [Vec<char>] {
        &mut self.rows
    }
}

/// Expand every character into a `factor × factor` block. The factor is
/// clamped to `1..=MAX_SYMBOL_SCALE`.
pub fn scale_frame(frame: &Frame, factor: usize) -> Frame {
    let factor = factor.clamp(1, MAX_SYMBOL_SCALE);
    let mut rows = Vec::with_capacity(frame.height() * factor);
    for row in frame.rows() {
        let expanded: Vec<char> = row
            .iter()
            .flat_map(|&ch| std::iter::repeat_n(ch, factor))
            .collect();
        for _ in 0..factor {
            rows.push(expanded.clone());
        }
    }
    Frame { rows }
}

// ---------------------------------------------------------------------------
// Proximity
// ---------------------------------------------------------------------------

/// Effect applied to a cell within the interaction radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Proximity {
    /// 1 under the pointer, approaching 0 at the radius.
    pub falloff: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl Proximity {
    pub fn displacement(&self) -> f64 {
        self.offset_x.hypot(self.offset_y)
    }

    /// Grey level for a brightened `'0'`.
    pub fn brightness(&self) -> u8 {
        (128.0 + 100.0 * self.falloff).floor() as u8
    }

    /// Glow radius in pixels for a `'1'`.
    pub fn glow(&self) -> f64 {
        2.0 + 10.0 * self.falloff
    }
}

/// Effect of `pointer` on a cell centered at `center`, or `None` when the
/// pointer is at or beyond the interaction radius.
pub fn proximity(center: SurfacePoint, pointer: SurfacePoint) -> Option<Proximity> {
    let dx = center.x - pointer.x;
    let dy = center.y - pointer.y;
    let distance = dx.hypot(dy);
    if distance.is_nan() || distance >= INTERACTION_RADIUS {
        return None;
    }
    let falloff = 1.0 - distance / INTERACTION_RADIUS;
    let displacement = falloff.powf(1.5) * MAX_DISPLACEMENT;
    let angle = dy.atan2(dx);
    Some(Proximity {
        falloff,
        offset_x: angle.cos() * displacement,
        offset_y: angle.sin() * displacement,
    })
}

// ---------------------------------------------------------------------------
// Layout and rendering
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlyphKind {
    Zero,
    One,
}

impl GlyphKind {
    pub fn of(ch: char) -> GlyphKind {
        if ch == '0' { GlyphKind::Zero } else { GlyphKind::One }
    }
}

/// Top-left cell of a frame on the canvas, snapped to the cell grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlyphLayout {
    pub origin_col: i32,
    pub origin_row: i32,
}

impl GlyphLayout {
    /// Center a `width × height` frame on `anchor`.
    pub fn centered(surface: &Surface, anchor: Point, width: usize, height: usize) -> GlyphLayout {
        let (cx, cy) = surface.percent_to_cell(anchor);
        GlyphLayout {
            origin_col: (cx - width as f64 / 2.0).round() as i32,
            origin_row: (cy - height as f64 / 2.0).round() as i32,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GlyphCell {
    /// Canvas-relative column; may be negative or past the edge.
    pub col: i32,
    pub row: i32,
    pub ch: char,
    pub kind: GlyphKind,
    pub effect: Option<Proximity>,
}

impl GlyphCell {
    pub fn style(&self) -> Style {
        match (self.kind, self.effect) {
            (GlyphKind::Zero, None) => Style {
                fg: Some(DIM_ZERO),
                ..Style::default()
            },
            (GlyphKind::Zero, Some(p)) => {
                let v = p.brightness();
                Style {
                    fg: Some(Color::Rgb { r: v, g: v, b: v }),
                    ..Style::default()
                }
            }
            (GlyphKind::One, None) => Style {
                fg: Some(Color::Named(NamedColor::White)),
                bold: true,
                ..Style::default()
            },
            (GlyphKind::One, Some(p)) => {
                // Map the glow radius back onto 0..1 and tint toward cyan.
                let t = ((p.glow() - 2.0) / 10.0).clamp(0.0, 1.0);
                let mix = |from: u8, to: u8| {
                    (f64::from(from) + (f64::from(to) - f64::from(from)) * t).round() as u8
                };
                Style {
                    fg: Some(Color::Rgb {
                        r: mix(255, GLOW.0),
                        g: mix(255, GLOW.1),
                        b: mix(255, GLOW.2),
                    }),
                    bold: true,
                    ..Style::default()
                }
            }
        }
    }
}

/// Produce the styled cells of `frame` at `layout`. Spaces are transparent.
///
/// Only cells inside the pointer's bounding band are measured; everything
/// else takes the flat style without computing a distance.
pub fn render(
    frame: &Frame,
    layout: GlyphLayout,
    surface: &Surface,
    pointer: Option<SurfacePoint>,
) -> Vec<GlyphCell> {
    let bands = pointer.map(|p| {
        (
            band(p.y, layout.origin_row, surface.metrics.height),
            band(p.x, layout.origin_col, surface.metrics.width),
            p,
        )
    });

    let mut cells = Vec::with_capacity(frame.height() * frame.width());
    for (r, row) in frame.rows().enumerate() {
        let abs_row = layout.origin_row + r as i32;
        let row_band = bands
            .as_ref()
            .filter(|(rows, _, _)| rows.contains(&(r as i64)));
        for (c, &ch) in row.iter().enumerate() {
            if ch == ' ' {
                continue;
            }
            let abs_col = layout.origin_col + c as i32;
            let effect = row_band
                .filter(|(_, cols, _)| cols.contains(&(c as i64)))
                .and_then(|(_, _, p)| proximity(surface.cell_center(abs_col, abs_row), *p));
            cells.push(GlyphCell {
                col: abs_col,
                row: abs_row,
                ch,
                kind: GlyphKind::of(ch),
                effect,
            });
        }
    }
    cells
}

/// Frame-relative indices whose cell centers can lie within the radius of
/// `pointer` along one axis. Conservative by one cell on each side.
fn band(pointer: f64, origin: i32, cell: f64) -> Range<i64> {
    // Float-to-int casts saturate, so a degenerate cell size still yields
    // a finite range.
    let lo = (((pointer - INTERACTION_RADIUS) / cell - 0.5).floor() as i64)
        .saturating_sub(i64::from(origin));
    let hi = (((pointer + INTERACTION_RADIUS) / cell - 0.5).ceil() as i64)
        .saturating_sub(i64::from(origin));
    lo..hi.saturating_add(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::CellMetrics;

    fn surface() -> Surface {
        Surface::new(0, 0, 80, 24, CellMetrics::default())
    }

    #[test]
    fn parse_trims_and_keeps_ragged_rows() {
        let f = Frame::parse("\n0101\n011\r\n1\n");
        assert_eq!(f.height(), 3);
        assert_eq!(f.width(), 4);
        assert!(!f.is_rectangular());
        assert_eq!(f.get(1, 2), Some('1'));
        assert_eq!(f.get(2, 1), None);
    }

    #[test]
    fn scale_expands_blocks() {
        let f = Frame::from_rows(&["01", "10"]);
        let s = scale_frame(&f, 2);
        let rows: Vec<String> = s.rows().map(|r| r.iter().collect()).collect();
        assert_eq!(rows, vec!["0011", "0011", "1100", "1100"]);
    }

    #[test]
    fn scale_of_ragged_frame_stays_ragged() {
        let f = Frame::from_rows(&["011", "1"]);
        let s = scale_frame(&f, 3);
        assert_eq!(s.height(), 6);
        assert_eq!(s.rows().nth(0).map(<[char]>::len), Some(9));
        assert_eq!(s.rows().nth(5).map(<[char]>::len), Some(3));
    }

    #[test]
    fn no_effect_at_or_beyond_radius() {
        let c = SurfacePoint { x: 0.0, y: 0.0 };
        assert!(proximity(c, SurfacePoint { x: INTERACTION_RADIUS, y: 0.0 }).is_none());
        assert!(proximity(c, SurfacePoint { x: 100.0, y: 100.0 }).is_none());
        assert!(proximity(c, SurfacePoint { x: 79.0, y: 0.0 }).is_some());
    }

    #[test]
    fn effect_pushes_away_from_pointer() {
        let p = proximity(SurfacePoint { x: 10.0, y: 0.0 }, SurfacePoint { x: 0.0, y: 0.0 })
            .unwrap();
        assert!(p.offset_x > 0.0);
        assert!(p.offset_y.abs() < 1e-9);
        let p = proximity(SurfacePoint { x: 0.0, y: -10.0 }, SurfacePoint { x: 0.0, y: 0.0 })
            .unwrap();
        assert!(p.offset_y < 0.0);
    }

    #[test]
    fn under_pointer_is_maximal() {
        let c = SurfacePoint { x: 5.0, y: 5.0 };
        let p = proximity(c, c).unwrap();
        assert_eq!(p.falloff, 1.0);
        assert!((p.displacement() - MAX_DISPLACEMENT).abs() < 1e-9);
        assert_eq!(p.brightness(), 228);
        assert_eq!(p.glow(), 12.0);
    }

    #[test]
    fn layout_centers_on_anchor() {
        let l = GlyphLayout::centered(&surface(), Point::CENTER, 10, 4);
        assert_eq!(l, GlyphLayout { origin_col: 35, origin_row: 10 });
        let l = GlyphLayout::centered(&surface(), Point { x: 0.0, y: 0.0 }, 10, 4);
        assert_eq!(l, GlyphLayout { origin_col: -5, origin_row: -2 });
    }

    #[test]
    fn render_without_pointer_is_flat() {
        let f = Frame::from_rows(&["0 1"]);
        let cells = render(&f, GlyphLayout { origin_col: 3, origin_row: 2 }, &surface(), None);
        assert_eq!(cells.len(), 2);
        assert_eq!((cells[0].col, cells[0].row, cells[0].kind), (3, 2, GlyphKind::Zero));
        assert_eq!((cells[1].col, cells[1].kind), (5, GlyphKind::One));
        assert!(cells.iter().all(|c| c.effect.is_none()));
        assert_eq!(cells[0].style().fg, Some(DIM_ZERO));
        assert!(cells[1].style().bold);
    }

    #[test]
    fn render_affects_only_nearby_cells() {
        let row = "1".repeat(40);
        let f = Frame::from_rows(&[row.as_str()]);
        let layout = GlyphLayout { origin_col: 0, origin_row: 0 };
        // Pointer over the center of cell 0.
        let pointer = SurfacePoint { x: 4.0, y: 8.0 };
        let cells = render(&f, layout, &surface(), Some(pointer));
        // Centers at 4 + 8k px; within 80 px for k < 10.
        let affected: Vec<i32> =
            cells.iter().filter(|c| c.effect.is_some()).map(|c| c.col).collect();
        assert_eq!(affected, (0..10).collect::<Vec<_>>());
        assert_eq!(cells[0].effect.unwrap().falloff, 1.0);
    }

    #[test]
    fn band_matches_exact_check() {
        let s = surface();
        let row = "0".repeat(30);
        let f = Frame::from_rows(&vec![row.as_str(); 20]);
        let layout = GlyphLayout { origin_col: -3, origin_row: 2 };
        let pointer = SurfacePoint { x: 61.0, y: 97.0 };
        for cell in render(&f, layout, &s, Some(pointer)) {
            let exact = proximity(s.cell_center(cell.col, cell.row), pointer);
            assert_eq!(cell.effect, exact, "cell {},{}", cell.col, cell.row);
        }
    }

    #[test]
    fn scale_is_capped() {
        let f = Frame::from_rows(&["1"]);
        assert_eq!(scale_frame(&f, usize::MAX).height(), MAX_SYMBOL_SCALE);
        assert_eq!(scale_frame(&f, 0).height(), 1);
    }

    #[test]
    fn degenerate_cell_size_does_not_panic() {
        let mut s = surface();
        s.metrics = CellMetrics { width: 0.0, height: 0.0 };
        let f = Frame::from_rows(&["0101", "1010"]);
        let layout = GlyphLayout { origin_col: 38, origin_row: 11 };
        let pointer = SurfacePoint { x: 0.0, y: 0.0 };
        assert_eq!(render(&f, layout, &s, Some(pointer)).len(), 8);
        let r = band(80.0, i32::MAX, 0.0);
        assert!(r.start <= r.end);
    }

    #[test]
    fn glow_tints_toward_cyan() {
        let cell = GlyphCell {
            col: 0,
            row: 0,
            ch: '1',
            kind: GlyphKind::One,
            effect: Some(Proximity { falloff: 1.0, offset_x: 0.0, offset_y: 0.0 }),
        };
        assert_eq!(cell.style().fg, Some(Color::Rgb { r: 6, g: 182, b: 212 }));
    }
}
