//! Renderer: The deterministic rasterizer.
//!
//! Takes a `FrameView` (from the playback session) and produces a fixed-size
//! grid of cells for the canvas. The player diffs consecutive grids and
//! only repaints what changed.
//!
//! The renderer is pure and stateless. Given the same view and surface, it
//! always produces the same grid. It knows nothing about time or speech.

use crate::glyph::GlyphCell;
use crate::playback::FrameView;
use crate::surface::Surface;
use crate::types::{Cell, CellChange, Color, DrawOp, NamedColor, Style};

const Z_SYMBOL: i32 = 0;
const Z_AGENT: i32 = 1;
const Z_CAPTION: i32 = 2;

pub type Grid = Vec<Vec<Cell>>;

pub struct Renderer;

impl Renderer {
    /// Lay out a view as draw operations and rasterize them onto a grid the
    /// size of `surface`.
    pub fn render(view: &FrameView, surface: &Surface) -> Grid {
        let mut ops = Vec::with_capacity(view.symbol.len() + view.agent.len());
        ops.extend(Self::glyph_ops(&view.symbol, surface, Z_SYMBOL));
        ops.extend(Self::glyph_ops(&view.agent, surface, Z_AGENT));
        if let Some(caption) = &view.caption {
            ops.extend(Self::caption_ops(caption, surface));
        }
        Self::rasterize(&ops, surface.cols, surface.rows)
    }

    /// Glyph cells become draw ops, shifted by their push rounded to whole
    /// cells. Cells pushed off the canvas are dropped.
    fn glyph_ops<'a>(
        cells: &'a [GlyphCell],
        surface: &'a Surface,
        z_order: i32,
    ) -> impl Iterator<Item = DrawOp> + 'a {
        cells.iter().filter_map(move |cell| {
            let (dx, dy) = match cell.effect {
                Some(p) => (
                    (p.offset_x / surface.metrics.width).round() as i32,
                    (p.offset_y / surface.metrics.height).round() as i32,
                ),
                None => (0, 0),
            };
            let x = u16::try_from(cell.col.checked_add(dx)?).ok()?;
            let y = u16::try_from(cell.row.checked_add(dy)?).ok()?;
            Some(DrawOp {
                x,
                y,
                ch: cell.ch,
                style: cell.style(),
                z_order,
            })
        })
    }

    /// Caption on the bottom row, centered and clipped to the canvas width.
    fn caption_ops(caption: &str, surface: &Surface) -> Vec<DrawOp> {
        let Some(y) = surface.rows.checked_sub(1) else {
            return Vec::new();
        };
        let text: Vec<char> = caption
            .chars()
            .map(|c| if c.is_control() { ' ' } else { c })
            .take(surface.cols as usize)
            .collect();
        let left = (surface.cols as usize - text.len()) / 2;
        let style = Style {
            fg: Some(Color::Named(NamedColor::Cyan)),
            bold: true,
            ..Style::default()
        };
        text.into_iter()
            .enumerate()
            .map(|(i, ch)| DrawOp {
                x: (left + i) as u16,
                y,
                ch,
                style: style.clone(),
                z_order: Z_CAPTION,
            })
            .collect()
    }

    /// Rasterize draw operations onto a fixed-size cell grid.
    ///
    /// Draw operations are sorted by z-order so that higher z values
    /// paint over lower ones.
    pub fn rasterize(ops: &[DrawOp], width: u16, height: u16) -> Grid {
        let w = width as usize;
        let h = height as usize;
        let mut grid = vec![vec![Cell::default(); w]; h];

        let mut ops: Vec<_> = ops.iter().collect();
        ops.sort_by_key(|op| op.z_order);

        for op in ops {
            let x = op.x as usize;
            let y = op.y as usize;
            if x < w && y < h {
                grid[y][x] = Cell {
                    ch: op.ch,
                    style: op.style.clone(),
                };
            }
        }

        grid
    }

    /// Compute a cell-level diff between two grids of the same size.
    pub fn diff(prev: &[Vec<Cell>], next: &[Vec<Cell>]) -> Vec<CellChange> {
        let mut changes = Vec::new();
        for (y, (prev_row, next_row)) in prev.iter().zip(next.iter()).enumerate() {
            for (x, (prev_cell, next_cell)) in prev_row.iter().zip(next_row.iter()).enumerate() {
                if prev_cell != next_cell {
                    changes.push(CellChange {
                        x: x as u16,
                        y: y as u16,
                        cell: next_cell.clone(),
                    });
                }
            }
        }
        changes
    }
}
