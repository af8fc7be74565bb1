//! The shared coordinate space.
//!
//! The canvas is a rectangle of terminal cells. Pointer positions and glyph
//! centers are both expressed in *surface pixels*: pixels relative to the
//! canvas's top-left corner, using one `CellMetrics` measured per layout
//! pass. Nothing downstream re-derives geometry from the terminal.

use serde::{Deserialize, Serialize};

use crate::storyboard::Point;

/// Size of one character cell in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CellMetrics {
    pub width: f64,
    pub height: f64,
}

impl CellMetrics {
    /// Derive per-cell metrics from the terminal's reported pixel size.
    /// Terminals that do not report pixels yield zeros; use `fallback` then.
    pub fn from_window(
        columns: u16,
        rows: u16,
        width_px: u16,
        height_px: u16,
        fallback: CellMetrics,
    ) -> CellMetrics {
        if columns == 0 || rows == 0 || width_px == 0 || height_px == 0 {
            return fallback.or_default();
        }
        CellMetrics {
            width: f64::from(width_px) / f64::from(columns),
            height: f64::from(height_px) / f64::from(rows),
        }
    }

    /// Both sides finite and positive.
    pub fn is_valid(&self) -> bool {
        self.width.is_finite() && self.width > 0.0 && self.height.is_finite() && self.height > 0.0
    }

    /// These metrics, or the defaults if they cannot size a cell.
    pub fn or_default(self) -> CellMetrics {
        if self.is_valid() { self } else { CellMetrics::default() }
    }
}

impl Default for CellMetrics {
    fn default() -> Self {
        CellMetrics {
            width: 8.0,
            height: 16.0,
        }
    }
}

/// A position in surface pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfacePoint {
    pub x: f64,
    pub y: f64,
}

impl SurfacePoint {
    pub fn distance(self, other: SurfacePoint) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// The canvas placed on the terminal, plus the metrics used to convert
/// between cells and pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Surface {
    /// Terminal column of the canvas's left edge.
    pub left: u16,
    /// Terminal row of the canvas's top edge.
    pub top: u16,
    pub cols: u16,
    pub rows: u16,
    pub metrics: CellMetrics,
}

impl Surface {
    pub fn new(left: u16, top: u16, cols: u16, rows: u16, metrics: CellMetrics) -> Self {
        Surface {
            left,
            top,
            cols,
            rows,
            metrics: metrics.or_default(),
        }
    }

    /// Convert an absolute terminal cell to canvas-relative cell coordinates,
    /// or `None` if it lies outside the canvas.
    pub fn to_local(&self, column: u16, row: u16) -> Option<(u16, u16)> {
        let col = column.checked_sub(self.left)?;
        let row = row.checked_sub(self.top)?;
        (col < self.cols && row < self.rows).then_some((col, row))
    }

    /// Center of a canvas-relative cell in surface pixels. Accepts cells
    /// outside the canvas (art may overhang the edges).
    pub fn cell_center(&self, col: i32, row: i32) -> SurfacePoint {
        SurfacePoint {
            x: (f64::from(col) + 0.5) * self.metrics.width,
            y: (f64::from(row) + 0.5) * self.metrics.height,
        }
    }

    /// Canvas-relative cell (fractional) for a percentage position.
    pub fn percent_to_cell(&self, point: Point) -> (f64, f64) {
        let p = point.clamped();
        (
            p.x / 100.0 * f64::from(self.cols),
            p.y / 100.0 * f64::from(self.rows),
        )
    }
}
