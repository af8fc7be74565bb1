//! Pointer tracker.
//!
//! Converts terminal mouse positions into surface pixels for the canvas
//! region only. Events are ignored while detached, and the position is
//! cleared whenever the pointer leaves the region.

use crate::surface::{Surface, SurfacePoint};

#[derive(Debug, Clone, Default)]
pub struct PointerTracker {
    attached: bool,
    position: Option<SurfacePoint>,
}

impl PointerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&mut self) {
        self.attached = true;
    }

    /// Stop listening and forget the last position.
    pub fn detach(&mut self) {
        self.attached = false;
        self.position = None;
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Pointer moved to absolute terminal cell `(column, row)`. Returns true
    /// if the reported position changed.
    pub fn on_move(&mut self, surface: &Surface, column: u16, row: u16) -> bool {
        if !self.attached {
            return false;
        }
        let next = surface
            .to_local(column, row)
            .map(|(c, r)| surface.cell_center(i32::from(c), i32::from(r)));
        self.replace(next)
    }

    /// Pointer left the region (or the terminal lost focus).
    pub fn on_leave(&mut self) -> bool {
        if !self.attached {
            return false;
        }
        self.replace(None)
    }

    pub fn position(&self) -> Option<SurfacePoint> {
        self.position
    }

    fn replace(&mut self, next: Option<SurfacePoint>) -> bool {
        let changed = self.position != next;
        self.position = next;
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::CellMetrics;

    fn surface() -> Surface {
        Surface::new(0, 1, 40, 10, CellMetrics::default())
    }

    #[test]
    fn reports_surface_pixels_inside_region() {
        let mut p = PointerTracker::new();
        p.attach();
        assert!(p.on_move(&surface(), 3, 2));
        assert_eq!(p.position(), Some(SurfacePoint { x: 28.0, y: 24.0 }));
    }

    #[test]
    fn leaving_the_region_clears() {
        let mut p = PointerTracker::new();
        p.attach();
        p.on_move(&surface(), 3, 2);
        assert!(p.on_move(&surface(), 3, 0));
        assert_eq!(p.position(), None);
        p.on_move(&surface(), 3, 2);
        assert!(p.on_leave());
        assert_eq!(p.position(), None);
        assert!(!p.on_leave());
    }

    #[test]
    fn detached_tracker_ignores_events() {
        let mut p = PointerTracker::new();
        assert!(!p.on_move(&surface(), 3, 2));
        assert_eq!(p.position(), None);
        p.attach();
        p.on_move(&surface(), 3, 2);
        p.detach();
        assert_eq!(p.position(), None);
        assert!(!p.on_move(&surface(), 4, 2));
    }
}
