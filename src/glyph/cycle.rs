use crate::schedule::{Interval, Millis};

/// Steps through the frames of one asset on a fixed period, independent of
/// the scene clock.
#[derive(Debug, Clone)]
pub struct FrameCycler {
    frame_count: usize,
    cursor: usize,
    paused: bool,
    interval: Interval,
}

impl FrameCycler {
    pub fn new(period_ms: Millis) -> Self {
        FrameCycler {
            frame_count: 0,
            cursor: 0,
            paused: false,
            interval: Interval::new(period_ms),
        }
    }

    /// Switch to an asset with `frame_count` frames. The cursor restarts at
    /// zero; single-frame assets need no timer.
    pub fn set_asset(&mut self, frame_count: usize, now: Millis) {
        self.frame_count = frame_count;
        self.cursor = 0;
        self.arm(now);
    }

    pub fn pause(&mut self) {
        self.paused = true;
        self.interval.cancel();
    }

    pub fn resume(&mut self, now: Millis) {
        self.paused = false;
        self.arm(now);
    }

    /// Advance by however many periods have passed. Returns true when the
    /// visible frame changed.
    pub fn tick(&mut self, now: Millis) -> bool {
        let steps = self.interval.fire(now);
        if steps == 0 || self.frame_count < 2 {
            return false;
        }
        let before = self.cursor;
        self.cursor = ((self.cursor as u64 + steps) % self.frame_count as u64) as usize;
        self.cursor != before
    }

    pub fn cancel(&mut self) {
        self.interval.cancel();
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_active(&self) -> bool {
        self.interval.is_active()
    }

    fn arm(&mut self, now: Millis) {
        if self.frame_count > 1 && !self.paused {
            self.interval.start(now);
        } else {
            self.interval.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycles_and_wraps() {
        let mut c = FrameCycler::new(200);
        c.set_asset(3, 0);
        assert!(c.is_active());
        assert!(!c.tick(199));
        assert!(c.tick(200));
        assert_eq!(c.cursor(), 1);
        assert!(c.tick(400));
        assert!(c.tick(600));
        assert_eq!(c.cursor(), 0);
    }

    #[test]
    fn single_frame_never_starts() {
        let mut c = FrameCycler::new(200);
        c.set_asset(1, 0);
        assert!(!c.is_active());
        assert!(!c.tick(10_000));
        assert_eq!(c.cursor(), 0);
    }

    #[test]
    fn new_asset_resets_cursor() {
        let mut c = FrameCycler::new(200);
        c.set_asset(4, 0);
        c.tick(400);
        assert_eq!(c.cursor(), 2);
        c.set_asset(4, 400);
        assert_eq!(c.cursor(), 0);
    }

    #[test]
    fn paused_cycler_holds_its_frame() {
        let mut c = FrameCycler::new(200);
        c.set_asset(4, 0);
        c.tick(200);
        c.pause();
        assert!(!c.is_active());
        assert!(!c.tick(5_000));
        assert_eq!(c.cursor(), 1);
        c.resume(5_000);
        assert!(c.tick(5_200));
        assert_eq!(c.cursor(), 2);
    }

    #[test]
    fn asset_change_while_paused_stays_idle() {
        let mut c = FrameCycler::new(200);
        c.pause();
        c.set_asset(4, 0);
        assert!(!c.is_active());
        c.resume(100);
        assert!(c.is_active());
    }
}
