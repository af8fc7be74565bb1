//! Cancellable timer tasks.
//!
//! The host drives everything from one loop and passes the current time in;
//! an `Interval` only decides whether it is due. Every started interval is
//! stopped by exactly one `cancel` on teardown.

/// Monotonic milliseconds supplied by the host loop.
pub type Millis = u64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interval {
    period_ms: Millis,
    next_due: Option<Millis>,
}

impl Interval {
    pub fn new(period_ms: Millis) -> Self {
        Interval {
            period_ms,
            next_due: None,
        }
    }

    pub fn period_ms(&self) -> Millis {
        self.period_ms
    }

    /// Begin firing one period after `now`. Restarting re-phases the task.
    pub fn start(&mut self, now: Millis) {
        self.next_due = Some(now.saturating_add(self.period_ms));
    }

    pub fn cancel(&mut self) {
        self.next_due = None;
    }

    pub fn is_active(&self) -> bool {
        self.next_due.is_some()
    }

    /// Number of periods that elapsed up to `now`. Missed periods are
    /// reported together so slow hosts catch up instead of drifting.
    pub fn fire(&mut self, now: Millis) -> u64 {
        let Some(due) = self.next_due else {
            return 0;
        };
        if now < due {
            return 0;
        }
        if self.period_ms == 0 {
            self.next_due = Some(now);
            return 1;
        }
        let count = (now - due) / self.period_ms + 1;
        self.next_due = Some(due + count * self.period_ms);
        count
    }
}
