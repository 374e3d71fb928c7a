//! Millisecond timestamps from the free-running tick counter.
//!
//! The counter wraps at `u32::MAX` (~49 days); all comparisons use
//! wrapping subtraction so a wrap never stalls a timeout.

/// A point on the monotonic millisecond counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Millis(pub u32);

impl Millis {
    pub const ZERO: Millis = Millis(0);

    /// Milliseconds elapsed from `earlier` to `self`.
    pub const fn since(self, earlier: Millis) -> u32 {
        self.0.wrapping_sub(earlier.0)
    }

    pub const fn after(self, ms: u32) -> Millis {
        Millis(self.0.wrapping_add(ms))
    }
}

/// Fixed-cadence trigger driven by polling.
///
/// `due()` returns true once per `period_ms`.  The next deadline is
/// re-based on the poll that fired, so a late poll delays the following
/// tick instead of producing a burst.
#[derive(Debug, Clone, Copy)]
pub struct Cadence {
    period_ms: u32,
    last: Millis,
}

impl Cadence {
    pub const fn new(period_ms: u32, start: Millis) -> Self {
        Self { period_ms, last: start }
    }

    pub fn due(&mut self, now: Millis) -> bool {
        if now.since(self.last) >= self.period_ms {
            self.last = now;
            true
        } else {
            false
        }
    }

    pub fn set_period(&mut self, period_ms: u32) {
        self.period_ms = period_ms;
    }
}
