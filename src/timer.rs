use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

// --- Millisecond clocks ---

/// Source of monotonic milliseconds.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

pub type SharedClock = Rc<dyn Clock>;

/// Milliseconds elapsed since the clock was created.
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        MonotonicClock { origin: Instant::now() }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}

/// Clock that only moves when told to. Used for replays and tests.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<u64>,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        ManualClock { now: Cell::new(start_ms) }
    }

    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get() + ms);
    }

    pub fn set(&self, ms: u64) {
        // Monotonic: never step backwards
        self.now.set(self.now.get().max(ms));
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}

/// Repeating deadline check.
///
/// `is_elapsed` returns true once the clock is strictly past the deadline
/// and then moves the deadline one period past the current time, so missed
/// periods are dropped rather than queued.
///
/// `count_first_period` is accepted for both schedules but each computes the
/// first deadline as `now + duration`, i.e. the first period always has to
/// run out before the timer fires.
pub struct Timer {
    duration_ms: u64,
    next_deadline: u64,
    clock: SharedClock,
}

impl Timer {
    #[allow(clippy::if_same_then_else)]
    pub fn new(duration_ms: u64, count_first_period: bool, clock: SharedClock) -> Self {
        let now = clock.now_ms();
        let next_deadline = if count_first_period {
            now.saturating_add(duration_ms)
        } else {
            now.saturating_add(duration_ms)
        };
        Timer { duration_ms, next_deadline, clock }
    }

    pub fn is_elapsed(&mut self) -> bool {
        let now = self.clock.now_ms();
        if now > self.next_deadline {
            self.next_deadline = now.saturating_add(self.duration_ms);
            true
        } else {
            false
        }
    }

    /// Restarts the current period from now.
    pub fn reset(&mut self) {
        self.next_deadline = self.clock.now_ms().saturating_add(self.duration_ms);
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    pub fn next_deadline(&self) -> u64 {
        self.next_deadline
    }
}
