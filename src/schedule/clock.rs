use std::cell::Cell;
use std::time::{Duration, Instant};

/// Monotonic time source driving the frame clock.
///
/// Injected rather than ambient so tests can step time manually; see
/// [`ManualClock`].
pub trait Clock {
    /// Monotonic time since the clock's origin.
    fn now(&self) -> Duration;
}

/// Wall clock backed by [`Instant`].
#[derive(Debug)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    /// Clock whose origin is the moment of construction.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Manually stepped clock for deterministic tests.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<Duration>,
}

impl ManualClock {
    /// Clock starting at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the clock by `delta`.
    pub fn advance(&self, delta: Duration) {
        self.now.set(self.now.get() + delta);
    }

    /// Set the clock to an absolute time.
    pub fn set(&self, now: Duration) {
        self.now.set(now);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }
}

/// Host frame-loop capability: request one wakeup at the next frame boundary.
///
/// The engine never spins its own loop; it asks the host for ticks and the
/// host calls back into `AnimationEngine::tick` / `Stage::run_pending_draws`.
/// Requests within one tick are expected to coalesce.
pub trait TickScheduler {
    /// Ask the host loop for one tick; idempotent within a frame.
    fn request_tick(&mut self);

    /// Withdraw an outstanding tick request, if the host supports it.
    fn cancel_tick(&mut self) {}
}

/// Scheduler for host-polled loops that need no explicit wakeups.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopScheduler;

impl TickScheduler for NoopScheduler {
    fn request_tick(&mut self) {}
}

/// Test scheduler counting tick requests through a shared counter.
#[derive(Clone, Debug, Default)]
pub struct CountingScheduler {
    requests: std::rc::Rc<Cell<u64>>,
}

impl CountingScheduler {
    /// Scheduler with a zeroed counter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `request_tick` calls observed so far.
    pub fn requests(&self) -> u64 {
        self.requests.get()
    }
}

impl TickScheduler for CountingScheduler {
    fn request_tick(&mut self) {
        self.requests.set(self.requests.get() + 1);
    }
}
