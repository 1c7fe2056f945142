use std::time::{Duration, Instant};

/// Supplies the scheduler with a monotonically non-decreasing reading of
/// elapsed host time.
pub trait TimeSource {
    fn now(&mut self) -> Duration;
}

/// Wall-clock source anchored at its own creation.
#[derive(Debug)]
pub struct MonotonicTime {
    origin: Instant,
}

impl MonotonicTime {
    pub fn new() -> Self {
        MonotonicTime {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicTime {
    fn default() -> Self {
        MonotonicTime::new()
    }
}

impl TimeSource for MonotonicTime {
    fn now(&mut self) -> Duration {
        self.origin.elapsed()
    }
}

/// Simulation time derived from the host clock.
///
/// Mutated only by the frame scheduler: once via [`Clock::on_first_frame`]
/// at program start, then once per frame via [`Clock::on_next_frame`].
#[derive(Debug, Clone, Copy)]
pub struct Clock {
    start: Duration,
    last_frame: Duration,
    elapsed: Duration,
    delta: Duration,
    frame_count: u64,
    started: bool,
}

impl Clock {
    pub fn new() -> Self {
        Clock {
            start: Duration::ZERO,
            last_frame: Duration::ZERO,
            elapsed: Duration::ZERO,
            delta: Duration::ZERO,
            frame_count: 0,
            started: false,
        }
    }

    /// Captures `now` as the program-start timestamp and zeroes elapsed,
    /// delta, and the frame counter.
    pub fn on_first_frame(&mut self, now: Duration) {
        self.start = now;
        self.last_frame = now;
        self.elapsed = Duration::ZERO;
        self.delta = Duration::ZERO;
        self.frame_count = 0;
        self.started = true;
    }

    /// Advances one frame: delta is the time since the previous frame,
    /// elapsed the time since program start.
    ///
    /// Panics when called before [`Clock::on_first_frame`].
    pub fn on_next_frame(&mut self, now: Duration) {
        assert!(
            self.started,
            "Clock::on_next_frame called before on_first_frame"
        );
        self.delta = now.saturating_sub(self.last_frame);
        self.last_frame = now;
        self.elapsed = now.saturating_sub(self.start);
        self.frame_count += 1;
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn delta(&self) -> Duration {
        self.delta
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn started(&self) -> bool {
        self.started
    }
}

impl Default for Clock {
    fn default() -> Self {
        Clock::new()
    }
}
