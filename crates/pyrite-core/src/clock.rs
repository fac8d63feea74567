use std::time::{Duration, Instant};

/// Frame clock tracking elapsed and total game time.
///
/// The frame loop calls [`update`](Clock::update) once per iteration;
/// everything else reads the durations sampled by the last update. The
/// renderer itself never touches the clock.
#[derive(Debug)]
pub struct Clock {
    start: Instant,
    last: Instant,
    elapsed: Duration,
    total: Duration,
}

impl Clock {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last: now,
            elapsed: Duration::ZERO,
            total: Duration::ZERO,
        }
    }

    /// Sample the platform clock and advance game time.
    pub fn update(&mut self) {
        let now = Instant::now();
        self.elapsed = now - self.last;
        self.total = now - self.start;
        self.last = now;
    }

    /// Time elapsed between the two most recent updates.
    pub fn elapsed_game_time(&self) -> Duration {
        self.elapsed
    }

    /// Time elapsed since the clock was created, as of the last update.
    pub fn total_game_time(&self) -> Duration {
        self.total
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}
