//! Sleep abstraction so the poll loop can run against simulated time.

use std::cell::Cell;
use std::time::Duration;

pub trait Clock {
    /// Block for `duration` (or pretend to).
    fn sleep(&self, duration: Duration);

    /// Whether a simulated run has reached its end. Always false for real time.
    fn is_ended(&self) -> bool {
        false
    }
}

/// Real time: sleeps the current thread.
pub struct SystemClock;

impl Clock for SystemClock {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Simulated time: sleeping only advances a counter.
///
/// With an end time set, [`Clock::is_ended`] turns true once that much time
/// has been slept, which lets tests run the endless loop for a bounded span.
#[derive(Debug, Default)]
pub struct SimulatedClock {
    elapsed: Cell<Duration>,
    sleeps: Cell<usize>,
    end: Option<Duration>,
}

impl SimulatedClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// A clock whose run ends after `end` of simulated time.
    pub fn until(end: Duration) -> Self {
        Self {
            end: Some(end),
            ..Self::default()
        }
    }

    /// Total simulated time slept.
    pub fn elapsed(&self) -> Duration {
        self.elapsed.get()
    }

    /// Number of individual sleep calls.
    pub fn sleeps(&self) -> usize {
        self.sleeps.get()
    }
}

impl Clock for SimulatedClock {
    fn sleep(&self, duration: Duration) {
        self.elapsed.set(self.elapsed.get() + duration);
        self.sleeps.set(self.sleeps.get() + 1);
    }

    fn is_ended(&self) -> bool {
        self.end.is_some_and(|end| self.elapsed.get() >= end)
    }
}
