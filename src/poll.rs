//! Bounded polling.
//!
//! Every wait on the foreign installer UI goes through [`PollPolicy`]: a fixed
//! interval and a fixed attempt budget. Sleeping is routed through the
//! [`Sleeper`] seam so timeout budgets can be checked without real delays.

use std::time::Duration;
use thiserror::Error;

/// Blocking delay source.
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

/// Sleeper backed by `std::thread::sleep`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Returned when a poll exhausts its attempt budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("gave up after {attempts} attempts spaced {interval:?} apart")]
pub struct PollTimeout {
    pub attempts: u32,
    pub interval: Duration,
}

/// Fixed-interval retry budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Delay between two consecutive probes
    pub interval: Duration,

    /// Total number of probes, including the first one
    pub max_attempts: u32,
}

impl PollPolicy {
    pub const fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts,
        }
    }

    /// Policy that keeps probing until `timeout` has elapsed, probing once at
    /// the start and once per `interval` after that.
    pub fn within(timeout: Duration, interval: Duration) -> Self {
        let steps = if interval.is_zero() {
            0
        } else {
            u32::try_from(timeout.as_millis() / interval.as_millis().max(1)).unwrap_or(u32::MAX)
        };
        Self::new(interval, steps.saturating_add(1))
    }

    /// Total time spent sleeping when every probe fails.
    pub fn budget(&self) -> Duration {
        self.interval
            .checked_mul(self.max_attempts.saturating_sub(1))
            .unwrap_or(Duration::MAX)
    }

    /// Run `probe` until it yields a value or the budget is exhausted.
    ///
    /// The probe runs at most `max_attempts` times; the sleeper is only
    /// invoked between attempts, never after the last one.
    pub fn poll<T, F>(&self, sleeper: &dyn Sleeper, mut probe: F) -> Result<T, PollTimeout>
    where
        F: FnMut() -> Option<T>,
    {
        let attempts = self.max_attempts.max(1);
        for attempt in 1..=attempts {
            if let Some(value) = probe() {
                return Ok(value);
            }
            if attempt < attempts {
                sleeper.sleep(self.interval);
            }
        }

        Err(PollTimeout {
            attempts,
            interval: self.interval,
        })
    }
}
