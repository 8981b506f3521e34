//! Construction-time configuration for logs and cursors.

use crate::error::{Error, Result};

/// Default log capacity.
pub const DEFAULT_CAPACITY: usize = 1000;

/// Default tick length, in time units.
pub const DEFAULT_PERIOD: u64 = 40;

/// Default duration of one execution unit, in time units.
pub const DEFAULT_STEP_DURATION: u64 = 1000;

/// Configuration for an [`EventLog`](crate::EventLog).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogConfig {
    /// Maximum number of events retained before the oldest are evicted.
    pub capacity: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
        }
    }
}

impl LogConfig {
    /// Create a config with the given capacity (at least 1).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
        }
    }
}

/// Configuration for a playback [`Cursor`](crate::Cursor).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackConfig {
    /// Tick length. The clock advances by this much per tick.
    pub period: u64,

    /// Duration of one execution/rendering unit of an event.
    pub step_duration: u64,

    /// Scale from event `starting_time` to clock units.
    /// `None` uses `period`, so one event time unit elapses per tick.
    pub step_stamp: Option<u64>,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            period: DEFAULT_PERIOD,
            step_duration: DEFAULT_STEP_DURATION,
            step_stamp: None,
        }
    }
}

impl PlaybackConfig {
    /// Short animations, for tests and headless catch-up.
    #[must_use]
    pub fn fast() -> Self {
        Self {
            period: 10,
            step_duration: 50,
            step_stamp: None,
        }
    }

    /// Check that the period is usable as a divisor.
    pub fn validate(&self) -> Result<()> {
        if self.period == 0 {
            return Err(Error::InvalidPeriod(self.period));
        }
        Ok(())
    }

    /// Effective event-time to clock scale.
    pub fn stamp(&self) -> u64 {
        self.step_stamp.unwrap_or(self.period)
    }
}

/// Round a step duration down to a multiple of `period`, never below one period.
pub(crate) fn round_to_period(duration: u64, period: u64) -> u64 {
    (duration - duration % period).max(period)
}
