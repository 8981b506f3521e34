//! Playback cursor: a per-consumer discrete-time scheduler over an event log.
//!
//! Each call to [`Cursor::execute`] is one tick:
//!
//! 1. **Admit** every event whose scheduled time has been reached, mapping
//!    it to a fresh [`VisualStep`]
//! 2. **Advance** every live step by one tick, dropping steps that finished
//!    both timelines on an earlier tick
//! 3. **Tick** the clock by one period, but only while events are pending.
//!    A drained cursor freezes so it cannot race past events that have not
//!    been produced yet.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::canvas::Canvas;
use crate::config::{round_to_period, PlaybackConfig};
use crate::error::{Error, Result};
use crate::log::EventLog;
use crate::mapping::EventMapper;
use crate::step::{StepTiming, VisualStep};

/// Reads events from a log and plays them back as visual steps.
pub struct Cursor {
    period: u64,
    step_duration: u64,
    /// Duration the stamp was configured against
    base_duration: u64,
    /// Configured stamp; `None` follows the period
    base_stamp: Option<u64>,
    next_index: u64,
    clock: u64,
    live_steps: Vec<VisualStep>,
    mapper: Box<dyn EventMapper>,
    skipped: u64,
    unmapped: u64,
}

impl std::fmt::Debug for Cursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cursor")
            .field("period", &self.period)
            .field("step_duration", &self.step_duration)
            .field("step_stamp", &self.step_stamp())
            .field("next_index", &self.next_index)
            .field("clock", &self.clock)
            .field("live_steps", &self.live_steps.len())
            .finish()
    }
}

impl Cursor {
    /// Create a cursor positioned at the start of history.
    ///
    /// The step duration is rounded down to a multiple of the period.
    pub fn new(config: PlaybackConfig, mapper: Box<dyn EventMapper>) -> Result<Self> {
        config.validate()?;
        let stamp = config.stamp();
        if stamp == 0 {
            return Err(Error::InvalidPeriod(stamp));
        }
        let step_duration = round_to_period(config.step_duration, config.period);
        Ok(Self {
            period: config.period,
            step_duration,
            base_duration: step_duration,
            base_stamp: config.step_stamp,
            next_index: 0,
            clock: 0,
            live_steps: Vec::new(),
            mapper,
            skipped: 0,
            unmapped: 0,
        })
    }

    /// Position a late-joining cursor at "now".
    pub(crate) fn attach_at(&mut self, last_index: u64) {
        self.next_index = last_index;
        self.clock = last_index.saturating_mul(self.period);
    }

    /// One tick: admit due events, advance live steps, then tick the clock
    /// if anything is still pending.
    pub fn execute(&mut self, log: &EventLog) {
        while self.admit_due(log) {}
        self.advance_steps();
        if self.next_index < log.last_index() {
            self.clock = self.clock.saturating_add(self.period);
        }
    }

    /// Draw every live step still inside its rendering window, in the order
    /// the steps were admitted so later steps land on top.
    pub fn render(&self, canvas: &mut dyn Canvas) {
        for step in self.live_steps.iter().filter(|s| s.keep_rendering()) {
            step.render(canvas);
        }
    }

    /// Catch up to `target` synchronously, without real-time pacing.
    ///
    /// Each due event is admitted and every live step is driven one tick
    /// immediately; otherwise the clock is moved forward to the next due
    /// time. Indices that were evicted are skipped and counted in
    /// [`skipped`](Self::skipped).
    pub fn jump_to(&mut self, log: &EventLog, target: u64) {
        self.skip_evicted(log);
        let target = target.min(log.last_index());
        let start = self.next_index;

        while self.next_index < target {
            if self.admit_due(log) {
                self.advance_steps();
                continue;
            }
            match log.event(self.next_index) {
                Ok(event) => {
                    let due = self.due_time(event.starting_time());
                    let gap = due.saturating_sub(self.clock);
                    let ticks = gap.div_ceil(self.period).max(1);
                    self.clock = self.clock.saturating_add(ticks.saturating_mul(self.period));
                }
                Err(_) => break,
            }
        }

        if self.next_index > start {
            debug!(
                from = start,
                to = self.next_index,
                clock = self.clock,
                "Cursor resynced"
            );
        }
    }

    /// Jump to the newest produced event.
    pub fn catch_up(&mut self, log: &EventLog) {
        self.jump_to(log, log.last_index());
    }

    /// Change the unit duration of playback.
    ///
    /// The duration is rounded down to a multiple of the period (never below
    /// one period). The event time scale follows the duration, the clock
    /// keeps its position in event time, and every live step keeps its
    /// fraction of progress.
    pub fn set_step_duration(&mut self, duration: u64) {
        let duration = round_to_period(duration, self.period);
        let old = self.step_duration;
        if duration == old {
            return;
        }

        let old_stamp = self.step_stamp();
        self.step_duration = duration;
        self.rescale_clock(old_stamp);

        for step in &mut self.live_steps {
            step.set_step_duration(duration);
        }
        debug!(
            from = old,
            to = duration,
            clock = self.clock,
            live = self.live_steps.len(),
            "Step duration changed"
        );
    }

    /// Change the tick length.
    ///
    /// The step duration is re-rounded to the new period. A stamp that
    /// follows the period moves with it, and the clock keeps its position in
    /// event time, aligned to the new period.
    pub fn set_period(&mut self, period: u64) -> Result<()> {
        if period == 0 {
            return Err(Error::InvalidPeriod(period));
        }
        let old_stamp = self.step_stamp();
        self.period = period;
        self.step_duration = round_to_period(self.step_duration, period);
        self.rescale_clock(old_stamp);

        let timing = self.timing();
        for step in &mut self.live_steps {
            step.set_timing(timing)?;
        }
        debug!(
            period,
            step_duration = self.step_duration,
            clock = self.clock,
            "Period changed"
        );
        Ok(())
    }

    /// Drop all live steps and return to the start of history.
    pub fn reset(&mut self) {
        self.live_steps.clear();
        self.next_index = 0;
        self.clock = 0;
        self.skipped = 0;
        self.unmapped = 0;
    }

    fn timing(&self) -> StepTiming {
        StepTiming {
            period: self.period,
            step_duration: self.step_duration,
        }
    }

    fn due_time(&self, starting_time: u64) -> u64 {
        starting_time.saturating_mul(self.step_stamp())
    }

    /// Move the clock from the `old_stamp` scale to the current one, rounded
    /// to the nearest period so that toggling back and forth does not drift.
    fn rescale_clock(&mut self, old_stamp: u64) {
        let clock = rescale(self.clock, self.step_stamp(), old_stamp);
        let aligned = clock.saturating_add(self.period / 2) / self.period;
        self.clock = aligned.saturating_mul(self.period);
    }

    fn skip_evicted(&mut self, log: &EventLog) {
        let first = log.first_index();
        if self.next_index < first {
            let lost = first - self.next_index;
            self.skipped += lost;
            warn!(
                lost,
                from = self.next_index,
                to = first,
                "Events evicted before playback, skipping"
            );
            self.next_index = first;
        }
    }

    /// Consume the next event if it is due. Returns whether one was consumed.
    fn admit_due(&mut self, log: &EventLog) -> bool {
        self.skip_evicted(log);
        let Ok(event) = log.event(self.next_index) else {
            return false;
        };
        if self.due_time(event.starting_time()) > self.clock {
            return false;
        }

        let index = self.next_index;
        self.next_index += 1;
        let step = self
            .mapper
            .map_event(event)
            .and_then(|mut step| step.initialize(self.timing()).map(|()| step));
        match step {
            Ok(step) => {
                trace!(index, name = event.name(), kind = event.kind(), clock = self.clock, "Admitted event");
                self.live_steps.push(step);
            }
            Err(err) => {
                self.unmapped += 1;
                debug!(index, kind = event.kind(), %err, "Event has no visual step, skipping");
            }
        }
        true
    }

    fn advance_steps(&mut self) {
        self.live_steps.retain_mut(|step| {
            if step.is_discarded() {
                return false;
            }
            step.execute();
            true
        });
    }

    /// Next event index not yet consumed.
    pub fn next_index(&self) -> u64 {
        self.next_index
    }

    /// Logical time, in clock units.
    pub fn clock(&self) -> u64 {
        self.clock
    }

    pub fn period(&self) -> u64 {
        self.period
    }

    pub fn step_duration(&self) -> u64 {
        self.step_duration
    }

    /// Event time to clock scale.
    ///
    /// Derived from the configured stamp (or the period) scaled by how far
    /// the step duration has moved from its configured value.
    pub fn step_stamp(&self) -> u64 {
        let base = self.base_stamp.unwrap_or(self.period);
        rescale(base, self.step_duration, self.base_duration).max(1)
    }

    pub fn live_steps(&self) -> &[VisualStep] {
        &self.live_steps
    }

    /// Events lost to eviction before this cursor consumed them.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    /// Events consumed without producing a step.
    pub fn unmapped(&self) -> u64 {
        self.unmapped
    }

    /// Every produced event has been consumed.
    pub fn is_drained(&self, log: &EventLog) -> bool {
        self.next_index >= log.last_index()
    }

    /// Snapshot of this cursor's position against `log`.
    pub fn status(&self, log: &EventLog) -> CursorStatus {
        CursorStatus {
            clock: self.clock,
            next_index: self.next_index,
            pending: log.last_index().saturating_sub(self.next_index),
            live_steps: self.live_steps.len(),
            rendering_steps: self.live_steps.iter().filter(|s| s.keep_rendering()).count(),
            skipped: self.skipped,
            unmapped: self.unmapped,
            period: self.period,
            step_duration: self.step_duration,
        }
    }
}

/// `value * numerator / denominator`, rounded to nearest.
fn rescale(value: u64, numerator: u64, denominator: u64) -> u64 {
    let denominator = u128::from(denominator.max(1));
    let scaled = (u128::from(value) * u128::from(numerator) + denominator / 2) / denominator;
    u64::try_from(scaled).unwrap_or(u64::MAX)
}

/// Cursor position for logging or sending to a frontend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CursorStatus {
    pub clock: u64,
    pub next_index: u64,
    pub pending: u64,
    pub live_steps: usize,
    pub rendering_steps: usize,
    pub skipped: u64,
    pub unmapped: u64,
    pub period: u64,
    pub step_duration: u64,
}
