//! Visual steps: the animated consequence of one event.
//!
//! A step runs on two countdowns sharing one tick counter:
//!
//! - the **execution** timeline, after which the step's logical state is final
//! - the **rendering** timeline, after which the step stops being drawn
//!
//! ```text
//! Uninitialized -> Running -> Lingering -> Discarded
//!                  (execution)  (rendering only)
//! ```
//!
//! Changing the period or step duration rescales both timelines while keeping
//! the fraction of execution already done.

use serde::{Deserialize, Serialize};

use crate::canvas::Canvas;
use crate::error::{Error, Result};
use crate::event::Event;

/// Clock granularity and unit duration a step is timed against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepTiming {
    pub period: u64,
    pub step_duration: u64,
}

/// Lifecycle position of a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepPhase {
    /// Created but not yet initialized
    Uninitialized,
    /// Logical state still being updated
    Running,
    /// Logically complete, still within its rendering window
    Lingering,
    /// Complete and no longer drawn; eligible for removal
    Discarded,
}

/// Step-specific animated state.
///
/// [`VisualStep`] owns the timing; behaviors only mutate their own state when
/// told to.
pub trait StepBehavior: Send {
    /// The step was (re)started with `ticks` execution ticks ahead.
    fn start(&mut self, _ticks: u64) {}

    /// One tick of progress. `remaining` counts ticks left including this one
    /// and is never zero.
    fn advance(&mut self, remaining: u64);

    /// Snap to the final state. Called exactly once per step.
    fn finish(&mut self);

    /// The timeline was rescaled with `remaining` execution ticks left.
    /// Per-tick deltas must be re-derived from what is left, not from the
    /// original full distance.
    fn rescale(&mut self, _remaining: u64) {}

    /// Draw the current state. Must not mutate anything.
    fn render(&self, canvas: &mut dyn Canvas, phase: StepPhase);
}

/// Ticks needed for `units` of `step_duration` at `period` granularity.
pub fn ticks_for(step_duration: u64, units: u64, period: u64) -> u64 {
    let span = u128::from(step_duration) * u128::from(units);
    let ticks = span.div_ceil(u128::from(period.max(1)));
    u64::try_from(ticks).unwrap_or(u64::MAX)
}

/// Map `ticks` out of `old_total` onto `new_total`, rounding down.
pub fn scale_progress(ticks: u64, old_total: u64, new_total: u64) -> Result<u64> {
    if old_total == 0 {
        return Err(Error::DivisionGuard);
    }
    let scaled = u128::from(new_total) * u128::from(ticks) / u128::from(old_total);
    Ok(u64::try_from(scaled).unwrap_or(u64::MAX))
}

/// The live animation driven by one event.
pub struct VisualStep {
    name: String,
    kind: String,
    execution_units: u64,
    rendering_units: u64,
    timing: Option<StepTiming>,
    total_execution_ticks: u64,
    total_rendering_ticks: u64,
    ticks_elapsed: u64,
    completed: bool,
    keep_rendering: bool,
    behavior: Box<dyn StepBehavior>,
}

impl std::fmt::Debug for VisualStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisualStep")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("phase", &self.phase())
            .field("ticks_elapsed", &self.ticks_elapsed)
            .field("total_execution_ticks", &self.total_execution_ticks)
            .field("total_rendering_ticks", &self.total_rendering_ticks)
            .finish()
    }
}

impl VisualStep {
    /// Create an uninitialized step copying the event's identity and durations.
    pub fn new(event: &Event, behavior: Box<dyn StepBehavior>) -> Self {
        Self {
            name: event.name().to_string(),
            kind: event.kind().to_string(),
            execution_units: event.execution_duration(),
            rendering_units: event.rendering_duration(),
            timing: None,
            total_execution_ticks: 0,
            total_rendering_ticks: 0,
            ticks_elapsed: 0,
            completed: false,
            keep_rendering: false,
            behavior,
        }
    }

    /// Compute both timelines and enter `Running`.
    pub fn initialize(&mut self, timing: StepTiming) -> Result<()> {
        if timing.period == 0 {
            return Err(Error::InvalidPeriod(0));
        }
        self.timing = Some(timing);
        self.recompute_totals(timing);
        self.ticks_elapsed = 0;
        self.completed = false;
        self.keep_rendering = true;
        self.behavior.start(self.total_execution_ticks);
        Ok(())
    }

    /// Advance one tick.
    pub fn execute(&mut self) {
        if self.timing.is_none() {
            return;
        }
        if !self.completed && self.ticks_elapsed < self.total_execution_ticks {
            self.behavior
                .advance(self.total_execution_ticks - self.ticks_elapsed);
        }
        self.ticks_elapsed = self.ticks_elapsed.saturating_add(1);
        if self.ticks_elapsed >= self.total_execution_ticks && !self.completed {
            self.behavior.finish();
            self.completed = true;
        }
        if self.ticks_elapsed >= self.total_rendering_ticks {
            self.keep_rendering = false;
        }
    }

    /// Draw, if still within the rendering window.
    pub fn render(&self, canvas: &mut dyn Canvas) {
        if self.keep_rendering {
            self.behavior.render(canvas, self.phase());
        }
    }

    /// Change the unit duration, preserving execution progress.
    pub fn set_step_duration(&mut self, step_duration: u64) {
        if let Some(timing) = self.timing {
            self.retime(StepTiming {
                step_duration,
                ..timing
            });
        }
    }

    /// Change period and step duration together, preserving execution
    /// progress with a single rescale.
    pub fn set_timing(&mut self, timing: StepTiming) -> Result<()> {
        if timing.period == 0 {
            return Err(Error::InvalidPeriod(0));
        }
        if self.timing.is_some() {
            self.retime(timing);
        }
        Ok(())
    }

    /// Change the tick length, preserving execution progress.
    pub fn set_period(&mut self, period: u64) -> Result<()> {
        if period == 0 {
            return Err(Error::InvalidPeriod(0));
        }
        if let Some(timing) = self.timing {
            self.retime(StepTiming { period, ..timing });
        }
        Ok(())
    }

    fn recompute_totals(&mut self, timing: StepTiming) {
        self.total_execution_ticks =
            ticks_for(timing.step_duration, self.execution_units, timing.period);
        self.total_rendering_ticks =
            ticks_for(timing.step_duration, self.rendering_units, timing.period);
    }

    fn retime(&mut self, timing: StepTiming) {
        let old_execution = self.total_execution_ticks;
        let old_rendering = self.total_rendering_ticks;
        self.timing = Some(timing);
        self.recompute_totals(timing);

        // Zero-tick execution carries no fraction; fall back to the rendering
        // timeline, then to the raw count.
        self.ticks_elapsed = scale_progress(self.ticks_elapsed, old_execution, self.total_execution_ticks)
            .or_else(|_| scale_progress(self.ticks_elapsed, old_rendering, self.total_rendering_ticks))
            .unwrap_or(self.ticks_elapsed);

        if !self.completed {
            self.behavior
                .rescale(self.total_execution_ticks.saturating_sub(self.ticks_elapsed));
        }
    }

    pub fn phase(&self) -> StepPhase {
        match (self.timing.is_some(), self.completed, self.keep_rendering) {
            (false, _, _) => StepPhase::Uninitialized,
            (true, false, _) => StepPhase::Running,
            (true, true, true) => StepPhase::Lingering,
            (true, true, false) => StepPhase::Discarded,
        }
    }

    /// Logical state has reached its final value.
    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// Still within the rendering window.
    pub fn keep_rendering(&self) -> bool {
        self.keep_rendering
    }

    pub fn is_discarded(&self) -> bool {
        self.phase() == StepPhase::Discarded
    }

    pub fn ticks_elapsed(&self) -> u64 {
        self.ticks_elapsed
    }

    pub fn total_execution_ticks(&self) -> u64 {
        self.total_execution_ticks
    }

    pub fn total_rendering_ticks(&self) -> u64 {
        self.total_rendering_ticks
    }

    pub fn timing(&self) -> Option<StepTiming> {
        self.timing
    }

    /// Name of the source event.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Kind of the source event.
    pub fn kind(&self) -> &str {
        &self.kind
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::canvas::{RecordingCanvas, Shape, Style};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    /// Counts calls so tests can check exactly-once completion.
    #[derive(Default)]
    pub(crate) struct Probe {
        pub advances: Arc<AtomicU32>,
        pub finishes: Arc<AtomicU32>,
        pub last_remaining: Arc<AtomicU32>,
    }

    impl StepBehavior for Probe {
        fn advance(&mut self, remaining: u64) {
            assert!(remaining > 0);
            self.advances.fetch_add(1, Ordering::SeqCst);
        }

        fn finish(&mut self) {
            self.finishes.fetch_add(1, Ordering::SeqCst);
        }

        fn rescale(&mut self, remaining: u64) {
            self.last_remaining.store(remaining as u32, Ordering::SeqCst);
        }

        fn render(&self, canvas: &mut dyn Canvas, phase: StepPhase) {
            let opacity = if phase == StepPhase::Running { 1.0 } else { 0.5 };
            canvas.draw(
                Shape::Point { at: [0.0; 3], radius: 1.0 },
                Style::new([1.0, 1.0, 1.0], opacity),
            );
        }
    }

    fn step(execution: i64, rendering: i64) -> (VisualStep, Arc<AtomicU32>) {
        let event = Event::new("probe", "probe", 0, execution, rendering).unwrap();
        let probe = Probe::default();
        let finishes = probe.finishes.clone();
        (VisualStep::new(&event, Box::new(probe)), finishes)
    }

    const TIMING: StepTiming = StepTiming {
        period: 40,
        step_duration: 1000,
    };

    #[test]
    fn tick_math() {
        assert_eq!(ticks_for(1000, 1, 40), 25);
        assert_eq!(ticks_for(1000, 3, 40), 75);
        assert_eq!(ticks_for(1010, 1, 40), 26);
        assert_eq!(ticks_for(1000, 0, 40), 0);
        assert_eq!(scale_progress(10, 25, 50), Ok(20));
        assert_eq!(scale_progress(3, 0, 50), Err(Error::DivisionGuard));
    }

    #[test]
    fn uninitialized_step_is_inert() {
        let (mut s, finishes) = step(1, 1);
        assert_eq!(s.phase(), StepPhase::Uninitialized);
        s.execute();
        assert_eq!(s.ticks_elapsed(), 0);
        assert_eq!(finishes.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn zero_period_rejected() {
        let (mut s, _) = step(1, 1);
        let timing = StepTiming { period: 0, step_duration: 1000 };
        assert_eq!(s.initialize(timing), Err(Error::InvalidPeriod(0)));
    }

    #[test]
    fn completes_after_execution_ticks() {
        let (mut s, finishes) = step(1, 2);
        s.initialize(TIMING).unwrap();
        assert_eq!(s.total_execution_ticks(), 25);
        assert_eq!(s.total_rendering_ticks(), 50);
        assert_eq!(s.phase(), StepPhase::Running);

        for _ in 0..24 {
            s.execute();
        }
        assert!(!s.is_completed());
        s.execute();
        assert!(s.is_completed());
        assert_eq!(s.phase(), StepPhase::Lingering);

        for _ in 0..25 {
            s.execute();
        }
        assert_eq!(s.phase(), StepPhase::Discarded);
        assert_eq!(finishes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn zero_duration_completes_on_first_tick() {
        let (mut s, finishes) = step(0, 0);
        s.initialize(TIMING).unwrap();
        assert_eq!(s.total_execution_ticks(), 0);
        s.execute();
        assert!(s.is_completed());
        assert!(s.is_discarded());
        assert_eq!(finishes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn short_rendering_stops_drawing_before_completion() {
        let (mut s, _) = step(2, 1);
        s.initialize(TIMING).unwrap();
        for _ in 0..25 {
            s.execute();
        }
        assert!(!s.keep_rendering());
        assert!(!s.is_completed());
        assert_eq!(s.phase(), StepPhase::Running);

        let mut canvas = RecordingCanvas::new();
        s.render(&mut canvas);
        assert!(canvas.is_empty());
    }

    #[test]
    fn render_fades_after_completion() {
        let (mut s, _) = step(1, 2);
        s.initialize(TIMING).unwrap();
        let mut canvas = RecordingCanvas::new();

        s.render(&mut canvas);
        for _ in 0..25 {
            s.execute();
        }
        s.render(&mut canvas);

        assert_eq!(canvas.commands[0].1.opacity, 1.0);
        assert_eq!(canvas.commands[1].1.opacity, 0.5);
    }

    #[test]
    fn rescale_preserves_progress() {
        let (mut s, _) = step(1, 1);
        s.initialize(TIMING).unwrap();
        for _ in 0..10 {
            s.execute();
        }
        // 10 / 25 = 40%
        s.set_step_duration(2000);
        assert_eq!(s.total_execution_ticks(), 50);
        assert_eq!(s.ticks_elapsed(), 20);
        assert_eq!(s.total_rendering_ticks(), 50);
    }

    #[test]
    fn rescale_reports_remaining_ticks() {
        let event = Event::new("probe", "probe", 0, 1, 1).unwrap();
        let probe = Probe::default();
        let remaining = probe.last_remaining.clone();
        let mut s = VisualStep::new(&event, Box::new(probe));
        s.initialize(TIMING).unwrap();
        for _ in 0..5 {
            s.execute();
        }
        s.set_period(20).unwrap();
        // 50 ticks total, 10 elapsed
        assert_eq!(s.ticks_elapsed(), 10);
        assert_eq!(remaining.load(Ordering::SeqCst), 40);
    }

    #[test]
    fn timing_change_rescales_once() {
        let (mut s, _) = step(1, 1);
        s.initialize(TIMING).unwrap();
        for _ in 0..10 {
            s.execute();
        }
        s.set_timing(StepTiming { period: 50, step_duration: 900 }).unwrap();
        assert_eq!(s.total_execution_ticks(), 18);
        assert_eq!(s.ticks_elapsed(), 7);
        assert_eq!(
            s.set_timing(StepTiming { period: 0, step_duration: 900 }),
            Err(Error::InvalidPeriod(0))
        );
    }

    #[test]
    fn shrinking_rescale_still_completes_once() {
        let (mut s, finishes) = step(1, 1);
        s.initialize(TIMING).unwrap();
        for _ in 0..24 {
            s.execute();
        }
        s.set_step_duration(40);
        assert_eq!(s.total_execution_ticks(), 1);
        assert_eq!(s.ticks_elapsed(), 0);
        s.execute();
        assert!(s.is_completed());

        // Growing again after completion never re-runs finish.
        s.set_step_duration(4000);
        for _ in 0..200 {
            s.execute();
        }
        assert_eq!(finishes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn zero_execution_rescale_uses_rendering_timeline() {
        let (mut s, _) = step(0, 2);
        s.initialize(TIMING).unwrap();
        for _ in 0..10 {
            s.execute();
        }
        s.set_step_duration(2000);
        assert_eq!(s.total_rendering_ticks(), 100);
        assert_eq!(s.ticks_elapsed(), 20);
    }
}
