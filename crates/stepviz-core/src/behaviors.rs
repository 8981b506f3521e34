//! Reference step behaviors.

use crate::canvas::{Canvas, Shape, Style};
use crate::step::{StepBehavior, StepPhase};

const ACTIVE: Style = Style::new([1.0, 0.55, 0.1], 1.0);
const FADED: f32 = 0.35;

fn style_for(base: Style, phase: StepPhase) -> Style {
    match phase {
        StepPhase::Running => base,
        _ => base.with_opacity(base.opacity * FADED),
    }
}

/// Interpolates a point from `from` to `to` over the execution timeline.
#[derive(Debug, Clone)]
pub struct MoveStep {
    from: [f64; 3],
    to: [f64; 3],
    current: [f64; 3],
    velocity: [f64; 3],
    radius: f64,
    style: Style,
}

impl MoveStep {
    pub fn new(from: [f64; 3], to: [f64; 3]) -> Self {
        Self {
            from,
            to,
            current: from,
            velocity: [0.0; 3],
            radius: 1.0,
            style: ACTIVE,
        }
    }

    #[must_use]
    pub fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    #[must_use]
    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = radius;
        self
    }

    /// Current interpolated position.
    pub fn position(&self) -> [f64; 3] {
        self.current
    }

    pub fn target(&self) -> [f64; 3] {
        self.to
    }

    /// Distance still to travel divided by the ticks left.
    /// Zero ticks left snaps straight to the target.
    fn aim(&mut self, remaining: u64) {
        if remaining == 0 {
            self.current = self.to;
            self.velocity = [0.0; 3];
            return;
        }
        let ticks = remaining as f64;
        for axis in 0..3 {
            self.velocity[axis] = (self.to[axis] - self.current[axis]) / ticks;
        }
    }
}

impl StepBehavior for MoveStep {
    fn start(&mut self, ticks: u64) {
        self.current = self.from;
        self.aim(ticks);
    }

    fn advance(&mut self, _remaining: u64) {
        for axis in 0..3 {
            self.current[axis] += self.velocity[axis];
        }
    }

    fn finish(&mut self) {
        self.current = self.to;
    }

    fn rescale(&mut self, remaining: u64) {
        self.aim(remaining);
    }

    fn render(&self, canvas: &mut dyn Canvas, phase: StepPhase) {
        let style = style_for(self.style, phase);
        canvas.draw(Shape::Line { from: self.from, to: self.current }, style.with_opacity(style.opacity * 0.5));
        canvas.draw(Shape::Point { at: self.current, radius: self.radius }, style);
    }
}

/// Highlights a fixed point.
#[derive(Debug, Clone)]
pub struct MarkerStep {
    at: [f64; 3],
    radius: f64,
    style: Style,
}

impl MarkerStep {
    pub fn new(at: [f64; 3], radius: f64) -> Self {
        Self {
            at,
            radius,
            style: ACTIVE,
        }
    }

    #[must_use]
    pub fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }
}

impl StepBehavior for MarkerStep {
    fn advance(&mut self, _remaining: u64) {}

    fn finish(&mut self) {}

    fn render(&self, canvas: &mut dyn Canvas, phase: StepPhase) {
        canvas.draw(
            Shape::Point { at: self.at, radius: self.radius },
            style_for(self.style, phase),
        );
    }
}

/// A text label at a position.
#[derive(Debug, Clone)]
pub struct LabelStep {
    at: [f64; 3],
    text: String,
    style: Style,
}

impl LabelStep {
    pub fn new(at: [f64; 3], text: impl Into<String>) -> Self {
        Self {
            at,
            text: text.into(),
            style: Style::new([1.0, 1.0, 1.0], 1.0),
        }
    }
}

impl StepBehavior for LabelStep {
    fn advance(&mut self, _remaining: u64) {}

    fn finish(&mut self) {}

    fn render(&self, canvas: &mut dyn Canvas, phase: StepPhase) {
        canvas.draw(
            Shape::Label { at: self.at, text: self.text.clone() },
            style_for(self.style, phase),
        );
    }
}
