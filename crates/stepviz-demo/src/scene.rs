//! Maps solver events to visual steps.

use stepviz_core::{
    Canvas, Event, KindMapper, LabelStep, MarkerStep, MoveStep, Result, Shape, StepBehavior, Style,
};

use crate::solver::kinds;

/// Scene handles the steps need.
#[derive(Debug, Clone)]
pub struct SceneContext {
    pub particle_radius: f64,
    pub marker_radius: f64,
    /// Offset of iteration labels from the point they annotate
    pub label_offset: [f64; 3],
    pub palette: Vec<[f32; 3]>,
}

impl Default for SceneContext {
    fn default() -> Self {
        Self {
            particle_radius: 0.3,
            marker_radius: 0.8,
            label_offset: [0.0, 1.5, 0.0],
            palette: vec![
                [0.90, 0.30, 0.25],
                [0.95, 0.65, 0.20],
                [0.30, 0.75, 0.40],
                [0.25, 0.55, 0.90],
                [0.60, 0.40, 0.85],
            ],
        }
    }
}

impl SceneContext {
    fn color(&self, event: &Event) -> [f32; 3] {
        let index = event.f64("particle").unwrap_or(0.0) as usize;
        self.palette
            .get(index % self.palette.len().max(1))
            .copied()
            .unwrap_or([1.0, 1.0, 1.0])
    }
}

fn move_step(event: &Event, scene: &SceneContext) -> Result<Box<dyn StepBehavior>> {
    let step = MoveStep::new(event.vec3("from")?, event.vec3("to")?)
        .with_radius(scene.particle_radius)
        .with_style(Style::new(scene.color(event), 1.0));
    Ok(Box::new(step))
}

fn converged_step(event: &Event, scene: &SceneContext) -> Result<Box<dyn StepBehavior>> {
    let step = MarkerStep::new(event.vec3("at")?, scene.marker_radius)
        .with_style(Style::new(scene.color(event), 0.8));
    Ok(Box::new(step))
}

fn iteration_step(event: &Event, scene: &SceneContext) -> Result<Box<dyn StepBehavior>> {
    let [x, y, z] = event.vec3("at")?;
    let [dx, dy, dz] = scene.label_offset;
    Ok(Box::new(LabelStep::new([x + dx, y + dy, z + dz], event.text("text")?)))
}

/// Mapper covering every kind the solver produces.
pub fn solver_mapper(scene: SceneContext) -> KindMapper<SceneContext> {
    KindMapper::new(scene)
        .with(kinds::MOVE, move_step)
        .with(kinds::CONVERGED, converged_step)
        .with(kinds::ITERATION, iteration_step)
}

/// Canvas that only counts what it is asked to draw.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TallyCanvas {
    pub points: usize,
    pub lines: usize,
    pub labels: usize,
}

impl TallyCanvas {
    pub fn total(&self) -> usize {
        self.points + self.lines + self.labels
    }
}

impl Canvas for TallyCanvas {
    fn draw(&mut self, shape: Shape, _style: Style) {
        match shape {
            Shape::Point { .. } => self.points += 1,
            Shape::Line { .. } => self.lines += 1,
            Shape::Label { .. } => self.labels += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::{RelaxationSolver, SolverConfig};
    use stepviz_core::{EventMapper, RecordingCanvas, StepTiming};

    #[test]
    fn maps_every_solver_kind() {
        let mut mapper = solver_mapper(SceneContext::default());
        let mut solver = RelaxationSolver::new(SolverConfig::default());
        while solver.iterate().unwrap() {}

        // drain everything recorded across all iterations
        let events = solver.drain_events();
        assert!(!events.is_empty());
        for event in &events {
            assert!(mapper.map_event(event).is_ok(), "failed to map {}", event.name());
        }
    }

    #[test]
    fn move_step_draws_trail_and_particle() {
        let mut mapper = solver_mapper(SceneContext::default());
        let event = Event::new("p", kinds::MOVE, 0, 1, 1)
            .unwrap()
            .with_attribute("from", [[0.0; 3]])
            .with_attribute("to", [[1.0, 0.0, 0.0]])
            .with_attribute("particle", [1i64]);

        let mut step = mapper.map_event(&event).unwrap();
        step.initialize(StepTiming { period: 40, step_duration: 1000 }).unwrap();

        let mut canvas = TallyCanvas::default();
        step.render(&mut canvas);
        assert_eq!(canvas, TallyCanvas { points: 1, lines: 1, labels: 0 });
    }

    #[test]
    fn iteration_label_follows_payload() {
        let mut mapper = solver_mapper(SceneContext::default());
        let event = Event::new("iteration 0", kinds::ITERATION, 0, 1, 1)
            .unwrap()
            .with_attribute("at", [[2.0, 3.0, 0.0]])
            .with_attribute("text", ["iteration 0"]);

        let mut step = mapper.map_event(&event).unwrap();
        step.initialize(StepTiming { period: 40, step_duration: 1000 }).unwrap();

        let mut canvas = RecordingCanvas::new();
        step.render(&mut canvas);
        assert!(matches!(
            &canvas.commands[0].0,
            Shape::Label { at, text } if *at == [2.0, 4.5, 0.0] && text == "iteration 0"
        ));
    }
}
