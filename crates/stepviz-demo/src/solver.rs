//! Toy iterative solver that records its progress as events.
//!
//! Particles relax toward target positions, closing a fixed fraction of the
//! remaining gap every iteration. Each iteration records:
//!
//! - one `iteration` label
//! - one `move` per particle that is still travelling
//! - one `converged` marker per particle that came within tolerance

use stepviz_core::{Event, Result};

/// Event kinds produced by the solver.
pub mod kinds {
    pub const ITERATION: &str = "iteration";
    pub const MOVE: &str = "move";
    pub const CONVERGED: &str = "converged";
}

/// Configuration for the solver.
#[derive(Debug, Clone)]
pub struct SolverConfig {
    /// Seed for deterministic start positions
    pub seed: u64,
    /// Number of particles
    pub particles: usize,
    /// Fraction of the remaining gap closed per iteration (0.0 - 1.0)
    pub relaxation: f64,
    /// Distance under which a particle counts as converged
    pub tolerance: f64,
    /// Execution units per move event
    pub move_duration: i64,
    /// Rendering units per move event
    pub trail_duration: i64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            particles: 8,
            relaxation: 0.35,
            tolerance: 0.05,
            move_duration: 1,
            trail_duration: 2,
        }
    }
}

#[derive(Debug, Clone)]
struct Particle {
    position: [f64; 3],
    target: [f64; 3],
    converged: bool,
}

/// Relaxes particles toward their targets and records events.
pub struct RelaxationSolver {
    config: SolverConfig,
    particles: Vec<Particle>,
    iteration: u64,
    pending: Vec<Event>,
    recorded: usize,
    rng_state: u64,
}

impl RelaxationSolver {
    /// Create a solver with particles scattered around the origin.
    pub fn new(config: SolverConfig) -> Self {
        let mut solver = Self {
            particles: Vec::with_capacity(config.particles),
            iteration: 0,
            pending: Vec::new(),
            recorded: 0,
            rng_state: config.seed,
            config,
        };
        for i in 0..solver.config.particles {
            let position = [solver.unit() * 20.0, solver.unit() * 20.0, 0.0];
            let angle = i as f64 / solver.config.particles.max(1) as f64 * std::f64::consts::TAU;
            let target = [angle.cos() * 5.0, angle.sin() * 5.0, 0.0];
            solver.particles.push(Particle {
                position,
                target,
                converged: false,
            });
        }
        solver
    }

    /// Simple LCG, uniform in [-1, 1).
    fn unit(&mut self) -> f64 {
        self.rng_state = self
            .rng_state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (self.rng_state >> 11) as f64 / (1u64 << 53) as f64 * 2.0 - 1.0
    }

    /// Run one iteration. Returns `false` once every particle has converged.
    pub fn iterate(&mut self) -> Result<bool> {
        if self.is_converged() {
            return Ok(false);
        }
        let time = self.iteration;
        let mut events = vec![Event::new(format!("iteration {time}"), kinds::ITERATION, time, 1, 1)?
            .with_attribute("at", [self.centroid()])
            .with_attribute("text", [format!("iteration {time}")])];

        for (index, particle) in self.particles.iter_mut().enumerate() {
            if particle.converged {
                continue;
            }
            let from = particle.position;
            let mut gap = 0.0;
            for axis in 0..3 {
                let delta = particle.target[axis] - from[axis];
                particle.position[axis] = from[axis] + delta * self.config.relaxation;
                gap += (particle.target[axis] - particle.position[axis]).powi(2);
            }
            events.push(
                Event::new(
                    format!("particle {index}"),
                    kinds::MOVE,
                    time,
                    self.config.move_duration,
                    self.config.trail_duration,
                )?
                .with_attribute("from", [from])
                .with_attribute("to", [particle.position])
                .with_attribute("particle", [index as i64]),
            );

            if gap.sqrt() < self.config.tolerance {
                particle.converged = true;
                events.push(
                    Event::new(format!("particle {index} converged"), kinds::CONVERGED, time + 1, 0, 3)?
                        .with_attribute("at", [particle.position])
                        .with_attribute("particle", [index as i64]),
                );
            }
        }

        self.recorded += events.len();
        self.pending.extend(events);
        self.iteration += 1;
        Ok(true)
    }

    /// Mean particle position.
    fn centroid(&self) -> [f64; 3] {
        let count = self.particles.len().max(1) as f64;
        let mut sum = [0.0; 3];
        for particle in &self.particles {
            for axis in 0..3 {
                sum[axis] += particle.position[axis];
            }
        }
        sum.map(|s| s / count)
    }

    /// Take the events recorded since the last call.
    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.pending)
    }

    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    /// Total events recorded so far.
    pub fn event_count(&self) -> usize {
        self.recorded
    }

    pub fn is_converged(&self) -> bool {
        self.particles.iter().all(|p| p.converged)
    }

    pub fn converged_count(&self) -> usize {
        self.particles.iter().filter(|p| p.converged).count()
    }
}
