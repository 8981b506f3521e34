//! Stepviz Demo
//!
//! A toy relaxation solver recorded and played back through the stepviz
//! engine in real time.
//!
//! # Architecture
//!
//! - **Solver**: relaxes particles toward targets and records events
//! - **Scene**: maps each event kind to a visual step
//! - **Player**: a producer task feeds the shared mediator while a periodic
//!   ticker plays it back and renders into a counting canvas
//!
//! # Usage
//!
//! ```ignore
//! let report = Player::new(PlayerConfig::default())?.run().await?;
//! println!("{}", serde_json::to_string_pretty(&report)?);
//! ```

mod error;
mod player;
mod scene;
mod solver;

pub use error::{Error, Result};
pub use player::{Player, PlayerConfig, RunReport};
pub use scene::{solver_mapper, SceneContext, TallyCanvas};
pub use solver::{kinds, RelaxationSolver, SolverConfig};

#[cfg(test)]
mod tests {
    use super::*;
    use stepviz_core::{LogConfig, Mediator, PlaybackConfig};

    #[test]
    fn solver_events_play_back_to_completion() {
        let mut mediator = Mediator::new(LogConfig::default());
        let cursor = mediator
            .register_cursor(PlaybackConfig::fast(), Box::new(solver_mapper(SceneContext::default())))
            .unwrap();

        let mut solver = RelaxationSolver::new(SolverConfig::default());
        while solver.iterate().unwrap() {
            for event in solver.drain_events() {
                mediator.add_event(event);
            }
        }

        for _ in 0..1000 {
            mediator.execute(cursor).unwrap();
        }
        let status = mediator.status(cursor).unwrap();
        assert_eq!(status.pending, 0);
        assert_eq!(status.unmapped, 0);
        assert_eq!(status.skipped, 0);
        assert_eq!(status.live_steps, 0);
        assert_eq!(status.next_index as usize, solver.event_count());
    }

    #[test]
    fn bounded_log_drops_history_under_burst() {
        let mut mediator = Mediator::new(LogConfig::new(16));
        let cursor = mediator
            .register_cursor(PlaybackConfig::fast(), Box::new(solver_mapper(SceneContext::default())))
            .unwrap();

        let mut solver = RelaxationSolver::new(SolverConfig::default());
        while solver.iterate().unwrap() {
            for event in solver.drain_events() {
                mediator.add_event(event);
            }
        }

        let status = mediator.status(cursor).unwrap();
        assert_eq!(mediator.last_index() - mediator.first_index(), 16);
        assert_eq!(status.next_index, mediator.first_index());
        assert_eq!(status.skipped, mediator.first_index());
    }
}
