//! Drives a mediator in real time: a producer task feeds solver events in
//! while a periodic ticker plays them back.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};

use stepviz_core::{CursorId, CursorStatus, LogConfig, Mediator, PlaybackConfig};

use crate::error::Result;
use crate::scene::{solver_mapper, SceneContext, TallyCanvas};
use crate::solver::{RelaxationSolver, SolverConfig};

/// Configuration for a demo run.
#[derive(Debug, Clone)]
pub struct PlayerConfig {
    /// Ticks to play before stopping
    pub ticks: u64,
    /// Real time per tick; `None` uses the playback period in milliseconds
    pub tick_interval: Option<Duration>,
    /// Delay between solver iterations
    pub produce_interval: Duration,
    pub log: LogConfig,
    pub playback: PlaybackConfig,
    pub solver: SolverConfig,
    /// Change the step duration to `.1` once tick `.0` is reached
    pub speed_change: Option<(u64, u64)>,
    /// Log a status line every this many ticks
    pub report_every: u64,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            ticks: 500,
            tick_interval: None,
            produce_interval: Duration::from_millis(20),
            log: LogConfig::default(),
            playback: PlaybackConfig::default(),
            solver: SolverConfig::default(),
            speed_change: Some((200, 500)),
            report_every: 50,
        }
    }
}

/// Shared state between the producer and the ticker.
pub struct Player {
    mediator: Arc<Mutex<Mediator>>,
    cursor: CursorId,
    config: PlayerConfig,
}

/// Summary of a finished run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub ticks: u64,
    /// Every event ever inserted, evicted or not
    pub produced: u64,
    pub iterations: u64,
    pub shapes_drawn: usize,
    pub first_index: u64,
    pub last_index: u64,
    pub cursor: CursorStatus,
}

impl Player {
    /// Create a player with one cursor registered on an empty log.
    pub fn new(config: PlayerConfig) -> Result<Self> {
        let mut mediator = Mediator::new(config.log);
        let mapper = solver_mapper(SceneContext::default());
        let cursor = mediator.register_cursor(config.playback, Box::new(mapper))?;
        Ok(Self {
            mediator: Arc::new(Mutex::new(mediator)),
            cursor,
            config,
        })
    }

    pub fn mediator(&self) -> Arc<Mutex<Mediator>> {
        self.mediator.clone()
    }

    /// Run the producer and the ticker until `ticks` ticks have been played.
    pub async fn run(self) -> Result<RunReport> {
        let producer = tokio::spawn(produce(
            self.mediator.clone(),
            self.config.solver.clone(),
            self.config.produce_interval,
        ));

        let tick = self
            .config
            .tick_interval
            .unwrap_or(Duration::from_millis(self.config.playback.period));
        let mut interval = tokio::time::interval(tick);
        let mut shapes_drawn = 0;

        for n in 1..=self.config.ticks {
            interval.tick().await;
            let mut mediator = self.mediator.lock().await;

            if let Some((at, duration)) = self.config.speed_change {
                if n == at {
                    mediator.set_step_duration(self.cursor, duration)?;
                    info!(tick = n, step_duration = duration, "Playback speed changed");
                }
            }

            mediator.execute(self.cursor)?;
            let mut canvas = TallyCanvas::default();
            mediator.render(self.cursor, &mut canvas)?;
            shapes_drawn += canvas.total();

            if self.config.report_every > 0 && n % self.config.report_every == 0 {
                let status = mediator.status(self.cursor)?;
                info!(
                    tick = n,
                    clock = status.clock,
                    next_index = status.next_index,
                    pending = status.pending,
                    live = status.live_steps,
                    skipped = status.skipped,
                    drawn = canvas.total(),
                    "Playback status"
                );
            }
        }

        // An unfinished producer is cancelled; its iteration count is lost.
        producer.abort();
        let iterations = producer.await.ok().transpose()?.unwrap_or(0);

        let mediator = self.mediator.lock().await;
        Ok(RunReport {
            ticks: self.config.ticks,
            produced: mediator.last_index(),
            iterations,
            shapes_drawn,
            first_index: mediator.first_index(),
            last_index: mediator.last_index(),
            cursor: mediator.status(self.cursor)?,
        })
    }
}

/// Feed solver iterations into the mediator until the solver converges.
///
/// Returns the number of iterations run.
async fn produce(
    mediator: Arc<Mutex<Mediator>>,
    config: SolverConfig,
    interval: Duration,
) -> Result<u64> {
    let mut solver = RelaxationSolver::new(config);
    while solver.iterate()? {
        let events = solver.drain_events();
        let mut evicted = 0;
        {
            let mut mediator = mediator.lock().await;
            for event in events {
                evicted += mediator.add_event(event);
            }
        }
        debug!(iteration = solver.iteration(), evicted, "Solver iteration recorded");
        tokio::time::sleep(interval).await;
    }
    info!(
        iterations = solver.iteration(),
        events = solver.event_count(),
        "Solver converged"
    );
    Ok(solver.iteration())
}
