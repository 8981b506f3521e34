//! Stepviz Playback Engine
//!
//! Records the interesting moments of a running algorithm and replays them as
//! short-lived animated visual steps on an independent discrete time axis.
//!
//! # Architecture
//!
//! - **Event**: immutable record of one noteworthy moment, with a scheduled
//!   time, an execution and a rendering budget, and a typed payload
//! - **EventLog**: bounded, time-ordered buffer addressed by a global index
//! - **Mediator**: the log plus its registered cursors; eviction resyncs
//!   every cursor before the insert returns
//! - **VisualStep**: per-event state machine with two countdowns and live
//!   duration rescaling
//! - **Cursor**: per-consumer scheduler that admits due events, ticks live
//!   steps and renders those still visible
//!
//! Nothing here owns a thread. The host calls [`Cursor::execute`] once per
//! tick and [`Cursor::render`] as often as it likes in between.
//!
//! # Usage
//!
//! ```
//! use stepviz_core::{Event, KindMapper, Mediator, MarkerStep, PlaybackConfig, RecordingCanvas, StepBehavior};
//!
//! let mapper = KindMapper::new(()).with("marker", |event, _| {
//!     let step: Box<dyn StepBehavior> = Box::new(MarkerStep::new(event.vec3("at")?, 1.0));
//!     Ok(step)
//! });
//!
//! let mut mediator = Mediator::default();
//! let cursor = mediator.register_cursor(PlaybackConfig::default(), Box::new(mapper)).unwrap();
//!
//! let event = Event::new("probe", "marker", 0, 1, 2).unwrap()
//!     .with_attribute("at", [[1.0, 2.0, 3.0]]);
//! mediator.add_event(event);
//!
//! mediator.execute(cursor).unwrap();
//! let mut canvas = RecordingCanvas::new();
//! mediator.render(cursor, &mut canvas).unwrap();
//! assert_eq!(canvas.len(), 1);
//! ```

mod behaviors;
mod canvas;
mod config;
mod cursor;
mod error;
mod event;
mod log;
mod mapping;
mod mediator;
mod step;

pub use behaviors::{LabelStep, MarkerStep, MoveStep};
pub use canvas::{Canvas, RecordingCanvas, Shape, Style};
pub use config::{LogConfig, PlaybackConfig, DEFAULT_CAPACITY, DEFAULT_PERIOD, DEFAULT_STEP_DURATION};
pub use cursor::{Cursor, CursorStatus};
pub use error::{Error, Result};
pub use event::{Attribute, Event, Value};
pub use log::EventLog;
pub use mapping::{EventMapper, KindMapper, StepConstructor};
pub use mediator::{CursorId, Mediator};
pub use step::{scale_progress, ticks_for, StepBehavior, StepPhase, StepTiming, VisualStep};
