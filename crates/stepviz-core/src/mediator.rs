//! The mediator: an event log plus the cursors that read it.
//!
//! Cursors are registered as an explicit observer list. When an insert
//! evicts events, every registered cursor is resynced to the new
//! `first_index` before `add_event` returns, so no cursor can hold an index
//! below the retained window. Because `add_event` takes `&mut self`, the
//! insert, the eviction and the fan-out form one critical section; wrap the
//! mediator in a mutex to share it between a producer and the tick driver.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::canvas::Canvas;
use crate::config::{LogConfig, PlaybackConfig};
use crate::cursor::{Cursor, CursorStatus};
use crate::error::{Error, Result};
use crate::event::Event;
use crate::log::EventLog;
use crate::mapping::EventMapper;

/// Handle to a registered cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CursorId(pub u64);

impl fmt::Display for CursorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cursor#{}", self.0)
    }
}

/// Event log with registered playback cursors.
#[derive(Debug, Default)]
pub struct Mediator {
    log: EventLog,
    cursors: Vec<(CursorId, Cursor)>,
    next_cursor_id: u64,
}

impl Mediator {
    pub fn new(config: LogConfig) -> Self {
        Self {
            log: EventLog::new(config),
            cursors: Vec::new(),
            next_cursor_id: 0,
        }
    }

    /// Insert an event and resync every cursor if anything was evicted.
    ///
    /// Returns the number of events evicted.
    pub fn add_event(&mut self, event: Event) -> usize {
        let evicted = self.log.insert(event);
        if evicted > 0 {
            let first_index = self.log.first_index();
            for (_, cursor) in &mut self.cursors {
                cursor.jump_to(&self.log, first_index);
            }
        }
        evicted
    }

    /// Get the event at a global index.
    pub fn event(&self, index: u64) -> Result<&Event> {
        self.log.event(index)
    }

    pub fn first_index(&self) -> u64 {
        self.log.first_index()
    }

    pub fn last_index(&self) -> u64 {
        self.log.last_index()
    }

    pub fn log(&self) -> &EventLog {
        &self.log
    }

    /// Attach a new cursor positioned at the current end of the log.
    pub fn register_cursor(
        &mut self,
        config: PlaybackConfig,
        mapper: Box<dyn EventMapper>,
    ) -> Result<CursorId> {
        let mut cursor = Cursor::new(config, mapper)?;
        cursor.attach_at(self.log.last_index());

        let id = CursorId(self.next_cursor_id);
        self.next_cursor_id += 1;
        debug!(%id, next_index = cursor.next_index(), clock = cursor.clock(), "Cursor registered");
        self.cursors.push((id, cursor));
        Ok(id)
    }

    /// Detach a cursor, handing it back to the caller.
    pub fn unregister_cursor(&mut self, id: CursorId) -> Result<Cursor> {
        let position = self
            .cursors
            .iter()
            .position(|(cid, _)| *cid == id)
            .ok_or(Error::UnknownCursor(id))?;
        Ok(self.cursors.remove(position).1)
    }

    pub fn cursor(&self, id: CursorId) -> Result<&Cursor> {
        self.cursors
            .iter()
            .find(|(cid, _)| *cid == id)
            .map(|(_, c)| c)
            .ok_or(Error::UnknownCursor(id))
    }

    pub fn cursor_ids(&self) -> impl Iterator<Item = CursorId> + '_ {
        self.cursors.iter().map(|(id, _)| *id)
    }

    fn split(&mut self, id: CursorId) -> Result<(&EventLog, &mut Cursor)> {
        let cursor = self
            .cursors
            .iter_mut()
            .find(|(cid, _)| *cid == id)
            .map(|(_, c)| c)
            .ok_or(Error::UnknownCursor(id))?;
        Ok((&self.log, cursor))
    }

    /// One tick of one cursor.
    pub fn execute(&mut self, id: CursorId) -> Result<()> {
        let (log, cursor) = self.split(id)?;
        cursor.execute(log);
        Ok(())
    }

    /// One tick of every cursor.
    pub fn execute_all(&mut self) {
        for (_, cursor) in &mut self.cursors {
            cursor.execute(&self.log);
        }
    }

    pub fn render(&self, id: CursorId, canvas: &mut dyn Canvas) -> Result<()> {
        self.cursor(id)?.render(canvas);
        Ok(())
    }

    pub fn jump_to(&mut self, id: CursorId, target: u64) -> Result<()> {
        let (log, cursor) = self.split(id)?;
        cursor.jump_to(log, target);
        Ok(())
    }

    pub fn catch_up(&mut self, id: CursorId) -> Result<()> {
        let (log, cursor) = self.split(id)?;
        cursor.catch_up(log);
        Ok(())
    }

    pub fn set_step_duration(&mut self, id: CursorId, duration: u64) -> Result<()> {
        self.split(id)?.1.set_step_duration(duration);
        Ok(())
    }

    pub fn set_period(&mut self, id: CursorId, period: u64) -> Result<()> {
        self.split(id)?.1.set_period(period)
    }

    pub fn reset(&mut self, id: CursorId) -> Result<()> {
        self.split(id)?.1.reset();
        Ok(())
    }

    pub fn status(&self, id: CursorId) -> Result<CursorStatus> {
        Ok(self.cursor(id)?.status(&self.log))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behaviors::MarkerStep;
    use crate::mapping::KindMapper;

    fn markers() -> Box<dyn EventMapper> {
        Box::new(KindMapper::new(()).with("marker", |_, _| {
            Ok(Box::new(MarkerStep::new([0.0; 3], 1.0)))
        }))
    }

    fn marker(time: u64) -> Event {
        Event::new(format!("m{time}"), "marker", time, 1, 1).unwrap()
    }

    #[test]
    fn late_cursor_starts_at_now() {
        let mut m = Mediator::default();
        for t in 0..3 {
            m.add_event(marker(t));
        }
        let id = m.register_cursor(PlaybackConfig::default(), markers()).unwrap();
        let c = m.cursor(id).unwrap();
        assert_eq!(c.next_index(), 3);
        assert_eq!(c.clock(), 120);
    }

    #[test]
    fn eviction_resyncs_registered_cursors() {
        let mut m = Mediator::new(LogConfig::new(3));
        let id = m.register_cursor(PlaybackConfig::default(), markers()).unwrap();

        for t in 0..3 {
            assert_eq!(m.add_event(marker(t)), 0);
        }
        assert_eq!(m.cursor(id).unwrap().next_index(), 0);

        assert_eq!(m.add_event(marker(3)), 1);
        assert_eq!(m.first_index(), 1);
        let c = m.cursor(id).unwrap();
        assert!(c.next_index() >= 1);
        assert_eq!(c.skipped(), 1);
    }

    #[test]
    fn caught_up_cursor_unaffected_by_eviction() {
        let mut m = Mediator::new(LogConfig::new(2));
        let id = m.register_cursor(PlaybackConfig::default(), markers()).unwrap();
        m.add_event(marker(0));
        m.add_event(marker(0));
        m.execute(id).unwrap();
        assert_eq!(m.cursor(id).unwrap().next_index(), 2);

        m.add_event(marker(1));
        let c = m.cursor(id).unwrap();
        assert_eq!(c.next_index(), 2);
        assert_eq!(c.skipped(), 0);
    }

    #[test]
    fn unknown_cursor() {
        let mut m = Mediator::default();
        let id = m.register_cursor(PlaybackConfig::default(), markers()).unwrap();
        m.unregister_cursor(id).unwrap();
        assert_eq!(m.execute(id), Err(Error::UnknownCursor(id)));
        assert!(matches!(m.cursor(id), Err(Error::UnknownCursor(_))));
        assert_eq!(m.cursor_ids().count(), 0);
    }

    #[test]
    fn cursors_play_independently() {
        let mut m = Mediator::default();
        let a = m.register_cursor(PlaybackConfig::default(), markers()).unwrap();
        let b = m.register_cursor(PlaybackConfig::default(), markers()).unwrap();
        for t in 0..4 {
            m.add_event(marker(t));
        }

        m.execute_all();
        m.execute(a).unwrap();
        assert_eq!(m.status(a).unwrap().next_index, 2);
        assert_eq!(m.status(b).unwrap().next_index, 1);

        m.catch_up(b).unwrap();
        assert_eq!(m.status(b).unwrap().next_index, 4);
        assert_eq!(m.status(b).unwrap().pending, 0);
    }

    #[test]
    fn mediator_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<Mediator>();
    }
}
