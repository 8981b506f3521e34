//! Bounded, time-ordered event log with a global index space.
//!
//! Every event ever inserted occupies a position in a monotonically growing
//! index space. Only the window `[first_index, last_index)` is retained; once
//! the buffer exceeds its capacity the oldest events are evicted and
//! `first_index` moves forward. Eviction is intentional data loss: cursors
//! that had not consumed those events skip them (see [`Mediator`]).
//!
//! [`Mediator`]: crate::Mediator

use std::collections::VecDeque;

use tracing::warn;

use crate::config::LogConfig;
use crate::error::{Error, Result};
use crate::event::Event;

/// Append-mostly event buffer, sorted by `starting_time`.
#[derive(Debug, Clone)]
pub struct EventLog {
    buffer: VecDeque<Event>,
    first_index: u64,
    capacity: usize,
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new(LogConfig::default())
    }
}

impl EventLog {
    /// Create an empty log.
    pub fn new(config: LogConfig) -> Self {
        let capacity = config.capacity.max(1);
        Self {
            buffer: VecDeque::with_capacity(capacity.min(4096) + 1),
            first_index: 0,
            capacity,
        }
    }

    /// Insert an event, keeping the buffer sorted by `starting_time`.
    ///
    /// Ties go after existing events with an equal time. Returns the number
    /// of events evicted from the front to restore the capacity bound.
    pub fn insert(&mut self, event: Event) -> usize {
        let position = self
            .buffer
            .partition_point(|e| e.starting_time() <= event.starting_time());
        if position == self.buffer.len() {
            self.buffer.push_back(event);
        } else {
            self.buffer.insert(position, event);
        }

        let overflow = self.buffer.len().saturating_sub(self.capacity);
        if overflow > 0 {
            self.buffer.drain(..overflow);
            self.first_index += overflow as u64;
            warn!(
                evicted = overflow,
                first_index = self.first_index,
                "Event log over capacity, evicted oldest events"
            );
        }
        overflow
    }

    /// Get the event at a global index.
    pub fn event(&self, index: u64) -> Result<&Event> {
        if index < self.first_index {
            return Err(Error::IndexEvicted {
                index,
                first_index: self.first_index,
            });
        }
        let last_index = self.last_index();
        usize::try_from(index - self.first_index)
            .ok()
            .and_then(|offset| self.buffer.get(offset))
            .ok_or(Error::IndexNotYetProduced { index, last_index })
    }

    /// Smallest index still retained.
    pub fn first_index(&self) -> u64 {
        self.first_index
    }

    /// Exclusive upper bound of available indices.
    pub fn last_index(&self) -> u64 {
        self.first_index + self.buffer.len() as u64
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Iterate retained events with their global indices, front to back.
    pub fn iter(&self) -> impl Iterator<Item = (u64, &Event)> {
        (self.first_index..).zip(self.buffer.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(name: &str, time: u64) -> Event {
        Event::new(name, "marker", time, 1, 1).unwrap()
    }

    fn names(log: &EventLog) -> Vec<String> {
        log.iter().map(|(_, e)| e.name().to_string()).collect()
    }

    #[test]
    fn log_starts_empty() {
        let log = EventLog::default();
        assert!(log.is_empty());
        assert_eq!(log.first_index(), 0);
        assert_eq!(log.last_index(), 0);
        assert_eq!(log.capacity(), 1000);
    }

    #[test]
    fn insert_keeps_time_order() {
        let mut log = EventLog::default();
        log.insert(at("c", 5));
        log.insert(at("a", 1));
        log.insert(at("b", 3));
        assert_eq!(names(&log), ["a", "b", "c"]);
    }

    #[test]
    fn ties_are_fifo() {
        let mut log = EventLog::default();
        log.insert(at("first", 2));
        log.insert(at("late", 9));
        log.insert(at("second", 2));
        log.insert(at("third", 2));
        assert_eq!(names(&log), ["first", "second", "third", "late"]);
    }

    #[test]
    fn eviction_advances_first_index() {
        let mut log = EventLog::new(LogConfig::new(3));
        for t in 0..3 {
            assert_eq!(log.insert(at("e", t)), 0);
        }
        assert_eq!(log.insert(at("e", 3)), 1);
        assert_eq!(log.first_index(), 1);
        assert_eq!(log.last_index(), 4);
        assert_eq!(log.event(1).unwrap().starting_time(), 1);
    }

    #[test]
    fn out_of_window_lookups() {
        let mut log = EventLog::new(LogConfig::new(2));
        for t in 0..4 {
            log.insert(at("e", t));
        }
        assert_eq!(
            log.event(1),
            Err(Error::IndexEvicted { index: 1, first_index: 2 })
        );
        assert_eq!(
            log.event(4),
            Err(Error::IndexNotYetProduced { index: 4, last_index: 4 })
        );
        assert!(log.event(3).is_ok());
    }
}
