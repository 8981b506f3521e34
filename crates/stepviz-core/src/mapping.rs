//! Event to visual step mapping.
//!
//! The core only needs *some* way to turn an event into a [`VisualStep`].
//! [`KindMapper`] is the usual one: a table keyed by event kind, each entry
//! building a behavior from the event and a caller-owned context.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::event::Event;
use crate::step::{StepBehavior, VisualStep};

/// Builds a visual step for a due event.
pub trait EventMapper: Send {
    fn map_event(&mut self, event: &Event) -> Result<VisualStep>;
}

impl<F> EventMapper for F
where
    F: FnMut(&Event) -> Result<VisualStep> + Send,
{
    fn map_event(&mut self, event: &Event) -> Result<VisualStep> {
        self(event)
    }
}

/// Constructor for one event kind.
pub type StepConstructor<C> =
    Box<dyn Fn(&Event, &C) -> Result<Box<dyn StepBehavior>> + Send>;

/// Maps events to steps by their `kind`.
pub struct KindMapper<C> {
    context: C,
    constructors: HashMap<String, StepConstructor<C>>,
}

impl<C: Send> KindMapper<C> {
    /// Create an empty mapper around a visualization context.
    pub fn new(context: C) -> Self {
        Self {
            context,
            constructors: HashMap::new(),
        }
    }

    /// Register (or replace) the constructor for `kind`.
    #[must_use]
    pub fn with<F>(mut self, kind: &str, constructor: F) -> Self
    where
        F: Fn(&Event, &C) -> Result<Box<dyn StepBehavior>> + Send + 'static,
    {
        self.register(kind, constructor);
        self
    }

    pub fn register<F>(&mut self, kind: &str, constructor: F)
    where
        F: Fn(&Event, &C) -> Result<Box<dyn StepBehavior>> + Send + 'static,
    {
        self.constructors
            .insert(kind.to_string(), Box::new(constructor));
    }

    pub fn handles(&self, kind: &str) -> bool {
        self.constructors.contains_key(kind)
    }

    pub fn context(&self) -> &C {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut C {
        &mut self.context
    }
}

impl<C: Send> EventMapper for KindMapper<C> {
    fn map_event(&mut self, event: &Event) -> Result<VisualStep> {
        let constructor = self
            .constructors
            .get(event.kind())
            .ok_or_else(|| Error::UnmappedKind(event.kind().to_string()))?;
        let behavior = constructor(event, &self.context)?;
        Ok(VisualStep::new(event, behavior))
    }
}
