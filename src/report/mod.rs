//! Event observers.
//!
//! [`EventPipeline`] is the ordered observer list the engine raises events into. Every observer sees every event,
//! in list order; an observer that does not override a hook is transparent.
//!
//! ## Modules
//!
//! - `console` - human-readable output
//! - `machine` - one machine-readable line per event
//! - `accumulator` - folds end events into a [`RunReport`]

pub mod accumulator;
pub mod console;
pub mod machine;

use attrun_events::{Event, EventHandler};

pub use accumulator::{AssemblyReport, ClassReport, ResultAccumulator, RunReport, TestReport};
pub use console::{ConsoleFormatter, ConsoleStyle};
pub use machine::MachineFormatter;

/// Ordered list of event observers.
#[derive(Default)]
pub struct EventPipeline {
    handlers: Vec<Box<dyn EventHandler>>,
}

impl EventPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`EventPipeline::push_back`].
    pub fn with(mut self, handler: impl EventHandler + 'static) -> Self {
        self.push_back(handler);
        self
    }

    pub fn push_front(&mut self, handler: impl EventHandler + 'static) {
        self.handlers.insert(0, Box::new(handler));
    }

    pub fn push_back(&mut self, handler: impl EventHandler + 'static) {
        self.handlers.push(Box::new(handler));
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Deliver `event` to every observer.
    pub fn raise(&mut self, event: impl Into<Event>) {
        self.raise_event(&event.into());
    }

    pub fn raise_event(&mut self, event: &Event) {
        for handler in &mut self.handlers {
            handler.handle(event);
        }
    }
}

impl std::fmt::Debug for EventPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventPipeline").field("handlers", &self.handlers.len()).finish()
    }
}
