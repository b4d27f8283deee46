use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use rand::Rng;
use serde_json::{Map, Value};

use crate::emitter_builder::EmitterBuilder;
use crate::event::{Event, FinishedEvent};
use crate::filter_outcome::FilterOutcome;

/// An output destination for finished events.
///
/// Implementations must be safe to call from multiple threads at once, and
/// must swallow their own failures: `write` has no error channel by design,
/// because logging must never fail into the caller's business logic. A sink
/// writing to one shared resource serializes its own writes so lines from
/// two events never interleave.
pub trait EventSink: Send + Sync {
    fn write(&self, event: &FinishedEvent);
}

/// The signature of a filter function: inspects a finished event (and the
/// emitter's parameters) and decides its [`FilterOutcome`].
pub type FilterFunction = dyn Fn(&Emitter, &FinishedEvent) -> FilterOutcome + Send + Sync;

/// A long-lived source of wide events.
///
/// One emitter is shared across every call site producing the same kind of
/// event; it hands out [`Event`]s with dense sequence ids and, when they
/// close, runs the filter/sample decision and fans kept events out to its
/// sinks in registration order. The only internally shared mutable state is
/// the sequence counter and the sampling RNG, so an `&Emitter` can be used
/// freely from many threads.
///
/// Emitters are built explicitly through [`Emitter::builder`]; there is no
/// process-wide default.
pub struct Emitter {
    name: String,
    parameters: Map<String, Value>,
    sample_rate: f64,
    filter_function: Option<Box<FilterFunction>>,
    sinks: Vec<Box<dyn EventSink>>,
    sequence_counter: AtomicU64,
}

impl Emitter {
    /// Starts configuring an emitter named `name` whose default file sink
    /// writes to `{logging_directory}/{name}.log`.
    pub fn builder(
        name: impl Into<String>,
        logging_directory: impl Into<PathBuf>,
    ) -> EmitterBuilder {
        EmitterBuilder::new(name, logging_directory)
    }

    pub(crate) fn new(
        name: String,
        parameters: Map<String, Value>,
        sample_rate: f64,
        filter_function: Option<Box<FilterFunction>>,
        sinks: Vec<Box<dyn EventSink>>,
    ) -> Self {
        Self {
            name,
            parameters,
            sample_rate,
            filter_function,
            sinks,
            sequence_counter: AtomicU64::new(0),
        }
    }

    /// The emitter's identity tag, carried on every emitted event.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The configuration parameters, read-only; filter functions use these
    /// for configuration-driven decisions.
    pub fn parameters(&self) -> &Map<String, Value> {
        &self.parameters
    }

    /// The probability that a `Sample`-classified event is kept.
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Opens a new wide event. The sequence id is taken here, so ids are
    /// dense and duplicate-free even under concurrent construction.
    pub fn event(&self) -> Event<'_> {
        let sequence_id = self.sequence_counter.fetch_add(1, Ordering::Relaxed);
        log::debug!("new event: {} #{sequence_id}", self.name);
        Event::begin(self, sequence_id)
    }

    pub(crate) fn emit(&self, event: &FinishedEvent) {
        if !self.filter_event(event) {
            log::trace!("event dropped: {} #{}", self.name, event.sequence_id());
            return;
        }

        for sink in &self.sinks {
            sink.write(event);
        }
    }

    fn filter_event(&self, event: &FinishedEvent) -> bool {
        let outcome = match &self.filter_function {
            Some(filter) => {
                match panic::catch_unwind(AssertUnwindSafe(|| filter(self, event))) {
                    Ok(outcome) => outcome,
                    // Fail open: a buggy filter must not silently drop events.
                    Err(_) => {
                        log::warn!(
                            "filter function panicked; keeping event {} #{}",
                            self.name,
                            event.sequence_id()
                        );
                        FilterOutcome::Keep
                    }
                }
            }
            None => FilterOutcome::Keep,
        };

        match outcome {
            FilterOutcome::Keep => true,
            FilterOutcome::Discard => false,
            FilterOutcome::Sample => rand::thread_rng().gen::<f64>() <= self.sample_rate,
        }
    }
}
