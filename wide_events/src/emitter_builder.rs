use std::io;
use std::path::PathBuf;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::emitter::{Emitter, EventSink, FilterFunction};
use crate::event::FinishedEvent;
use crate::event_writer::IntoFieldValue;
use crate::filter_outcome::FilterOutcome;
use crate::sink::{ConsoleSink, FileSink};

/// Errors produced while validating and assembling an [`Emitter`].
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("sample rate must be between 0.0 and 1.0, got {0}")]
    SampleRateOutOfRange(f64),

    #[error("failed to open log file {path}: {source}")]
    FileSink { path: PathBuf, source: io::Error },
}

enum SinkSpec {
    File(PathBuf),
    Console,
    Custom(Box<dyn EventSink>),
}

/// Incremental configuration for an [`Emitter`].
///
/// The builder only records configuration; [`build`](Self::build) is the
/// single validating step that checks the sample rate, opens the file sinks,
/// and produces the immutable emitter. Nothing is half-constructed on
/// failure.
///
/// A file sink writing to `{logging_directory}/{name}.log` is registered up
/// front; further sinks are appended in the order the `add_*` methods are
/// called, which is also the order events are written in.
pub struct EmitterBuilder {
    name: String,
    parameters: Map<String, Value>,
    sample_rate: f64,
    filter_function: Option<Box<FilterFunction>>,
    sinks: Vec<SinkSpec>,
}

impl EmitterBuilder {
    pub fn new(name: impl Into<String>, logging_directory: impl Into<PathBuf>) -> Self {
        let name = name.into();
        let log_file = logging_directory.into().join(format!("{name}.log"));
        Self {
            name,
            parameters: Map::new(),
            sample_rate: 1.0,
            filter_function: None,
            sinks: vec![SinkSpec::File(log_file)],
        }
    }

    /// Adds a named configuration parameter, visible to filter functions
    /// through [`Emitter::parameters`].
    pub fn parameter(
        mut self,
        parameter_name: impl Into<String>,
        value: impl IntoFieldValue,
    ) -> Self {
        self.parameters
            .insert(parameter_name.into(), value.into_field_value());
        self
    }

    /// Sets the probability that a `Sample`-classified event is kept.
    /// Validated by [`build`](Self::build): values outside `[0.0, 1.0]` are
    /// rejected.
    pub fn sample_rate(mut self, sample_rate: f64) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    /// Registers the filter function deciding each finished event's
    /// [`FilterOutcome`]. Without one, every event is kept.
    pub fn filter(
        mut self,
        filter: impl Fn(&Emitter, &FinishedEvent) -> FilterOutcome + Send + Sync + 'static,
    ) -> Self {
        self.filter_function = Some(Box::new(filter));
        self
    }

    /// Registers an additional file sink writing newline-delimited JSON to
    /// `path`. The file is opened by [`build`](Self::build), in append mode,
    /// creating parent directories as needed.
    pub fn add_file_sink(mut self, path: impl Into<PathBuf>) -> Self {
        self.sinks.push(SinkSpec::File(path.into()));
        self
    }

    /// Registers a console sink: error-bearing events go to stderr, the rest
    /// to stdout.
    pub fn add_console_sink(mut self) -> Self {
        self.sinks.push(SinkSpec::Console);
        self
    }

    /// Registers a custom sink.
    pub fn add_sink(mut self, sink: impl EventSink + 'static) -> Self {
        self.sinks.push(SinkSpec::Custom(Box::new(sink)));
        self
    }

    /// Validates the configuration and produces the emitter.
    pub fn build(self) -> Result<Emitter, BuildError> {
        if !(0.0..=1.0).contains(&self.sample_rate) {
            return Err(BuildError::SampleRateOutOfRange(self.sample_rate));
        }

        let mut sinks: Vec<Box<dyn EventSink>> = Vec::with_capacity(self.sinks.len());
        for spec in self.sinks {
            match spec {
                SinkSpec::File(path) => {
                    let sink = FileSink::new(&path)
                        .map_err(|source| BuildError::FileSink { path, source })?;
                    sinks.push(Box::new(sink));
                }
                SinkSpec::Console => sinks.push(Box::new(ConsoleSink)),
                SinkSpec::Custom(sink) => sinks.push(sink),
            }
        }

        Ok(Emitter::new(
            self.name,
            self.parameters,
            self.sample_rate,
            self.filter_function,
            sinks,
        ))
    }
}
