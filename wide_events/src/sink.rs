//! Bundled sink implementations.
//!
//! Both sinks uphold the [`EventSink`] contract: concurrent `write` calls
//! are safe, and I/O failures stop at the sink. Anything else (a database, a
//! queue) is a custom [`EventSink`] registered through
//! [`EmitterBuilder::add_sink`](crate::EmitterBuilder::add_sink).

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;

use crate::emitter::EventSink;
use crate::event::FinishedEvent;

/// Appends one JSON line per event to a file.
///
/// Construction creates missing parent directories and opens the file in
/// append mode. Each write serializes, writes, and flushes under a lock, so
/// lines from concurrent events never interleave. A failed write is dropped
/// for this sink.
pub struct FileSink {
    out: Mutex<BufWriter<File>>,
}

impl FileSink {
    pub fn new(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            out: Mutex::new(BufWriter::new(file)),
        })
    }
}

impl EventSink for FileSink {
    fn write(&self, event: &FinishedEvent) {
        let line = event.to_json_string();
        let mut out = self
            .out
            .lock()
            .expect("file sink mutex should not be poisoned");
        let _ = writeln!(out, "{line}");
        let _ = out.flush();
    }
}

/// Writes events to the console: error-bearing events to stderr, everything
/// else to stdout.
pub struct ConsoleSink;

impl EventSink for ConsoleSink {
    fn write(&self, event: &FinishedEvent) {
        let line = event.to_json_string();
        if event.has_error() {
            eprintln!("{line}");
        } else {
            println!("{line}");
        }
    }
}
