//! One wide event per unit of work, written as a line of JSON.
//!
//! [`wide-events`] builds a single structured record per logical operation
//! (say, one HTTP request) instead of scattering narrow log lines across it.
//! You open an [`Event`] from an [`Emitter`], attach fields and nested groups
//! while the work runs, and on close the finished event is filtered, sampled,
//! and fanned out to every configured sink as one compact JSON object per
//! line.
//!
//! Timing is automatic: every event and every group records its start time on
//! creation and its end time on close, and the emitted JSON carries both plus
//! the duration in milliseconds. Errors recorded on a writer are captured as
//! data (the full cause chain) rather than thrown, and emission never fails
//! into the caller: a misbehaving sink or filter cannot crash the work being
//! logged.
//!
//! # Examples
//!
//! ```rust
//! use wide_events::{Emitter, FilterOutcome};
//!
//! # fn main() -> Result<(), wide_events::BuildError> {
//! let directory = std::env::temp_dir().join("wide-events-doc");
//! let emitter = Emitter::builder("requests", &directory)
//!     .parameter("service", "docs")
//!     .sample_rate(0.25)
//!     .filter(|_emitter, event| {
//!         // Errors always land in the log; the rest is sampled at 25%.
//!         if event.has_error() {
//!             FilterOutcome::Keep
//!         } else {
//!             FilterOutcome::Sample
//!         }
//!     })
//!     .build()?;
//!
//! let mut event = emitter.event();
//! event.set("method", "GET").set("status", 200);
//! event.with_group("response", |response| {
//!     response.set("bytes", 1024);
//! });
//! event.close();
//! # Ok(())
//! # }
//! ```

mod emitter;
mod emitter_builder;
mod error_chain;
mod event;
mod event_group;
mod event_writer;
mod filter_outcome;

pub mod sink;

pub use emitter::Emitter;
pub use emitter::EventSink;
pub use emitter::FilterFunction;
pub use emitter_builder::BuildError;
pub use emitter_builder::EmitterBuilder;
pub use error_chain::ErrorCause;
pub use error_chain::ErrorChain;
pub use event::Event;
pub use event::FinishedEvent;
pub use event_group::EventGroup;
pub use event_writer::EventWriter;
pub use event_writer::IntoFieldValue;
pub use filter_outcome::FilterOutcome;
