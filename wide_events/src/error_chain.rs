use std::error::Error;

use serde_json::{Map, Value};

/// Hard cap on cause-chain traversal. `Error::source` graphs are not
/// guaranteed acyclic; a self-referential chain truncates here instead of
/// looping.
const MAX_CAUSE_DEPTH: usize = 32;

/// One level of a captured cause chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorCause {
    /// The error's type. For the outermost error this is the full type path;
    /// causes are only visible as `dyn Error`, so their type is recovered
    /// from the `Debug` rendering.
    pub error_type: String,
    /// The error's `Display` rendering.
    pub error_message: String,
}

/// A flattened cause chain, outermost error first, ending at the root cause.
///
/// Captured eagerly when [`EventWriter::error`](crate::EventWriter::error) is
/// called, so nothing borrowed from the caller's error outlives that call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorChain {
    causes: Vec<ErrorCause>,
}

impl ErrorChain {
    /// Captures `error` and everything reachable through [`Error::source`].
    pub fn capture<E: Error + ?Sized>(error: &E) -> Self {
        let mut causes = vec![ErrorCause {
            error_type: std::any::type_name::<E>().to_owned(),
            error_message: error.to_string(),
        }];

        let mut source = error.source();
        while let Some(cause) = source {
            if causes.len() >= MAX_CAUSE_DEPTH {
                break;
            }
            causes.push(ErrorCause {
                error_type: type_from_debug(&format!("{cause:?}")),
                error_message: cause.to_string(),
            });
            source = cause.source();
        }

        Self { causes }
    }

    /// The captured levels, outermost first.
    pub fn causes(&self) -> &[ErrorCause] {
        &self.causes
    }

    pub(crate) fn to_json(&self) -> Value {
        Value::Array(
            self.causes
                .iter()
                .map(|cause| {
                    let mut entry = Map::new();
                    entry.insert(
                        "error_type".to_owned(),
                        Value::String(cause.error_type.clone()),
                    );
                    entry.insert(
                        "error_message".to_owned(),
                        Value::String(cause.error_message.clone()),
                    );
                    Value::Object(entry)
                })
                .collect(),
        )
    }
}

/// Takes the leading type-ish token out of a `Debug` rendering, e.g.
/// `ParseIntError { kind: InvalidDigit }` becomes `ParseIntError`.
fn type_from_debug(debug: &str) -> String {
    debug
        .split(|c: char| c == '(' || c == '{' || c.is_whitespace())
        .next()
        .unwrap_or(debug)
        .to_owned()
}
