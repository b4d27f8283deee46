use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::error_chain::ErrorChain;
use crate::event_group::EventGroup;

/// A mutable builder for one in-progress node of an event tree.
///
/// The start time is stamped when the writer is created; the end time when it
/// is first closed. Writers own their children exclusively: a single unit of
/// work mutates its tree from one thread at a time.
///
/// Most writers are obtained through [`group`](Self::group) on a parent, or
/// as the top-level [`Event`](crate::Event) handed out by an emitter.
#[derive(Debug)]
pub struct EventWriter {
    fields: Map<String, Value>,
    groups: Vec<(String, EventWriter)>,
    start_time: DateTime<Utc>,
    end_time: Option<DateTime<Utc>>,
    error: Option<ErrorChain>,
}

impl EventWriter {
    pub(crate) fn new() -> Self {
        Self {
            fields: Map::new(),
            groups: Vec::new(),
            start_time: Utc::now(),
            end_time: None,
            error: None,
        }
    }

    /// Sets a field, overwriting any previous value under the same name.
    pub fn set(&mut self, field_name: impl Into<String>, value: impl IntoFieldValue) -> &mut Self {
        self.fields.insert(field_name.into(), value.into_field_value());
        self
    }

    /// Returns the child writer for `group_name`, creating it on first
    /// access. Repeated calls with the same name return the same child, so a
    /// group can be accumulated into from several call sites.
    ///
    /// The child's start time is the first access; close it explicitly, or
    /// leave it to be closed when the event freezes. For scope-shaped timing
    /// use [`with_group`](Self::with_group).
    pub fn group(&mut self, group_name: &str) -> &mut EventWriter {
        let index = match self.groups.iter().position(|(name, _)| name == group_name) {
            Some(index) => index,
            None => {
                self.groups.push((group_name.to_owned(), EventWriter::new()));
                self.groups.len() - 1
            }
        };
        &mut self.groups[index].1
    }

    /// Runs `f` against the child writer for `group_name` and closes the
    /// child when the call exits, on every exit path. Timing is identical to
    /// opening the group manually and closing it when done.
    pub fn with_group<R>(
        &mut self,
        group_name: &str,
        f: impl FnOnce(&mut EventWriter) -> R,
    ) -> R {
        struct CloseOnExit<'a>(&'a mut EventWriter);
        impl Drop for CloseOnExit<'_> {
            fn drop(&mut self) {
                self.0.close();
            }
        }

        let mut scope = CloseOnExit(self.group(group_name));
        f(&mut *scope.0)
    }

    /// Records an error on this writer, capturing its full cause chain as
    /// data. A second call replaces the first; a writer carries at most one
    /// error.
    pub fn error<E: std::error::Error + ?Sized>(&mut self, error: &E) -> &mut Self {
        self.error = Some(ErrorChain::capture(error));
        self
    }

    /// Records the end time. Only the first close counts; re-closing never
    /// extends a measured duration.
    pub fn close(&mut self) {
        if self.end_time.is_none() {
            self.end_time = Some(Utc::now());
        }
    }

    /// When this writer was created.
    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    /// When this writer was closed, if it has been.
    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.end_time
    }

    /// Whether an error has been recorded on this writer.
    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    // Converts this writer and all of its children into frozen groups,
    // draining the accumulated data. Any writer never explicitly closed gets
    // the freeze instant as its end time, so every frozen node has a defined
    // duration.
    pub(crate) fn freeze(&mut self) -> EventGroup {
        let end_time = self.end_time.unwrap_or_else(Utc::now);
        let groups = std::mem::take(&mut self.groups)
            .into_iter()
            .map(|(name, mut child)| (name, child.freeze()))
            .collect();

        EventGroup::new(
            std::mem::take(&mut self.fields),
            groups,
            self.start_time,
            end_time,
            self.error.take(),
        )
    }
}

/// Conversion into a JSON field value, covering the kinds an event field
/// accepts: strings, characters (one-character strings), booleans, numbers,
/// and pre-built [`serde_json::Value`] trees for nested structures.
///
/// Anything else is a compile error at the call site.
pub trait IntoFieldValue {
    fn into_field_value(self) -> Value;
}

impl IntoFieldValue for Value {
    fn into_field_value(self) -> Value {
        self
    }
}

impl IntoFieldValue for String {
    fn into_field_value(self) -> Value {
        Value::String(self)
    }
}

impl IntoFieldValue for &str {
    fn into_field_value(self) -> Value {
        Value::String(self.to_owned())
    }
}

impl IntoFieldValue for char {
    fn into_field_value(self) -> Value {
        Value::String(self.to_string())
    }
}

impl IntoFieldValue for bool {
    fn into_field_value(self) -> Value {
        Value::Bool(self)
    }
}

macro_rules! numeric_field_value {
    ($($numeric:ty),* $(,)?) => {
        $(
            impl IntoFieldValue for $numeric {
                fn into_field_value(self) -> Value {
                    Value::from(self)
                }
            }
        )*
    };
}

numeric_field_value!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);
