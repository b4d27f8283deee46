use std::ops::{Deref, DerefMut};

use serde_json::Value;
use uuid::Uuid;

use crate::emitter::Emitter;
use crate::event_group::EventGroup;
use crate::event_writer::EventWriter;

/// The live top of an event tree, handed out by
/// [`Emitter::event`](crate::Emitter::event).
///
/// An `Event` is an [`EventWriter`] (via deref) carrying a per-emitter
/// sequence id and a random instance id, both assigned at construction.
/// Closing it, explicitly via [`close`](Self::close) or implicitly when it
/// drops, freezes the tree and runs the emit pipeline synchronously before
/// returning; the drop path guarantees the event is timed and emitted on
/// every exit, including panics and early returns. Either way, emission
/// happens exactly once.
pub struct Event<'a> {
    emitter: &'a Emitter,
    sequence_id: u64,
    instance_id: Uuid,
    writer: EventWriter,
    emitted: bool,
}

impl<'a> Event<'a> {
    pub(crate) fn begin(emitter: &'a Emitter, sequence_id: u64) -> Self {
        Self {
            emitter,
            sequence_id,
            instance_id: Uuid::new_v4(),
            writer: EventWriter::new(),
            emitted: false,
        }
    }

    /// This event's position in its emitter's sequence, starting at 0.
    pub fn sequence_id(&self) -> u64 {
        self.sequence_id
    }

    /// This event's globally unique random identifier.
    pub fn instance_id(&self) -> Uuid {
        self.instance_id
    }

    /// Closes the event: records the end time, freezes the tree, and hands
    /// the finished event to the emitter's pipeline. Complete when this
    /// returns.
    pub fn close(mut self) {
        self.finish();
    }

    fn finish(&mut self) {
        if self.emitted {
            return;
        }
        self.emitted = true;

        self.writer.close();
        let root = self.writer.freeze();
        let finished = FinishedEvent {
            emitter_name: self.emitter.name().to_owned(),
            sequence_id: self.sequence_id,
            instance_id: self.instance_id,
            root,
        };
        self.emitter.emit(&finished);
    }
}

impl Deref for Event<'_> {
    type Target = EventWriter;

    fn deref(&self) -> &EventWriter {
        &self.writer
    }
}

impl DerefMut for Event<'_> {
    fn deref_mut(&mut self) -> &mut EventWriter {
        &mut self.writer
    }
}

impl Drop for Event<'_> {
    fn drop(&mut self) {
        self.finish();
    }
}

/// A closed, frozen event: the root [`EventGroup`] (via deref) plus the
/// identity assigned by the emitter.
///
/// This is what filter functions inspect and what sinks receive. Sinks
/// borrow it only for the duration of their `write` call.
#[derive(Debug, Clone)]
pub struct FinishedEvent {
    emitter_name: String,
    sequence_id: u64,
    instance_id: Uuid,
    root: EventGroup,
}

impl FinishedEvent {
    /// The name of the emitter that produced this event.
    pub fn emitter_name(&self) -> &str {
        &self.emitter_name
    }

    /// The per-emitter sequence id, dense from 0.
    pub fn sequence_id(&self) -> u64 {
        self.sequence_id
    }

    /// The globally unique random identifier.
    pub fn instance_id(&self) -> Uuid {
        self.instance_id
    }

    /// Serializes the whole event: the root group's shape plus, at the top
    /// level only, `emitter_name`, `local_id`, and `id` (hyphenated UUID).
    pub fn to_json(&self) -> Value {
        let mut json = self.root.shape();
        json.insert(
            "emitter_name".to_owned(),
            Value::String(self.emitter_name.clone()),
        );
        json.insert("local_id".to_owned(), Value::from(self.sequence_id));
        json.insert("id".to_owned(), Value::String(self.instance_id.to_string()));
        Value::Object(json)
    }

    /// One compact JSON line, no trailing newline.
    pub fn to_json_string(&self) -> String {
        self.to_json().to_string()
    }

    #[cfg(test)]
    pub(crate) fn for_test(
        emitter_name: &str,
        sequence_id: u64,
        fields: serde_json::Map<String, Value>,
    ) -> Self {
        let mut writer = EventWriter::new();
        for (key, value) in fields {
            writer.set(key, value);
        }
        Self {
            emitter_name: emitter_name.to_owned(),
            sequence_id,
            instance_id: Uuid::new_v4(),
            root: writer.freeze(),
        }
    }
}

impl Deref for FinishedEvent {
    type Target = EventGroup;

    fn deref(&self) -> &EventGroup {
        &self.root
    }
}

#[cfg(test)]
mod test {
    use serde_json::Map;

    use super::FinishedEvent;

    #[test]
    fn identity_keys_are_emitted_at_top_level() {
        let event = FinishedEvent::for_test("requests", 7, Map::new());
        let json = event.to_json();

        assert_eq!("requests", json["emitter_name"]);
        assert_eq!(7, json["local_id"].as_u64().expect("local_id is a number"));
        let id = json["id"].as_str().expect("id is a string");
        assert_eq!(36, id.len());
        assert_eq!(4, id.matches('-').count());
    }

    #[test]
    fn json_line_is_compact() {
        let mut fields = Map::new();
        fields.insert("path".to_owned(), "/api/users".into());
        let event = FinishedEvent::for_test("requests", 0, fields);

        let line = event.to_json_string();
        assert!(!line.contains('\n'));
        let parsed: serde_json::Value =
            serde_json::from_str(&line).expect("line is valid JSON");
        assert_eq!("/api/users", parsed["path"]);
    }
}
