use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde_json::{Map, Value};

use crate::error_chain::ErrorChain;

/// An immutable snapshot of one completed node in an event tree: its fields,
/// its nested sub-groups, when it started and ended, and the error recorded
/// on it, if any.
///
/// Groups are produced by freezing a live
/// [`EventWriter`](crate::EventWriter) tree when the owning event closes;
/// they are never mutated afterwards. Each group exclusively owns its
/// children, so a frozen tree has no sharing and no back-edges.
#[derive(Debug, Clone)]
pub struct EventGroup {
    fields: Map<String, Value>,
    groups: Vec<(String, EventGroup)>,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    duration: Duration,
    error: Option<ErrorChain>,
}

impl EventGroup {
    pub(crate) fn new(
        fields: Map<String, Value>,
        groups: Vec<(String, EventGroup)>,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        error: Option<ErrorChain>,
    ) -> Self {
        Self {
            fields,
            groups,
            start_time,
            end_time,
            duration: end_time - start_time,
            error,
        }
    }

    /// The fields set directly on this group, in insertion order.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// The nested sub-groups, in creation order.
    pub fn groups(&self) -> impl Iterator<Item = (&str, &EventGroup)> {
        self.groups.iter().map(|(name, group)| (name.as_str(), group))
    }

    /// Looks up a nested sub-group by name.
    pub fn group(&self, group_name: &str) -> Option<&EventGroup> {
        self.groups
            .iter()
            .find(|(name, _)| name == group_name)
            .map(|(_, group)| group)
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    pub fn end_time(&self) -> DateTime<Utc> {
        self.end_time
    }

    /// End time minus start time. Negative only if the wall clock was
    /// adjusted backwards between the two captures; the serialized
    /// `duration_ms` clamps that case to 0.
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Whether an error was recorded on this group.
    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    /// The recorded error's flattened cause chain, if any.
    pub fn error(&self) -> Option<&ErrorChain> {
        self.error.as_ref()
    }

    /// Retrieves a field by dot-separated path, descending into nested JSON
    /// objects. `field("user.name")` finds the `"name"` key inside a
    /// `"user"` object field.
    pub fn field(&self, path: &str) -> Option<&Value> {
        let mut parts = path.split('.');
        let mut current = self.fields.get(parts.next()?)?;
        for part in parts {
            current = current.as_object()?.get(part)?;
        }
        Some(current)
    }

    /// Retrieves a string field by dot-separated path.
    pub fn field_as_str(&self, path: &str) -> Option<&str> {
        self.field(path)?.as_str()
    }

    /// Retrieves an integer field by dot-separated path.
    pub fn field_as_i64(&self, path: &str) -> Option<i64> {
        self.field(path)?.as_i64()
    }

    /// Retrieves a floating-point field by dot-separated path.
    pub fn field_as_f64(&self, path: &str) -> Option<f64> {
        self.field(path)?.as_f64()
    }

    /// Retrieves a boolean field by dot-separated path.
    pub fn field_as_bool(&self, path: &str) -> Option<bool> {
        self.field(path)?.as_bool()
    }

    /// Serializes this group to a JSON object: all fields, each sub-group
    /// recursively under its name, then `start_time`, `end_time`,
    /// `duration_ms`, `error`, and `error_cause` when an error was recorded.
    pub fn to_json(&self) -> Value {
        Value::Object(self.shape())
    }

    // User fields first, reserved keys last, so a field can never shadow a
    // reserved key.
    pub(crate) fn shape(&self) -> Map<String, Value> {
        let mut json = self.fields.clone();

        for (group_name, group) in &self.groups {
            json.insert(group_name.clone(), group.to_json());
        }

        json.insert(
            "start_time".to_owned(),
            Value::String(format_instant(self.start_time)),
        );
        json.insert(
            "end_time".to_owned(),
            Value::String(format_instant(self.end_time)),
        );
        json.insert(
            "duration_ms".to_owned(),
            Value::from(self.duration.num_milliseconds().max(0)),
        );

        match &self.error {
            Some(chain) => {
                json.insert("error".to_owned(), Value::Bool(true));
                json.insert("error_cause".to_owned(), chain.to_json());
            }
            None => {
                json.insert("error".to_owned(), Value::Bool(false));
            }
        }

        json
    }
}

/// ISO-8601 in UTC with millisecond precision, `Z` suffix.
fn format_instant(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod test {
    use chrono::{Duration, TimeZone, Utc};
    use serde_json::{json, Map, Value};

    use super::EventGroup;
    use crate::error_chain::ErrorChain;

    fn fields_of(pairs: &[(&str, Value)]) -> Map<String, Value> {
        pairs
            .iter()
            .map(|(key, value)| ((*key).to_owned(), value.clone()))
            .collect()
    }

    #[test]
    fn shape_carries_fields_groups_and_reserved_keys() {
        let start = Utc.with_ymd_and_hms(2026, 1, 19, 10, 0, 0).unwrap();
        let end = start + Duration::milliseconds(50);

        let child = EventGroup::new(
            fields_of(&[("c", json!(true))]),
            Vec::new(),
            start,
            start + Duration::milliseconds(5),
            None,
        );
        let root = EventGroup::new(
            fields_of(&[("a", json!(1)), ("b", json!("x"))]),
            vec![("c_group".to_owned(), child)],
            start,
            end,
            None,
        );

        let json = root.to_json();
        assert_eq!(1, json["a"].as_i64().expect("a is a number"));
        assert_eq!("x", json["b"].as_str().expect("b is a string"));
        assert_eq!("2026-01-19T10:00:00.000Z", json["start_time"]);
        assert_eq!("2026-01-19T10:00:00.050Z", json["end_time"]);
        assert_eq!(50, json["duration_ms"].as_i64().expect("duration in ms"));
        assert_eq!(false, json["error"]);
        assert!(json.get("error_cause").is_none());

        let nested = &json["c_group"];
        assert_eq!(true, nested["c"]);
        assert_eq!(5, nested["duration_ms"].as_i64().expect("nested duration"));
        assert_eq!(false, nested["error"]);
    }

    #[test]
    fn reserved_keys_beat_user_fields() {
        let start = Utc.with_ymd_and_hms(2026, 1, 19, 10, 0, 0).unwrap();
        let group = EventGroup::new(
            fields_of(&[("error", json!("shadow me")), ("duration_ms", json!(-1))]),
            Vec::new(),
            start,
            start + Duration::milliseconds(7),
            None,
        );

        let json = group.to_json();
        assert_eq!(false, json["error"]);
        assert_eq!(7, json["duration_ms"].as_i64().expect("duration in ms"));
    }

    #[test]
    fn backwards_clock_clamps_duration_to_zero() {
        let start = Utc.with_ymd_and_hms(2026, 1, 19, 10, 0, 0).unwrap();
        let group = EventGroup::new(
            Map::new(),
            Vec::new(),
            start,
            start - Duration::milliseconds(100),
            None,
        );

        assert_eq!(-100, group.duration().num_milliseconds());
        assert_eq!(0, group.to_json()["duration_ms"].as_i64().expect("clamped"));
    }

    #[test]
    fn error_chain_is_shaped_as_cause_array() {
        let parse_error = "x".parse::<i32>().expect_err("x is not a number");
        let start = Utc.with_ymd_and_hms(2026, 1, 19, 10, 0, 0).unwrap();
        let group = EventGroup::new(
            Map::new(),
            Vec::new(),
            start,
            start,
            Some(ErrorChain::capture(&parse_error)),
        );

        let json = group.to_json();
        assert_eq!(true, json["error"]);
        let causes = json["error_cause"].as_array().expect("cause array");
        assert_eq!(1, causes.len());
        assert!(causes[0]["error_type"]
            .as_str()
            .expect("type is a string")
            .contains("ParseIntError"));
    }

    #[test]
    fn dot_path_descends_into_object_fields() {
        let start = Utc.with_ymd_and_hms(2026, 1, 19, 10, 0, 0).unwrap();
        let group = EventGroup::new(
            fields_of(&[
                ("user", json!({"name": "ada", "logins": 3, "admin": true})),
                ("plain", json!("value")),
            ]),
            Vec::new(),
            start,
            start,
            None,
        );

        assert_eq!(Some("ada"), group.field_as_str("user.name"));
        assert_eq!(Some(3), group.field_as_i64("user.logins"));
        assert_eq!(Some(true), group.field_as_bool("user.admin"));
        assert_eq!(Some("value"), group.field_as_str("plain"));
        assert!(group.field("user.missing").is_none());
        assert!(group.field("plain.not_an_object").is_none());
    }
}
