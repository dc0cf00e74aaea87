//! Records and selection values
//!
//! Target-collection rows are opaque JSON objects. The engine only reads them:
//! identity lookup, fallback text and template arguments.

use association_picker_fields::DEFAULT_KEY;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One row from a collection. Treated as an immutable snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

/// The record that owns the association field. Absent for unsaved records.
pub type OwningRecord = Record;

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a JSON value; only objects are records.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// The value under `key` unless it is missing or null.
    pub fn present(&self, key: &str) -> Option<&Value> {
        self.0.get(key).filter(|v| !v.is_null())
    }

    /// Identity under `key`, falling back to `id`.
    pub fn identity(&self, key: &str) -> Option<&Value> {
        self.present(key).or_else(|| self.present(DEFAULT_KEY))
    }

    /// Whether both records carry the same identity. Records without one never match.
    pub fn same_identity(&self, other: &Record, key: &str) -> bool {
        match (self.identity(key), other.identity(key)) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    /// First field in `keys` holding a present, non-empty value, as text.
    pub fn first_text(&self, keys: &[&str]) -> Option<String> {
        keys.iter()
            .filter_map(|key| self.present(key))
            .find(|value| value.as_str() != Some(""))
            .map(display_text)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }
}

impl From<Map<String, Value>> for Record {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Plain text for a JSON scalar: strings unquoted, everything else as JSON.
pub fn display_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// The externally owned field value.
///
/// Serializes as `null`, a single object, or an array of objects.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SelectionValue {
    #[default]
    Empty,
    Single(Record),
    Multiple(Vec<Record>),
}

impl SelectionValue {
    /// Lenient conversion from host JSON. Non-object array members are skipped
    /// and anything that is not an object or array is empty.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Object(map) => Self::Single(Record(map.clone())),
            Value::Array(items) => Self::Multiple(
                items
                    .iter()
                    .filter_map(|item| Record::from_value(item.clone()))
                    .collect(),
            ),
            _ => Self::Empty,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Self::Empty => Value::Null,
            Self::Single(record) => record.to_value(),
            Self::Multiple(records) => Value::Array(records.iter().map(Record::to_value).collect()),
        }
    }

    /// The records this value holds, in order.
    pub fn records(&self) -> &[Record] {
        match self {
            Self::Empty => &[],
            Self::Single(record) => std::slice::from_ref(record),
            Self::Multiple(records) => records,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.records().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        Record::from_value(value).unwrap()
    }

    #[test]
    fn identity_prefers_target_key() {
        let r = record(json!({"id": 1, "uuid": "a-1"}));
        assert_eq!(r.identity("uuid"), Some(&json!("a-1")));
        assert_eq!(r.identity("id"), Some(&json!(1)));
    }

    #[test]
    fn identity_falls_back_to_id() {
        let r = record(json!({"id": 3, "uuid": null}));
        assert_eq!(r.identity("uuid"), Some(&json!(3)));
        assert_eq!(Record::new().identity("id"), None);
    }

    #[test]
    fn records_without_identity_never_match() {
        let a = record(json!({"name": "Ann"}));
        let b = record(json!({"name": "Ann"}));
        assert!(!a.same_identity(&b, "id"));
        assert!(record(json!({"id": 1})).same_identity(&record(json!({"id": 1, "x": 2})), "id"));
    }

    #[test]
    fn first_text_skips_null_and_empty() {
        let r = record(json!({"name": "", "title": null, "label": "L", "id": 9}));
        assert_eq!(r.first_text(&["name", "title", "label", "id"]), Some("L".to_string()));
        assert_eq!(r.first_text(&["id"]), Some("9".to_string()));
        assert_eq!(r.first_text(&["missing"]), None);
    }

    #[test]
    fn selection_value_from_json() {
        assert_eq!(SelectionValue::from_json(&Value::Null), SelectionValue::Empty);
        assert_eq!(SelectionValue::from_json(&json!("text")), SelectionValue::Empty);

        let single = SelectionValue::from_json(&json!({"id": 1}));
        assert_eq!(single.records().len(), 1);

        let multiple = SelectionValue::from_json(&json!([{"id": 1}, 2, {"id": 3}]));
        assert_eq!(multiple.records().len(), 2);
        assert!(SelectionValue::Multiple(vec![]).is_empty());
    }

    #[test]
    fn selection_value_serde_shape() {
        let value: SelectionValue = serde_json::from_value(json!(null)).unwrap();
        assert_eq!(value, SelectionValue::Empty);

        let value: SelectionValue = serde_json::from_value(json!([{"id": 1}])).unwrap();
        assert_eq!(value.to_json(), json!([{"id": 1}]));
        assert_eq!(serde_json::to_value(&value).unwrap(), json!([{"id": 1}]));
    }
}
