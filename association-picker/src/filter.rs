//! Filter expression tree
//!
//! Serializes to the remote list filter shape:
//!
//! ```text
//! {"$and": [..]}  {"$or": [..]}
//! {"<field>": {"$eq": <value>}}
//! {"<field>": {"$is": null}}
//! {"<field>": {"$includes": "<text>"}}
//! ```
//!
//! Host-supplied filters that use other operators are kept verbatim as
//! [`Filter::Raw`] so they pass through untouched.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{json, Map, Value};

use crate::record::{display_text, Record};

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Field { field: String, condition: Condition },
    /// An expression this tree does not model, passed through as-is.
    Raw(Value),
}

/// A condition on a single field.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Eq(Value),
    IsNull,
    Includes(String),
}

impl Filter {
    pub fn and(filters: Vec<Filter>) -> Self {
        Self::And(filters)
    }

    pub fn or(filters: Vec<Filter>) -> Self {
        Self::Or(filters)
    }

    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Field {
            field: field.into(),
            condition: Condition::Eq(value.into()),
        }
    }

    pub fn is_null(field: impl Into<String>) -> Self {
        Self::Field {
            field: field.into(),
            condition: Condition::IsNull,
        }
    }

    pub fn includes(field: impl Into<String>, text: impl Into<String>) -> Self {
        Self::Field {
            field: field.into(),
            condition: Condition::Includes(text.into()),
        }
    }

    /// A raw `null` or `{}` carries no constraint.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Raw(Value::Null) => true,
            Self::Raw(Value::Object(map)) => map.is_empty(),
            _ => false,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Self::And(items) => json!({ "$and": items.iter().map(Filter::to_json).collect::<Vec<_>>() }),
            Self::Or(items) => json!({ "$or": items.iter().map(Filter::to_json).collect::<Vec<_>>() }),
            Self::Field { field, condition } => {
                let mut map = Map::new();
                map.insert(field.clone(), condition.to_json());
                Value::Object(map)
            }
            Self::Raw(value) => value.clone(),
        }
    }

    /// Parse the JSON filter shape. Anything unrecognized becomes [`Filter::Raw`].
    pub fn from_json(value: &Value) -> Self {
        let Some((key, inner)) = single_entry(value) else {
            return Self::Raw(value.clone());
        };

        match (key.as_str(), inner) {
            ("$and", Value::Array(items)) => Self::And(items.iter().map(Filter::from_json).collect()),
            ("$or", Value::Array(items)) => Self::Or(items.iter().map(Filter::from_json).collect()),
            (field, _) if !field.starts_with('$') => match Condition::from_json(inner) {
                Some(condition) => Self::Field {
                    field: field.to_string(),
                    condition,
                },
                None => Self::Raw(value.clone()),
            },
            _ => Self::Raw(value.clone()),
        }
    }

    /// Evaluate against a record, the way a simple list backend would.
    ///
    /// `$includes` is a case-insensitive substring match over the field's text;
    /// raw expressions are not interpreted and match everything.
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            Self::And(items) => items.iter().all(|f| f.matches(record)),
            Self::Or(items) => items.iter().any(|f| f.matches(record)),
            Self::Field { field, condition } => condition.matches(record.present(field)),
            Self::Raw(_) => true,
        }
    }
}

impl Condition {
    fn to_json(&self) -> Value {
        match self {
            Self::Eq(value) => json!({ "$eq": value }),
            Self::IsNull => json!({ "$is": null }),
            Self::Includes(text) => json!({ "$includes": text }),
        }
    }

    fn from_json(value: &Value) -> Option<Self> {
        let (op, operand) = single_entry(value)?;
        match (op.as_str(), operand) {
            ("$eq", v) => Some(Self::Eq(v.clone())),
            ("$is", Value::Null) => Some(Self::IsNull),
            ("$includes", Value::String(s)) => Some(Self::Includes(s.clone())),
            _ => None,
        }
    }

    fn matches(&self, value: Option<&Value>) -> bool {
        match (self, value) {
            (Self::IsNull, value) => value.is_none(),
            (Self::Eq(expected), Some(actual)) => json_eq(expected, actual),
            (Self::Includes(needle), Some(actual)) => display_text(actual)
                .to_lowercase()
                .contains(&needle.to_lowercase()),
            (_, None) => false,
        }
    }
}

/// Equality that treats `7` and `7.0` as the same number.
fn json_eq(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

fn single_entry(value: &Value) -> Option<(&String, &Value)> {
    match value {
        Value::Object(map) if map.len() == 1 => map.iter().next(),
        _ => None,
    }
}

impl std::fmt::Display for Filter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

impl Serialize for Filter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Filter {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::from_json(&value))
    }
}
