//! The runtime value flowing through I/O values during evaluation.

use std::collections::HashMap;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Snapshot of currently-known I/O values, keyed by I/O value id.
pub type ValueMap = HashMap<Uuid, IoValue>;

/// The value carried by one I/O value.
///
/// A closed sum over the JSON-representable shapes: backends and callers
/// pattern-match on this instead of coercing dynamically. `Number` uses
/// `OrderedFloat` so the enum stays `Eq`.
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Debug, Default)]
#[serde(untagged)]
pub enum IoValue {
    #[default]
    Null,
    Boolean(bool),
    Integer(i64),
    Number(OrderedFloat<f64>),
    String(String),
    Array(Vec<IoValue>),
    Map(HashMap<String, IoValue>),
}

impl IoValue {
    /// Numeric view: `Number` and `Integer` both count.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            IoValue::Number(n) => Some(n.into_inner()),
            IoValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            IoValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            IoValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            IoValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, IoValue::Null)
    }

    /// Truthiness used by the expression runtime: `Null`, `false`, zero and
    /// empty collections are falsy.
    pub fn truthy(&self) -> bool {
        match self {
            IoValue::Null => false,
            IoValue::Boolean(b) => *b,
            IoValue::Integer(i) => *i != 0,
            IoValue::Number(n) => n.into_inner() != 0.0,
            IoValue::String(s) => !s.is_empty(),
            IoValue::Array(a) => !a.is_empty(),
            IoValue::Map(m) => !m.is_empty(),
        }
    }
}

impl From<f64> for IoValue {
    fn from(value: f64) -> Self {
        IoValue::Number(OrderedFloat(value))
    }
}

impl From<i64> for IoValue {
    fn from(value: i64) -> Self {
        IoValue::Integer(value)
    }
}

impl From<bool> for IoValue {
    fn from(value: bool) -> Self {
        IoValue::Boolean(value)
    }
}

impl From<&str> for IoValue {
    fn from(value: &str) -> Self {
        IoValue::String(value.to_string())
    }
}

impl From<String> for IoValue {
    fn from(value: String) -> Self {
        IoValue::String(value)
    }
}

impl From<serde_json::Value> for IoValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => IoValue::Null,
            serde_json::Value::Bool(b) => IoValue::Boolean(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    IoValue::Integer(i)
                } else if let Some(u) = n.as_u64() {
                    IoValue::Integer(u as i64)
                } else {
                    IoValue::Number(OrderedFloat(n.as_f64().unwrap_or(0.0)))
                }
            }
            serde_json::Value::String(s) => IoValue::String(s),
            serde_json::Value::Array(arr) => {
                IoValue::Array(arr.into_iter().map(IoValue::from).collect())
            }
            serde_json::Value::Object(map) => IoValue::Map(
                map.into_iter()
                    .map(|(k, v)| (k, IoValue::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<&IoValue> for serde_json::Value {
    fn from(value: &IoValue) -> Self {
        match value {
            IoValue::Null => serde_json::Value::Null,
            IoValue::Boolean(b) => serde_json::Value::Bool(*b),
            IoValue::Integer(i) => serde_json::Value::from(*i),
            IoValue::Number(n) => serde_json::Value::from(n.into_inner()),
            IoValue::String(s) => serde_json::Value::String(s.clone()),
            IoValue::Array(arr) => {
                serde_json::Value::Array(arr.iter().map(serde_json::Value::from).collect())
            }
            IoValue::Map(map) => serde_json::Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), serde_json::Value::from(v)))
                    .collect(),
            ),
        }
    }
}
