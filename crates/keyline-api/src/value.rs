// Typed field values for the document store wire format.
//
// Every field in a stored document is a one-key object whose key names the
// type: `{"stringValue": "x"}`, `{"integerValue": "42"}`, `{"booleanValue":
// true}`, ... Integers travel as decimal strings. Decoding is lenient:
// unknown tags, empty objects, and malformed scalars become `Value::Null`
// instead of failing the whole document.

use std::collections::BTreeMap;

use chrono::DateTime;
use serde::de::Deserializer;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

/// A single typed scalar as stored in a document field.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    String(String),
    Integer(i64),
    Boolean(bool),
    Double(f64),
    /// RFC 3339 timestamp, kept verbatim.
    Timestamp(String),
    #[default]
    Null,
}

impl Value {
    /// Decode one wire object. Anything unrecognized is `Null`.
    pub fn from_wire(raw: &serde_json::Value) -> Self {
        let Some(obj) = raw.as_object() else {
            return Self::Null;
        };

        if let Some(s) = obj.get("stringValue").and_then(serde_json::Value::as_str) {
            return Self::String(s.to_owned());
        }
        if let Some(v) = obj.get("integerValue") {
            // Wire form is a decimal string; tolerate bare numbers too.
            let parsed = match v {
                serde_json::Value::String(s) => s.trim().parse::<i64>().ok(),
                serde_json::Value::Number(n) => n.as_i64(),
                _ => None,
            };
            return parsed.map_or(Self::Null, Self::Integer);
        }
        if let Some(b) = obj.get("booleanValue").and_then(serde_json::Value::as_bool) {
            return Self::Boolean(b);
        }
        if let Some(d) = obj.get("doubleValue").and_then(serde_json::Value::as_f64) {
            return Self::Double(d);
        }
        if let Some(t) = obj.get("timestampValue").and_then(serde_json::Value::as_str) {
            return Self::Timestamp(t.to_owned());
        }
        Self::Null
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Integer view. Integral doubles are accepted since some writers
    /// store counters as `doubleValue`.
    #[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            Self::Double(d) if d.fract() == 0.0 && d.is_finite() => Some(*d as i64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Epoch milliseconds from an integer, a double, or an RFC 3339 timestamp.
    #[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
    pub fn as_epoch_millis(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            Self::Double(d) if d.is_finite() => Some(d.trunc() as i64),
            Self::Timestamp(t) => DateTime::parse_from_rfc3339(t)
                .ok()
                .map(|dt| dt.timestamp_millis()),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Self::Integer(i64::from(i))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<f64> for Value {
    fn from(d: f64) -> Self {
        Self::Double(d)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        match self {
            Self::String(s) => map.serialize_entry("stringValue", s)?,
            Self::Integer(i) => map.serialize_entry("integerValue", &i.to_string())?,
            Self::Boolean(b) => map.serialize_entry("booleanValue", b)?,
            Self::Double(d) => map.serialize_entry("doubleValue", d)?,
            Self::Timestamp(t) => map.serialize_entry("timestampValue", t)?,
            Self::Null => map.serialize_entry("nullValue", &())?,
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = serde_json::Value::deserialize(deserializer)?;
        Ok(Self::from_wire(&raw))
    }
}

// ── Fields ──────────────────────────────────────────────────────────

/// The field map of a document, ordered by field name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fields(BTreeMap<String, Value>);

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// `true` if the field exists and is not `Null`.
    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some_and(|v| !v.is_null())
    }

    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    pub fn int_field(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_i64)
    }

    pub fn bool_field(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(Value::as_bool)
    }

    pub fn millis_field(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_epoch_millis)
    }

    /// Field names, used to build update masks for partial writes.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Merge `other` into `self`, overwriting fields present in both.
    pub fn merge(&mut self, other: Fields) {
        self.0.extend(other.0);
    }
}

impl FromIterator<(String, Value)> for Fields {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Fields {
    type Item = (String, Value);
    type IntoIter = std::collections::btree_map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
