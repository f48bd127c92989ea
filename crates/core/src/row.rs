//! Row type: an ordered field → value record
//!
//! A `Row` keeps its fields in insertion order. Rows stored in a table are
//! always re-built in the table's declared field order, so iteration and
//! serialization follow the schema.

use crate::error::{StoreError, StoreResult};
use crate::name::ID_FIELD;
use crate::value::{Value, NULL};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Row identifier, unique within a table and never reused
pub type RowId = u64;

/// Ordered mapping from field name to value
///
/// # Example
///
/// ```
/// use tablestore_core::{Row, Value};
///
/// let row = Row::new().with("name", "Ana").with("age", 30);
/// assert_eq!(row.get("name"), Some(&Value::from("Ana")));
/// assert_eq!(row.keys().collect::<Vec<_>>(), vec!["name", "age"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    fields: Vec<(String, Value)>,
}

impl Row {
    /// Create an empty row
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty row with room for `n` fields
    pub fn with_capacity(n: usize) -> Self {
        Self {
            fields: Vec::with_capacity(n),
        }
    }

    /// Builder-style `set`
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(field, value);
        self
    }

    /// Value of `field`, if present
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(k, _)| k == field)
            .map(|(_, v)| v)
    }

    /// Value of `field`, treating a missing field as `Null`
    pub fn get_or_null(&self, field: &str) -> &Value {
        self.get(field).unwrap_or(&NULL)
    }

    /// Set `field`, replacing in place if present or appending otherwise
    ///
    /// Returns the previous value.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let field = field.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == field) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.fields.push((field, value));
                None
            }
        }
    }

    /// Remove `field`, returning its value
    pub fn remove(&mut self, field: &str) -> Option<Value> {
        let pos = self.fields.iter().position(|(k, _)| k == field)?;
        Some(self.fields.remove(pos).1)
    }

    /// True if the row carries `field`
    pub fn contains(&self, field: &str) -> bool {
        self.fields.iter().any(|(k, _)| k == field)
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True if the row has no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Field names in order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    /// `(field, value)` pairs in order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// The row's `ID` field as an identifier
    ///
    /// `None` if the field is missing or not a positive integer.
    pub fn id(&self) -> Option<RowId> {
        match self.get(ID_FIELD) {
            Some(Value::Int(i)) if *i > 0 => Some(*i as RowId),
            _ => None,
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (k, v) in iter {
            row.set(k, v);
        }
        row
    }
}

impl IntoIterator for Row {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

impl TryFrom<serde_json::Value> for Row {
    type Error = StoreError;

    fn try_from(value: serde_json::Value) -> StoreResult<Self> {
        match value {
            serde_json::Value::Object(obj) => Ok(obj
                .into_iter()
                .map(|(k, v)| (k, Value::from(v)))
                .collect()),
            other => Err(StoreError::data_shape(format!(
                "expected an object, found {}",
                other
            ))),
        }
    }
}

impl From<Row> for serde_json::Value {
    fn from(row: Row) -> Self {
        serde_json::Value::Object(
            row.into_iter()
                .map(|(k, v)| (k, serde_json::Value::from(v)))
                .collect(),
        )
    }
}

// ============================================================================
// Serde: a row is a plain map, written in field order
// ============================================================================

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (k, v) in &self.fields {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

struct RowVisitor;

impl<'de> Visitor<'de> for RowVisitor {
    type Value = Row;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of field names to values")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Row, A::Error> {
        let mut row = Row::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((k, v)) = access.next_entry::<String, Value>()? {
            row.set(k, v);
        }
        Ok(row)
    }
}

impl<'de> Deserialize<'de> for Row {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(RowVisitor)
    }
}
