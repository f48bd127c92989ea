//! Schema Registry: table definitions
//!
//! Each table is described by a [`TableDef`]: its ordered field list and its
//! auto-increment counter. Field lists are ordered sets whose first entry is
//! always the reserved [`ID_FIELD`].

use crate::error::{NameKind, StoreError, StoreResult};
use crate::name::{validate_name, ID_FIELD};
use crate::row::RowId;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// FieldList
// =============================================================================

/// Ordered, duplicate-free list of field names, always led by `ID`
///
/// Duplicates keep their first occurrence. A caller-supplied `ID` is dropped
/// and the reserved field is prepended, so
/// `["name", "ID", "age", "name"]` normalizes to `["ID", "name", "age"]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldList(Vec<String>);

impl FieldList {
    /// Build a normalized field list, validating every name
    ///
    /// Fails with `InvalidName` before anything is built if any name is bad.
    pub fn new<I, S>(fields: I) -> StoreResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut list = FieldList(vec![ID_FIELD.to_string()]);
        list.extend(fields)?;
        Ok(list)
    }

    /// Append fields not yet declared, returning the names actually added
    ///
    /// All names are validated first; on error the list is left untouched.
    pub fn extend<I, S>(&mut self, fields: I) -> StoreResult<Vec<String>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let candidates: Vec<S> = fields.into_iter().collect();
        for field in &candidates {
            validate_name(NameKind::Field, field.as_ref())?;
        }

        let mut added = Vec::new();
        for field in candidates {
            let field = field.as_ref();
            if field != ID_FIELD && !self.contains(field) {
                self.0.push(field.to_string());
                added.push(field.to_string());
            }
        }
        Ok(added)
    }

    /// True if `field` is declared
    pub fn contains(&self, field: &str) -> bool {
        self.0.iter().any(|f| f == field)
    }

    /// Field names in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Field names as a slice
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Number of fields, `ID` included
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Never true for a normalized list; present for API symmetry
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Check the persisted form: `ID` first, unique, valid names
    pub(crate) fn check(&self) -> StoreResult<()> {
        if self.0.first().map(String::as_str) != Some(ID_FIELD) {
            return Err(StoreError::corruption("field list does not start with ID"));
        }
        for (i, field) in self.0.iter().enumerate() {
            validate_name(NameKind::Field, field)
                .map_err(|_| StoreError::corruption(format!("invalid field name '{}'", field)))?;
            if self.0[..i].contains(field) {
                return Err(StoreError::corruption(format!(
                    "duplicate field '{}'",
                    field
                )));
            }
        }
        Ok(())
    }
}

// =============================================================================
// TableDef
// =============================================================================

/// Largest value `auto_increment` may hold
///
/// Identifiers are stored in rows as `Int`, so they must fit an `i64`.
pub const MAX_ROW_ID: RowId = i64::MAX as RowId;

/// Definition of a single table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDef {
    /// Declared fields, `ID` first
    pub fields: FieldList,
    /// Next identifier to assign; never decreases except on truncate
    pub auto_increment: RowId,
}

impl TableDef {
    /// New table definition with the counter at 1
    pub fn new(fields: FieldList) -> Self {
        Self {
            fields,
            auto_increment: 1,
        }
    }

    /// Take the next identifier and advance the counter
    ///
    /// Returns `None`, leaving the counter alone, once the counter would
    /// pass [`MAX_ROW_ID`].
    pub fn next_id(&mut self) -> Option<RowId> {
        let id = self.auto_increment;
        self.auto_increment = id.checked_add(1).filter(|next| *next <= MAX_ROW_ID)?;
        Some(id)
    }
}

// =============================================================================
// AlterDefaults
// =============================================================================

/// Values given to existing rows for fields added by `alter_table`
#[derive(Debug, Clone, Default, PartialEq)]
pub enum AlterDefaults {
    /// Existing rows are left without the new fields
    #[default]
    Unset,
    /// Every new field gets this value
    All(Value),
    /// Per-field values; new fields absent from the map get `Null`
    PerField(BTreeMap<String, Value>),
}

impl AlterDefaults {
    /// Default for `field`, or `None` when defaults are unset
    pub fn value_for(&self, field: &str) -> Option<Value> {
        match self {
            AlterDefaults::Unset => None,
            AlterDefaults::All(v) => Some(v.clone()),
            AlterDefaults::PerField(map) => Some(map.get(field).cloned().unwrap_or(Value::Null)),
        }
    }
}

impl From<Value> for AlterDefaults {
    fn from(v: Value) -> Self {
        AlterDefaults::All(v)
    }
}

impl From<BTreeMap<String, Value>> for AlterDefaults {
    fn from(map: BTreeMap<String, Value>) -> Self {
        AlterDefaults::PerField(map)
    }
}

// =============================================================================
// SchemaRegistry
// =============================================================================

/// All table definitions of a database, keyed by table name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaRegistry(BTreeMap<String, TableDef>);

impl SchemaRegistry {
    /// Register a new table
    ///
    /// Validates the table name, then rejects duplicates.
    pub fn create(&mut self, name: &str, fields: FieldList) -> StoreResult<&TableDef> {
        validate_name(NameKind::Table, name)?;
        if self.0.contains_key(name) {
            return Err(StoreError::DuplicateTable(name.to_string()));
        }
        let def = self
            .0
            .entry(name.to_string())
            .or_insert_with(|| TableDef::new(fields));
        Ok(&*def)
    }

    /// Remove a table definition
    pub fn remove(&mut self, name: &str) -> Option<TableDef> {
        self.0.remove(name)
    }

    /// Definition of `name`
    pub fn get(&self, name: &str) -> Option<&TableDef> {
        self.0.get(name)
    }

    /// Mutable definition of `name`
    pub fn get_mut(&mut self, name: &str) -> Option<&mut TableDef> {
        self.0.get_mut(name)
    }

    /// Definition of `name` or `TableNotFound`
    pub fn require(&self, name: &str) -> StoreResult<&TableDef> {
        self.get(name)
            .ok_or_else(|| StoreError::TableNotFound(name.to_string()))
    }

    /// True if `name` is registered
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Number of tables
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if no table is registered
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Table names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// `(name, definition)` pairs in sorted order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TableDef)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}
