//! Row Store: per-table identifier → row mappings
//!
//! Rows are kept in a `BTreeMap` keyed by numeric [`RowId`], so iteration is
//! always in ascending identifier order and identifier equality is numeric.
//!
//! The two schema-driven helpers live here too:
//! - [`valid_fields`]: keep only declared fields, in declaration order
//! - [`validate_data`]: every declared field present, `Null` for gaps

use crate::error::{StoreError, StoreResult};
use crate::row::{Row, RowId};
use crate::schema::TableDef;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Rows of one table
pub type TableRows = BTreeMap<RowId, Row>;

/// Keep only the declared fields of `data`, in the table's field order
pub fn valid_fields(def: &TableDef, data: &Row) -> Row {
    def.fields
        .iter()
        .filter_map(|field| data.get(field).map(|v| (field, v.clone())))
        .collect()
}

/// Build a row carrying every declared field, `Null` where `data` has none
///
/// Undeclared keys in `data` are dropped, so every row in a table has the
/// same key set.
pub fn validate_data(def: &TableDef, data: &Row) -> Row {
    def.fields
        .iter()
        .map(|field| (field, data.get(field).cloned().unwrap_or(Value::Null)))
        .collect()
}

/// Row data of all tables, keyed by table name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowStore(BTreeMap<String, TableRows>);

impl RowStore {
    /// Start an empty row set for `table`
    pub fn add_table(&mut self, table: &str) {
        self.0.entry(table.to_string()).or_default();
    }

    /// Forget `table` and all of its rows
    pub fn remove_table(&mut self, table: &str) -> Option<TableRows> {
        self.0.remove(table)
    }

    /// Rows of `table`
    pub fn rows(&self, table: &str) -> Option<&TableRows> {
        self.0.get(table)
    }

    /// Rows of `table` or `TableNotFound`
    pub fn require(&self, table: &str) -> StoreResult<&TableRows> {
        self.rows(table)
            .ok_or_else(|| StoreError::TableNotFound(table.to_string()))
    }

    /// Mutable rows of `table` or `TableNotFound`
    pub fn require_mut(&mut self, table: &str) -> StoreResult<&mut TableRows> {
        self.0
            .get_mut(table)
            .ok_or_else(|| StoreError::TableNotFound(table.to_string()))
    }

    /// Number of rows in `table` (0 if unknown)
    pub fn count(&self, table: &str) -> usize {
        self.rows(table).map_or(0, BTreeMap::len)
    }

    /// Identifiers of `table` in ascending order
    pub fn ids(&self, table: &str) -> Vec<RowId> {
        self.rows(table)
            .map(|rows| rows.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Remove the given rows, skipping identifiers that are not present
    ///
    /// Returns how many rows were actually removed.
    pub fn delete(&mut self, table: &str, ids: &[RowId]) -> StoreResult<usize> {
        let rows = self.require_mut(table)?;
        Ok(ids.iter().filter(|id| rows.remove(*id).is_some()).count())
    }

    /// Table names that hold row data
    pub fn tables(&self) -> impl Iterator<Item = (&str, &TableRows)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}
