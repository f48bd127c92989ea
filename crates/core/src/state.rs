//! DatabaseState: the combined Schema Registry + Row Store
//!
//! This is the value that gets persisted as one blob:
//!
//! ```json
//! {
//!   "tables": { "people": { "fields": ["ID", "name"], "auto_increment": 3 } },
//!   "data":   { "people": { "1": { "ID": 1, "name": "Ana" } } }
//! }
//! ```
//!
//! Every mutation here keeps `tables` and `data` keyed by the same table
//! names. Operations return `TableNotFound` for unknown tables, but callers
//! are expected to check existence before acting.

use crate::error::{StoreError, StoreResult};
use crate::name::ID_FIELD;
use crate::row::{Row, RowId};
use crate::rows::{valid_fields, validate_data, RowStore, TableRows};
use crate::schema::{AlterDefaults, FieldList, SchemaRegistry, TableDef, MAX_ROW_ID};
use crate::value::Value;
use serde::{Deserialize, Serialize};

/// In-memory image of a whole database
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatabaseState {
    tables: SchemaRegistry,
    data: RowStore,
}

impl DatabaseState {
    /// Empty database
    pub fn new() -> Self {
        Self::default()
    }

    /// Table definitions
    pub fn tables(&self) -> &SchemaRegistry {
        &self.tables
    }

    /// Row data
    pub fn data(&self) -> &RowStore {
        &self.data
    }

    /// Definition of `table` or `TableNotFound`
    pub fn table(&self, table: &str) -> StoreResult<&TableDef> {
        self.tables.require(table)
    }

    /// Rows of `table` or `TableNotFound`
    pub fn rows(&self, table: &str) -> StoreResult<&TableRows> {
        self.data.require(table)
    }

    // ========================================================================
    // Schema operations
    // ========================================================================

    /// Create `table` with a normalized field list and no rows
    pub fn create_table(&mut self, table: &str, fields: FieldList) -> StoreResult<()> {
        self.tables.create(table, fields)?;
        self.data.add_table(table);
        Ok(())
    }

    /// Remove `table`'s definition and rows
    pub fn drop_table(&mut self, table: &str) -> StoreResult<()> {
        self.tables
            .remove(table)
            .ok_or_else(|| StoreError::TableNotFound(table.to_string()))?;
        self.data.remove_table(table);
        Ok(())
    }

    /// Clear all rows of `table` and reset its counter to 1
    pub fn truncate(&mut self, table: &str) -> StoreResult<()> {
        let def = self
            .tables
            .get_mut(table)
            .ok_or_else(|| StoreError::TableNotFound(table.to_string()))?;
        let rows = self.data.require_mut(table)?;
        def.auto_increment = 1;
        rows.clear();
        Ok(())
    }

    /// Append fields to `table`, filling existing rows from `defaults`
    ///
    /// Returns the fields actually added (already-declared names and `ID`
    /// are skipped).
    pub fn alter_table<I, S>(
        &mut self,
        table: &str,
        new_fields: I,
        defaults: &AlterDefaults,
    ) -> StoreResult<Vec<String>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let def = self
            .tables
            .get_mut(table)
            .ok_or_else(|| StoreError::TableNotFound(table.to_string()))?;
        let rows = self.data.require_mut(table)?;
        let added = def.fields.extend(new_fields)?;

        if !matches!(defaults, AlterDefaults::Unset) {
            for row in rows.values_mut() {
                for field in &added {
                    if let Some(value) = defaults.value_for(field) {
                        row.set(field.clone(), value);
                    }
                }
            }
        }
        Ok(added)
    }

    // ========================================================================
    // Row operations
    // ========================================================================

    /// Insert `data` into `table`, returning the assigned identifier
    ///
    /// The row is populated with every declared field (`Null` for gaps),
    /// undeclared keys are dropped and any caller-supplied `ID` is replaced.
    pub fn insert(&mut self, table: &str, data: &Row) -> StoreResult<RowId> {
        let def = self
            .tables
            .get_mut(table)
            .ok_or_else(|| StoreError::TableNotFound(table.to_string()))?;
        let rows = self.data.require_mut(table)?;

        let id = def
            .next_id()
            .ok_or_else(|| StoreError::IdsExhausted(table.to_string()))?;
        let mut row = validate_data(def, data);
        row.set(ID_FIELD, Value::from(id));
        rows.insert(id, row);
        Ok(id)
    }

    /// Merge-update the given rows of `table`
    ///
    /// `update_fn` receives a copy of each row. `None` or an empty row leaves
    /// the row untouched and uncounted. Otherwise the returned fields (minus
    /// `ID`) overwrite the stored ones and the result is reduced to declared
    /// fields. Identifiers with no row are skipped.
    pub fn update<F>(&mut self, table: &str, ids: &[RowId], mut update_fn: F) -> StoreResult<usize>
    where
        F: FnMut(Row) -> Option<Row>,
    {
        let def = self.tables.require(table)?;
        let rows = self.data.require_mut(table)?;

        let mut updated = 0;
        for id in ids {
            let Some(existing) = rows.get_mut(id) else {
                continue;
            };
            let Some(mut changes) = update_fn(existing.clone()).filter(|r| !r.is_empty()) else {
                continue;
            };
            changes.remove(ID_FIELD);

            let mut merged = existing.clone();
            for (field, value) in changes {
                merged.set(field, value);
            }
            *existing = valid_fields(def, &merged);
            updated += 1;
        }
        Ok(updated)
    }

    /// Remove the given rows of `table`, returning how many existed
    pub fn delete_rows(&mut self, table: &str, ids: &[RowId]) -> StoreResult<usize> {
        self.data.delete(table, ids)
    }

    // ========================================================================
    // Structural validation
    // ========================================================================

    /// Check the invariants a decoded state must satisfy
    ///
    /// - `tables` and `data` have the same table names
    /// - field lists are normalized (`ID` first, unique, valid names)
    /// - counters lie in `1..=MAX_ROW_ID`
    /// - each row's `ID` equals its key, and the key is below the counter
    pub fn validate(&self) -> StoreResult<()> {
        for (name, def) in self.tables.iter() {
            if self.data.rows(name).is_none() {
                return Err(StoreError::corruption(format!(
                    "table '{}' has no data entry",
                    name
                )));
            }
            def.fields.check()?;
            if def.auto_increment == 0 || def.auto_increment > MAX_ROW_ID {
                return Err(StoreError::corruption(format!(
                    "table '{}' has auto_increment {} outside 1..={}",
                    name, def.auto_increment, MAX_ROW_ID
                )));
            }
        }

        for (name, rows) in self.data.tables() {
            let def = self.tables.get(name).ok_or_else(|| {
                StoreError::corruption(format!("data for unknown table '{}'", name))
            })?;
            for (id, row) in rows {
                if row.id() != Some(*id) {
                    return Err(StoreError::corruption(format!(
                        "row {} of table '{}' carries a different ID",
                        id, name
                    )));
                }
                if *id >= def.auto_increment {
                    return Err(StoreError::corruption(format!(
                        "row {} of table '{}' is not below auto_increment {}",
                        id, name, def.auto_increment
                    )));
                }
            }
        }
        Ok(())
    }
}
