//! TableStore: the public operation surface
//!
//! A `TableStore` owns one [`DatabaseState`] and the [`PersistenceGateway`]
//! for its storage key. All operations work on the in-memory state; nothing
//! reaches the medium until [`TableStore::commit`] (or the implicit commits
//! of [`TableStore::create_table_with_data`]).
//!
//! Every operation that names a table checks that the table exists before
//! touching anything, and every operation on a dropped store fails with
//! [`StoreError::StoreDropped`].
//!
//! # Example
//!
//! ```
//! use tablestore_core::Row;
//! use tablestore_engine::{Query, SortKey, TableStore};
//!
//! let mut store = TableStore::in_memory("library").unwrap();
//! store.create_table("books", ["title", "year"]).unwrap();
//! store.insert("books", &Row::new().with("title", "Dune").with("year", 1965)).unwrap();
//! store.insert("books", &Row::new().with("title", "Emma").with("year", 1815)).unwrap();
//!
//! let rows = store
//!     .query("books", Query::all(), None, None, &[SortKey::asc("year")], &[])
//!     .unwrap();
//! assert_eq!(rows[0].get("title").and_then(|v| v.as_str()), Some("Emma"));
//! assert!(store.commit());
//! ```

use crate::config::StoreConfig;
use crate::persistence::{LoadOutcome, PersistenceGateway};
use crate::query::{select, Query, QueryParams, SortKey};
use std::sync::Arc;
use tablestore_core::{
    validate_name, AlterDefaults, DatabaseState, FieldList, NameKind, Row, RowId, StoreError,
    StoreResult,
};
use tablestore_storage::medium::{KeyValueMedium, MemoryMedium};
use tracing::{debug, info, warn};

/// Outcome of [`TableStore::insert_or_update`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Upsert {
    /// No row matched; the data was inserted under this identifier
    Inserted(RowId),
    /// These rows matched and were overwritten with the data
    Updated(Vec<RowId>),
}

/// A named database of tables, persisted as one blob
#[derive(Debug)]
pub struct TableStore {
    name: String,
    gateway: PersistenceGateway,
    state: Option<DatabaseState>,
    is_new: bool,
}

impl TableStore {
    // ========================================================================
    // Construction
    // ========================================================================

    /// Open database `name` on `medium` with the default configuration
    pub fn open<M>(name: &str, medium: M) -> StoreResult<Self>
    where
        M: KeyValueMedium + 'static,
    {
        Self::open_with_config(name, medium, &StoreConfig::default())
    }

    /// Open database `name` on `medium`
    ///
    /// Stored state that is missing, does not decode, or is structurally
    /// inconsistent gives a fresh empty database with [`is_new`] set.
    ///
    /// A failing medium read does not fall back to an empty database: it is
    /// returned as `Persistence` and no store is opened.
    ///
    /// # Errors
    ///
    /// - `InvalidName` if `name` (or the configured prefix) is not `[A-Za-z0-9_]+`
    /// - `InvalidConfig` for an unknown codec
    /// - `Persistence` if the medium cannot be read
    ///
    /// [`is_new`]: TableStore::is_new
    pub fn open_with_config<M>(name: &str, medium: M, config: &StoreConfig) -> StoreResult<Self>
    where
        M: KeyValueMedium + 'static,
    {
        let gateway = PersistenceGateway::new(name, Arc::new(medium), config)?;

        let (state, is_new) = match gateway.load()? {
            LoadOutcome::Loaded(state) => (state, false),
            LoadOutcome::Missing => (DatabaseState::new(), true),
            LoadOutcome::Malformed(reason) => {
                warn!(
                    target: "tablestore::store",
                    database = name,
                    %reason,
                    "Discarding malformed stored state"
                );
                (DatabaseState::new(), true)
            }
        };

        let store = Self {
            name: name.to_string(),
            gateway,
            state: Some(state),
            is_new,
        };
        info!(
            target: "tablestore::store",
            database = name,
            key = store.gateway.storage_key(),
            codec = store.gateway.codec_id(),
            is_new,
            "Opened database"
        );

        if is_new && config.commit_on_create {
            store.commit();
        }
        Ok(store)
    }

    /// Open database `name` on a fresh private [`MemoryMedium`]
    pub fn in_memory(name: &str) -> StoreResult<Self> {
        Self::open(name, MemoryMedium::new())
    }

    /// Database name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Key the state is persisted under
    pub fn storage_key(&self) -> &str {
        self.gateway.storage_key()
    }

    /// True if nothing usable was stored when the database was opened
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    // ========================================================================
    // Guards
    // ========================================================================

    fn state(&self) -> StoreResult<&DatabaseState> {
        self.state.as_ref().ok_or(StoreError::StoreDropped)
    }

    fn state_mut(&mut self) -> StoreResult<&mut DatabaseState> {
        self.state.as_mut().ok_or(StoreError::StoreDropped)
    }

    fn existing(&self, table: &str) -> StoreResult<&DatabaseState> {
        let state = self.state()?;
        if !state.tables().contains(table) {
            return Err(StoreError::TableNotFound(table.to_string()));
        }
        Ok(state)
    }

    fn existing_mut(&mut self, table: &str) -> StoreResult<&mut DatabaseState> {
        self.existing(table)?;
        self.state_mut()
    }

    fn resolve(&self, table: &str, query: &Query<'_>) -> StoreResult<Vec<RowId>> {
        let state = self.existing(table)?;
        Ok(query.resolve(state.table(table)?, state.rows(table)?))
    }

    // ========================================================================
    // Database-level operations
    // ========================================================================

    /// Remove the stored state and make this store unusable
    ///
    /// If the medium refuses the removal the store stays usable.
    pub fn drop_database(&mut self) -> StoreResult<()> {
        self.state()?;
        self.gateway.remove()?;
        self.state = None;
        info!(target: "tablestore::store", database = %self.name, "Dropped database");
        Ok(())
    }

    /// Write the current state to the medium
    ///
    /// Returns `false` when the write fails (for example on a full medium);
    /// the in-memory state is unaffected either way.
    pub fn commit(&self) -> bool {
        match self.try_commit() {
            Ok(()) => true,
            Err(e) => {
                warn!(target: "tablestore::store", database = %self.name, error = %e, "Commit failed");
                false
            }
        }
    }

    /// Write the current state to the medium, reporting why it failed
    pub fn try_commit(&self) -> StoreResult<()> {
        self.gateway.commit(self.state()?)
    }

    /// Current state as JSON text, without writing it
    pub fn serialize(&self) -> StoreResult<String> {
        self.gateway.serialize(self.state()?)
    }

    /// Number of tables
    pub fn table_count(&self) -> StoreResult<usize> {
        Ok(self.state()?.tables().len())
    }

    /// Table names in sorted order
    pub fn table_names(&self) -> StoreResult<Vec<String>> {
        Ok(self.state()?.tables().names().map(str::to_string).collect())
    }

    // ========================================================================
    // Schema operations
    // ========================================================================

    /// True if `table` exists
    pub fn table_exists(&self, table: &str) -> StoreResult<bool> {
        Ok(self.state()?.tables().contains(table))
    }

    /// Declared fields of `table`, `ID` first
    pub fn table_fields(&self, table: &str) -> StoreResult<Vec<String>> {
        let state = self.existing(table)?;
        Ok(state.table(table)?.fields.as_slice().to_vec())
    }

    /// True if `field` is declared on `table`
    pub fn column_exists(&self, table: &str, field: &str) -> StoreResult<bool> {
        let state = self.existing(table)?;
        Ok(state.table(table)?.fields.contains(field))
    }

    /// Create `table` with the given fields
    ///
    /// Repeated names and `ID` are folded away; the stored field list is
    /// `ID` followed by the remaining names in first-seen order.
    ///
    /// # Errors
    ///
    /// `InvalidName` for a bad table or field name, `DuplicateTable` if the
    /// table already exists.
    pub fn create_table<I, S>(&mut self, table: &str, fields: I) -> StoreResult<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        validate_name(NameKind::Table, table)?;
        if self.state()?.tables().contains(table) {
            return Err(StoreError::DuplicateTable(table.to_string()));
        }
        let fields = FieldList::new(fields)?;
        let field_count = fields.len();
        self.state_mut()?.create_table(table, fields)?;
        info!(target: "tablestore::store", database = %self.name, table, fields = field_count, "Created table");
        Ok(())
    }

    /// Create `table` from a batch of rows and insert them
    ///
    /// The fields are the keys of the first row. The store is committed once
    /// after the table is created and again after the rows are inserted;
    /// failed commits are logged, not returned.
    ///
    /// # Errors
    ///
    /// `DataShape` for an empty batch, plus anything [`create_table`] returns.
    ///
    /// [`create_table`]: TableStore::create_table
    pub fn create_table_with_data(&mut self, table: &str, rows: Vec<Row>) -> StoreResult<()> {
        let Some(first) = rows.first() else {
            return Err(StoreError::data_shape(
                "table data must contain at least one row",
            ));
        };
        let fields: Vec<String> = first.keys().map(str::to_string).collect();
        self.create_table(table, fields)?;
        self.commit();

        let state = self.state_mut()?;
        for row in &rows {
            state.insert(table, row)?;
        }
        debug!(target: "tablestore::store", table, rows = rows.len(), "Populated table");
        self.commit();
        Ok(())
    }

    /// [`create_table_with_data`] taking a JSON array of objects
    ///
    /// # Errors
    ///
    /// `DataShape` unless `data` is a non-empty array whose entries are all
    /// objects.
    ///
    /// [`create_table_with_data`]: TableStore::create_table_with_data
    pub fn create_table_with_json(
        &mut self,
        table: &str,
        data: serde_json::Value,
    ) -> StoreResult<()> {
        let serde_json::Value::Array(items) = data else {
            return Err(StoreError::data_shape("table data must be an array of objects"));
        };
        let rows = items
            .into_iter()
            .map(Row::try_from)
            .collect::<StoreResult<Vec<Row>>>()?;
        self.create_table_with_data(table, rows)
    }

    /// Remove `table` and all its rows
    pub fn drop_table(&mut self, table: &str) -> StoreResult<()> {
        self.existing_mut(table)?.drop_table(table)?;
        info!(target: "tablestore::store", database = %self.name, table, "Dropped table");
        Ok(())
    }

    /// Remove every row of `table` and restart its identifiers at 1
    pub fn truncate(&mut self, table: &str) -> StoreResult<()> {
        self.existing_mut(table)?.truncate(table)?;
        debug!(target: "tablestore::store", table, "Truncated table");
        Ok(())
    }

    /// Add fields to `table`
    ///
    /// `defaults` decides what existing rows receive for the new fields:
    /// nothing ([`AlterDefaults::Unset`]), one value for every new field,
    /// or a value per field. Already declared names are skipped; the names
    /// actually added are returned.
    ///
    /// ```
    /// use tablestore_core::{AlterDefaults, Row, Value};
    /// use tablestore_engine::TableStore;
    ///
    /// let mut store = TableStore::in_memory("app").unwrap();
    /// store.create_table("users", ["name"]).unwrap();
    /// store.insert("users", &Row::new().with("name", "ana")).unwrap();
    ///
    /// let added = store.alter_table("users", ["active"], Value::Bool(true)).unwrap();
    /// assert_eq!(added, ["active"]);
    /// store.alter_table("users", ["email"], AlterDefaults::Unset).unwrap();
    /// ```
    pub fn alter_table<I, S>(
        &mut self,
        table: &str,
        fields: I,
        defaults: impl Into<AlterDefaults>,
    ) -> StoreResult<Vec<String>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        validate_name(NameKind::Table, table)?;
        let fields: Vec<S> = fields.into_iter().collect();
        for field in &fields {
            validate_name(NameKind::Field, field.as_ref())?;
        }
        let defaults = defaults.into();
        let added = self
            .existing_mut(table)?
            .alter_table(table, fields, &defaults)?;
        info!(target: "tablestore::store", database = %self.name, table, added = ?added, "Altered table");
        Ok(added)
    }

    // ========================================================================
    // Row operations
    // ========================================================================

    /// Number of rows in `table`
    pub fn row_count(&self, table: &str) -> StoreResult<usize> {
        Ok(self.existing(table)?.data().count(table))
    }

    /// Identifiers of every row in `table`, ascending
    pub fn get_ids(&self, table: &str) -> StoreResult<Vec<RowId>> {
        Ok(self.existing(table)?.data().ids(table))
    }

    /// Insert a row and return its new identifier
    ///
    /// Undeclared keys are dropped, missing fields are set to null and any
    /// `ID` in `data` is ignored.
    pub fn insert(&mut self, table: &str, data: &Row) -> StoreResult<RowId> {
        let id = self.existing_mut(table)?.insert(table, data)?;
        debug!(target: "tablestore::store", table, id, "Inserted row");
        Ok(id)
    }

    /// Insert `data` if `query` matches nothing, otherwise overwrite every
    /// matched row with it
    ///
    /// Matched rows are reported even when `data` carries no declared
    /// field and so changes nothing.
    pub fn insert_or_update(
        &mut self,
        table: &str,
        query: Query<'_>,
        data: &Row,
    ) -> StoreResult<Upsert> {
        let ids = self.resolve(table, &query)?;
        if ids.is_empty() {
            return self.insert(table, data).map(Upsert::Inserted);
        }
        let updated = self
            .state_mut()?
            .update(table, &ids, |_| Some(data.clone()))?;
        debug!(target: "tablestore::store", table, matched = ids.len(), updated, "Upserted rows");
        Ok(Upsert::Updated(ids))
    }

    /// Merge-update every row matched by `query`
    ///
    /// `update_fn` gets a copy of each row and returns the fields to change,
    /// or `None` to leave the row alone. `ID` cannot be changed and
    /// undeclared fields are dropped. Returns the number of rows changed.
    ///
    /// ```
    /// use tablestore_core::{Row, Value};
    /// use tablestore_engine::{Query, TableStore};
    ///
    /// let mut store = TableStore::in_memory("app").unwrap();
    /// store.create_table("users", ["name", "visits"]).unwrap();
    /// store.insert("users", &Row::new().with("name", "ana").with("visits", 1)).unwrap();
    ///
    /// let n = store
    ///     .update("users", Query::all(), |row| {
    ///         let visits = row.get("visits").and_then(Value::as_int)?;
    ///         Some(Row::new().with("visits", visits + 1))
    ///     })
    ///     .unwrap();
    /// assert_eq!(n, 1);
    /// ```
    pub fn update<F>(&mut self, table: &str, query: Query<'_>, update_fn: F) -> StoreResult<usize>
    where
        F: FnMut(Row) -> Option<Row>,
    {
        let ids = self.resolve(table, &query)?;
        let updated = self.state_mut()?.update(table, &ids, update_fn)?;
        debug!(target: "tablestore::store", table, matched = ids.len(), updated, "Updated rows");
        Ok(updated)
    }

    /// Rows of `table` matched by `query`, sorted, de-duplicated and paginated
    ///
    /// See [`crate::query`] for the order in which the steps apply.
    pub fn query(
        &self,
        table: &str,
        query: Query<'_>,
        limit: Option<usize>,
        start: Option<usize>,
        sort: &[SortKey],
        distinct: &[&str],
    ) -> StoreResult<Vec<Row>> {
        let ids = self.resolve(table, &query)?;
        let distinct: Vec<String> = distinct.iter().map(|f| f.to_string()).collect();
        Ok(select(
            self.state()?.rows(table)?,
            &ids,
            start,
            limit,
            sort,
            &distinct,
        ))
    }

    /// [`query`](TableStore::query) with named parameters
    pub fn query_all(&self, table: &str, params: QueryParams<'_>) -> StoreResult<Vec<Row>> {
        let ids = self.resolve(table, &params.query)?;
        Ok(select(
            self.state()?.rows(table)?,
            &ids,
            params.start,
            params.limit,
            &params.sort,
            &params.distinct,
        ))
    }

    /// Delete every row matched by `query`, returning how many were removed
    pub fn delete_rows(&mut self, table: &str, query: Query<'_>) -> StoreResult<usize> {
        let ids = self.resolve(table, &query)?;
        let deleted = self.state_mut()?.delete_rows(table, &ids)?;
        debug!(target: "tablestore::store", table, deleted, "Deleted rows");
        Ok(deleted)
    }
}
