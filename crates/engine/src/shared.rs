//! Thread-safe handle to a [`TableStore`]
//!
//! One `parking_lot::Mutex` guards the whole store. Each method holds the
//! lock for the full operation, so read-then-write operations such as
//! `insert_or_update` are atomic with respect to other handles.

use crate::query::{Query, QueryParams};
use crate::store::{TableStore, Upsert};
use parking_lot::Mutex;
use std::sync::Arc;
use tablestore_core::{Row, RowId, StoreResult};

/// Cloneable, lock-guarded [`TableStore`]
#[derive(Debug, Clone)]
pub struct SharedTableStore {
    inner: Arc<Mutex<TableStore>>,
}

impl SharedTableStore {
    /// Wrap `store` for sharing
    pub fn new(store: TableStore) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    /// Run `f` with exclusive access to the store
    ///
    /// Use this to group several operations under one lock.
    pub fn with<R>(&self, f: impl FnOnce(&mut TableStore) -> R) -> R {
        let mut store = self.inner.lock();
        f(&mut store)
    }

    /// See [`TableStore::insert`]
    pub fn insert(&self, table: &str, data: &Row) -> StoreResult<RowId> {
        self.inner.lock().insert(table, data)
    }

    /// See [`TableStore::insert_or_update`]
    pub fn insert_or_update(&self, table: &str, query: Query<'_>, data: &Row) -> StoreResult<Upsert> {
        self.inner.lock().insert_or_update(table, query, data)
    }

    /// See [`TableStore::update`]
    pub fn update<F>(&self, table: &str, query: Query<'_>, update_fn: F) -> StoreResult<usize>
    where
        F: FnMut(Row) -> Option<Row>,
    {
        self.inner.lock().update(table, query, update_fn)
    }

    /// See [`TableStore::delete_rows`]
    pub fn delete_rows(&self, table: &str, query: Query<'_>) -> StoreResult<usize> {
        self.inner.lock().delete_rows(table, query)
    }

    /// See [`TableStore::query_all`]
    pub fn query_all(&self, table: &str, params: QueryParams<'_>) -> StoreResult<Vec<Row>> {
        self.inner.lock().query_all(table, params)
    }

    /// See [`TableStore::row_count`]
    pub fn row_count(&self, table: &str) -> StoreResult<usize> {
        self.inner.lock().row_count(table)
    }

    /// See [`TableStore::commit`]
    pub fn commit(&self) -> bool {
        self.inner.lock().commit()
    }
}

impl From<TableStore> for SharedTableStore {
    fn from(store: TableStore) -> Self {
        Self::new(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use tablestore_core::Value;

    fn counters() -> SharedTableStore {
        let mut store = TableStore::in_memory("shared").unwrap();
        store.create_table("hits", ["page", "n"]).unwrap();
        SharedTableStore::new(store)
    }

    #[test]
    fn concurrent_inserts_get_unique_ids() {
        let shared = counters();
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let shared = shared.clone();
                thread::spawn(move || {
                    (0..25)
                        .map(|i| {
                            shared
                                .insert("hits", &Row::new().with("page", format!("{}-{}", t, i)))
                                .unwrap()
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut ids: Vec<RowId> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        ids.sort_unstable();
        assert_eq!(ids, (1..=100).collect::<Vec<_>>());
        assert_eq!(shared.row_count("hits").unwrap(), 100);
    }

    #[test]
    fn concurrent_upserts_do_not_duplicate() {
        let shared = counters();
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let shared = shared.clone();
                thread::spawn(move || {
                    shared
                        .insert_or_update(
                            "hits",
                            Query::values(Row::new().with("page", "home")),
                            &Row::new().with("page", "home").with("n", 1),
                        )
                        .unwrap()
                })
            })
            .collect();

        let inserted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|u| matches!(u, Upsert::Inserted(_)))
            .count();
        assert_eq!(inserted, 1);
        assert_eq!(shared.row_count("hits").unwrap(), 1);
    }

    #[test]
    fn with_groups_operations() {
        let shared = counters();
        let id = shared.with(|store| {
            let id = store.insert("hits", &Row::new().with("page", "a").with("n", 0))?;
            store.update("hits", Query::all(), |row| {
                let n = row.get("n").and_then(Value::as_int)?;
                Some(Row::new().with("n", n + 1))
            })?;
            Ok::<_, tablestore_core::StoreError>(id)
        });
        assert_eq!(id.unwrap(), 1);

        let rows = shared.query_all("hits", QueryParams::new()).unwrap();
        assert_eq!(rows[0].get("n"), Some(&Value::Int(1)));
    }
}
