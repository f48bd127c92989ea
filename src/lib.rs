//! Tablestore - embedded tables persisted as one key-value blob
//!
//! A database is a set of named tables. Each table has an ordered field list
//! led by the reserved `ID` field and an auto-increment counter. The whole
//! database (schema and rows) lives in memory and is written to a single key
//! of a [`KeyValueMedium`] on commit.
//!
//! # Quick Start
//!
//! ```
//! use tablestore::{Query, Row, SortKey, TableStore};
//!
//! let mut db = TableStore::in_memory("app").unwrap();
//! db.create_table("people", ["name", "age"]).unwrap();
//! db.insert("people", &Row::new().with("name", "Ana").with("age", 30)).unwrap();
//! db.insert("people", &Row::new().with("name", "Bo").with("age", 25)).unwrap();
//!
//! let youngest_first = db
//!     .query("people", Query::all(), None, None, &[SortKey::asc("age")], &[])
//!     .unwrap();
//! assert_eq!(youngest_first[0].id(), Some(2));
//!
//! let removed = db
//!     .delete_rows("people", Query::values(Row::new().with("name", "ana")))
//!     .unwrap();
//! assert_eq!(removed, 1);
//! assert!(db.commit());
//! ```
//!
//! # Architecture
//!
//! - `tablestore-core`: values, rows, schema registry, row store, errors
//! - `tablestore-storage`: key-value mediums and state codecs
//! - `tablestore-engine`: query engine, persistence gateway, `TableStore`

pub use tablestore_engine::*;

/// Codecs and mediums, for callers plugging in their own storage
pub use tablestore_storage as storage;
