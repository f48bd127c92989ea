//! Table store engine
//!
//! This crate puts the lower layers together:
//! - Query: value/predicate matching, sort, distinct, pagination
//! - Persistence: loading and committing the state blob
//! - TableStore: the public operation surface over one named database
//! - SharedTableStore: mutex-guarded handle for multi-threaded hosts
//! - Config: `tablestore.toml` parsing
//!
//! The engine is the only component that knows about both the data model
//! (`tablestore-core`) and the medium/codec pair (`tablestore-storage`).

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod persistence;
pub mod query;
pub mod shared;
pub mod store;

pub use config::{StoreConfig, CONFIG_FILE_NAME, DEFAULT_PREFIX};
pub use persistence::{LoadOutcome, PersistenceGateway};
pub use query::{select, Predicate, Query, QueryParams, SortKey, SortOrder};
pub use shared::SharedTableStore;
pub use store::{TableStore, Upsert};

pub use tablestore_core::{
    AlterDefaults, NameKind, Row, RowId, StoreError, StoreResult, Value, ID_FIELD,
};
pub use tablestore_storage::medium::{DirectoryMedium, KeyValueMedium, MediumError, MemoryMedium};
