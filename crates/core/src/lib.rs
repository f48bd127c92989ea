//! Core types for the table store
//!
//! This crate defines the data model shared by every layer:
//! - Value: field values (null, bool, number, string, array, object)
//! - Row / RowId: ordered field records and their identifiers
//! - FieldList / TableDef / SchemaRegistry: table definitions
//! - RowStore: per-table rows plus the field validation helpers
//! - DatabaseState: the combined state persisted as one blob
//! - StoreError: error type hierarchy

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod name;
pub mod row;
pub mod rows;
pub mod schema;
pub mod state;
pub mod value;

pub use error::{NameKind, StoreError, StoreResult};
pub use name::{is_valid_name, validate_name, ID_FIELD};
pub use row::{Row, RowId};
pub use rows::{valid_fields, validate_data, RowStore, TableRows};
pub use schema::{AlterDefaults, FieldList, SchemaRegistry, TableDef, MAX_ROW_ID};
pub use state::DatabaseState;
pub use value::Value;
