//! Error types for the table store
//!
//! This module defines all error types surfaced by the store.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.

use thiserror::Error;

/// Result type alias for table store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// What kind of name failed validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameKind {
    /// Database name
    Database,
    /// Table name
    Table,
    /// Field (column) name
    Field,
    /// Storage key prefix
    Prefix,
}

impl std::fmt::Display for NameKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            NameKind::Database => "database",
            NameKind::Table => "table",
            NameKind::Field => "field",
            NameKind::Prefix => "prefix",
        };
        f.write_str(s)
    }
}

/// Error types for the table store
#[derive(Debug, Error)]
pub enum StoreError {
    /// A database, table or field name contains characters outside `[A-Za-z0-9_]`
    #[error("The {kind} name '{name}' contains invalid characters")]
    InvalidName {
        /// Which kind of name was rejected
        kind: NameKind,
        /// The rejected name
        name: String,
    },

    /// `create_table` on a name that is already taken
    #[error("The table name '{0}' already exists")]
    DuplicateTable(String),

    /// Operation on a table that does not exist
    #[error("The table '{0}' does not exist")]
    TableNotFound(String),

    /// The table's auto-increment counter cannot issue another identifier
    #[error("The table '{0}' has no identifiers left")]
    IdsExhausted(String),

    /// Input rows are not in the expected shape
    #[error("Malformed data: {0}")]
    DataShape(String),

    /// The key-value medium rejected a read, write or remove
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Encoding or decoding the database state failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Decoded state violates a structural invariant
    #[error("Data corruption: {0}")]
    Corruption(String),

    /// The database was dropped; the store handle is no longer usable
    #[error("The database has been dropped")]
    StoreDropped,

    /// Invalid store configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl StoreError {
    /// Create an `InvalidName` error
    pub fn invalid_name(kind: NameKind, name: impl Into<String>) -> Self {
        StoreError::InvalidName {
            kind,
            name: name.into(),
        }
    }

    /// Create a `DataShape` error
    pub fn data_shape(msg: impl Into<String>) -> Self {
        StoreError::DataShape(msg.into())
    }

    /// Create a `Persistence` error
    pub fn persistence(msg: impl Into<String>) -> Self {
        StoreError::Persistence(msg.into())
    }

    /// Create a `Corruption` error
    pub fn corruption(msg: impl Into<String>) -> Self {
        StoreError::Corruption(msg.into())
    }

    /// Create an `InvalidConfig` error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        StoreError::InvalidConfig(msg.into())
    }

    /// True for errors raised by the key-value medium or the codec
    pub fn is_persistence(&self) -> bool {
        matches!(
            self,
            StoreError::Persistence(_) | StoreError::Serialization(_)
        )
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}
