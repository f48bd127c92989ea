//! Name validation for databases, tables and fields
//!
//! A name is valid iff it is non-empty and made only of ASCII letters,
//! digits and underscores (`^[A-Za-z0-9_]+$`).

use crate::error::{NameKind, StoreError, StoreResult};

/// Reserved identifier field present as the first field of every table
pub const ID_FIELD: &str = "ID";

/// Check whether `name` is a valid database, table or field name
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

/// Validate a name, returning `InvalidName` tagged with `kind` on failure
pub fn validate_name(kind: NameKind, name: &str) -> StoreResult<()> {
    if is_valid_name(name) {
        Ok(())
    } else {
        Err(StoreError::invalid_name(kind, name))
    }
}
