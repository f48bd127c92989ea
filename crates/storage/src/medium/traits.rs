//! Key-value medium trait definitions.

use std::io;
use std::sync::Arc;

/// Key-value medium trait.
///
/// Every read and write of persisted database state goes through a medium.
/// Implementations decide where the bytes live.
///
/// # Thread Safety
///
/// Mediums must be `Send + Sync` so a store can be moved behind a mutex and
/// shared across threads.
pub trait KeyValueMedium: Send + Sync {
    /// Read the bytes stored under `key`.
    ///
    /// Returns `Ok(None)` if nothing is stored there.
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, MediumError>;

    /// Store `bytes` under `key`, replacing any previous value.
    ///
    /// A failed write must leave the previous value readable.
    fn write(&self, key: &str, bytes: &[u8]) -> Result<(), MediumError>;

    /// Remove `key`. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<(), MediumError>;

    /// Short identifier used in log events.
    fn medium_id(&self) -> &str;
}

impl<M: KeyValueMedium + ?Sized> KeyValueMedium for Arc<M> {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, MediumError> {
        (**self).read(key)
    }

    fn write(&self, key: &str, bytes: &[u8]) -> Result<(), MediumError> {
        (**self).write(key, bytes)
    }

    fn remove(&self, key: &str) -> Result<(), MediumError> {
        (**self).remove(key)
    }

    fn medium_id(&self) -> &str {
        (**self).medium_id()
    }
}

/// Medium errors.
#[derive(Debug, thiserror::Error)]
pub enum MediumError {
    /// I/O failure in a file-backed medium.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The write would exceed the medium's capacity.
    #[error("Quota exceeded: {needed} bytes needed, {available} available")]
    QuotaExceeded {
        /// Bytes the medium would hold after the write
        needed: usize,
        /// Configured capacity
        available: usize,
    },

    /// The key cannot be represented by this medium.
    #[error("Invalid key: {0:?}")]
    InvalidKey(String),

    /// The medium refused the operation.
    #[error("Medium unavailable: {0}")]
    Unavailable(String),
}

impl From<MediumError> for tablestore_core::StoreError {
    fn from(e: MediumError) -> Self {
        tablestore_core::StoreError::Persistence(e.to_string())
    }
}
