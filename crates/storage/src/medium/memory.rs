//! Process-local medium.
//!
//! Clones share the same underlying map, so two stores opened on clones of
//! one `MemoryMedium` see each other's commits, like two pages sharing a
//! browser's storage area.

use super::traits::{KeyValueMedium, MediumError};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Default)]
struct Slots {
    entries: HashMap<String, Vec<u8>>,
    /// Sum of key and value lengths over all entries
    used: usize,
}

/// In-memory key-value medium with an optional byte quota.
///
/// # Example
///
/// ```
/// use tablestore_storage::medium::{KeyValueMedium, MediumError, MemoryMedium};
///
/// let medium = MemoryMedium::with_quota(16);
/// assert!(medium.write("k", b"small").is_ok());
/// assert!(matches!(
///     medium.write("k", &[0u8; 64]),
///     Err(MediumError::QuotaExceeded { .. })
/// ));
/// assert_eq!(medium.read("k").unwrap(), Some(b"small".to_vec()));
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryMedium {
    slots: Arc<RwLock<Slots>>,
    quota: Option<usize>,
}

impl MemoryMedium {
    /// Unbounded medium.
    pub fn new() -> Self {
        Self::default()
    }

    /// Medium holding at most `bytes` bytes of keys plus values.
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            slots: Arc::default(),
            quota: Some(bytes),
        }
    }

    /// Bytes currently used by keys and values.
    pub fn used_bytes(&self) -> usize {
        self.slots.read().used
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.slots.read().entries.len()
    }

    /// True if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.slots.read().entries.is_empty()
    }

    /// Stored keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.slots.read().entries.keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl KeyValueMedium for MemoryMedium {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, MediumError> {
        Ok(self.slots.read().entries.get(key).cloned())
    }

    fn write(&self, key: &str, bytes: &[u8]) -> Result<(), MediumError> {
        let mut slots = self.slots.write();
        let previous = slots.entries.get(key).map_or(0, |v| key.len() + v.len());
        let needed = slots.used - previous + key.len() + bytes.len();

        if let Some(quota) = self.quota {
            if needed > quota {
                return Err(MediumError::QuotaExceeded {
                    needed,
                    available: quota,
                });
            }
        }

        slots.entries.insert(key.to_string(), bytes.to_vec());
        slots.used = needed;
        debug!(target: "tablestore::storage", key, bytes = bytes.len(), "memory write");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), MediumError> {
        let mut slots = self.slots.write();
        if let Some(v) = slots.entries.remove(key) {
            slots.used -= key.len() + v.len();
        }
        Ok(())
    }

    fn medium_id(&self) -> &str {
        "memory"
    }
}
