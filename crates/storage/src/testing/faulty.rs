//! Fault-injecting medium wrapper

use crate::medium::{KeyValueMedium, MediumError};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Medium wrapper with switchable failures
///
/// A failing operation never reaches the inner medium, so its previous
/// contents stay as they were.
#[derive(Debug, Default)]
pub struct FaultyMedium<M> {
    inner: M,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    fail_removes: AtomicBool,
    write_attempts: AtomicUsize,
}

impl<M: KeyValueMedium> FaultyMedium<M> {
    /// Wrap `inner` with all faults off
    pub fn new(inner: M) -> Self {
        FaultyMedium {
            inner,
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
            fail_removes: AtomicBool::new(false),
            write_attempts: AtomicUsize::new(0),
        }
    }

    /// The wrapped medium
    pub fn inner(&self) -> &M {
        &self.inner
    }

    /// Make reads fail (or succeed again)
    pub fn fail_reads(&self, on: bool) {
        self.fail_reads.store(on, Ordering::SeqCst);
    }

    /// Make writes fail (or succeed again)
    pub fn fail_writes(&self, on: bool) {
        self.fail_writes.store(on, Ordering::SeqCst);
    }

    /// Make removes fail (or succeed again)
    pub fn fail_removes(&self, on: bool) {
        self.fail_removes.store(on, Ordering::SeqCst);
    }

    /// Number of `write` calls seen, failed ones included
    pub fn write_attempts(&self) -> usize {
        self.write_attempts.load(Ordering::SeqCst)
    }
}

impl<M: KeyValueMedium> KeyValueMedium for FaultyMedium<M> {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, MediumError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(MediumError::Unavailable("injected read failure".into()));
        }
        self.inner.read(key)
    }

    fn write(&self, key: &str, bytes: &[u8]) -> Result<(), MediumError> {
        self.write_attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(MediumError::Unavailable("injected write failure".into()));
        }
        self.inner.write(key, bytes)
    }

    fn remove(&self, key: &str) -> Result<(), MediumError> {
        if self.fail_removes.load(Ordering::SeqCst) {
            return Err(MediumError::Unavailable("injected remove failure".into()));
        }
        self.inner.remove(key)
    }

    fn medium_id(&self) -> &str {
        "faulty"
    }
}
