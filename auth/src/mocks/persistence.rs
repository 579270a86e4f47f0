//! Mock session persistence for testing.

use crate::context::lock;
use crate::error::{AuthError, Result};
use crate::providers::SessionPersistence;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Mock session persistence.
///
/// Uses in-memory storage. Raw values are inspectable so tests can check
/// exactly what would have reached disk.
#[derive(Debug, Clone, Default)]
pub struct MockPersistence {
    entries: Arc<Mutex<HashMap<String, String>>>,
    fail_reads: Arc<AtomicBool>,
    fail_writes: Arc<AtomicBool>,
}

impl MockPersistence {
    /// Create a new, empty mock store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw stored value (for testing).
    #[must_use]
    pub fn raw(&self, key: &str) -> Option<String> {
        lock(&self.entries).get(key).cloned()
    }

    /// Seed a raw value (for testing).
    pub fn insert_raw(&self, key: &str, value: impl Into<String>) {
        lock(&self.entries).insert(key.to_string(), value.into());
    }

    /// Make every `get` fail.
    pub fn set_read_failure(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make every `set` and `remove` fail.
    pub fn set_write_failure(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writes(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AuthError::Storage("write rejected".to_string()));
        }
        Ok(())
    }
}

impl SessionPersistence for MockPersistence {
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>>> + Send {
        let outcome = if self.fail_reads.load(Ordering::SeqCst) {
            Err(AuthError::Storage("read rejected".to_string()))
        } else {
            Ok(self.raw(key))
        };
        async move { outcome }
    }

    fn set(&self, key: &str, value: String) -> impl Future<Output = Result<()>> + Send {
        let outcome = self.check_writes().map(|()| {
            lock(&self.entries).insert(key.to_string(), value);
        });
        async move { outcome }
    }

    fn remove(&self, key: &str) -> impl Future<Output = Result<()>> + Send {
        let outcome = self.check_writes().map(|()| {
            lock(&self.entries).remove(key);
        });
        async move { outcome }
    }
}
