//! Session persistence trait.

use crate::error::Result;
use std::future::Future;

/// Key-value persistence for the last known user snapshot.
///
/// # Implementation Notes
///
/// - Values are opaque JSON strings; the coordinator owns the format
/// - Only one key is ever used (see `SessionConfig::storage_key`)
/// - Implementations may be synchronous under the hood
pub trait SessionPersistence: Send + Sync {
    /// Read a value.
    ///
    /// # Errors
    ///
    /// Returns error if the underlying storage cannot be read.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>>> + Send;

    /// Write a value, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns error if the underlying storage cannot be written.
    fn set(&self, key: &str, value: String) -> impl Future<Output = Result<()>> + Send;

    /// Delete a value. Deleting a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns error if the underlying storage cannot be written.
    fn remove(&self, key: &str) -> impl Future<Output = Result<()>> + Send;
}
