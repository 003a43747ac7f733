//! All things related to the caching of notes
//!
//! Notes are cached per user: the key of a user holds an entry per note, and
//! both keys carry a type prefix. The cached value is a JSON snapshot of the
//! note, written on create and update and removed on delete.
//!
//! The cache is never the source of truth. Implementations report an
//! unreachable cache through [`Error::Unavailable`] and callers are expected
//! to fall back to storage.

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;

use memory::Memory;

mod memory;

/// Setup the cache
#[must_use]
pub fn setup() -> Memory {
    Memory::new()
}

/// Cache errors
#[derive(Debug, Error)]
pub enum Error {
    /// The cache could not be reached
    #[error("Cache unavailable: {0}")]
    Unavailable(String),
}

/// Result type for all cache interactions
pub type Result<T> = core::result::Result<T, Error>;

/// Key for all cached notes of a user
#[must_use]
pub fn user_key(user_id: i64) -> String {
    format!("user_{user_id}")
}

/// Key for a single cached note
#[must_use]
pub fn note_key(note_id: i64) -> String {
    format!("note_{note_id}")
}

/// Cache with all supported operations
#[async_trait]
pub trait Cache: Clone + Send + Sync + 'static {
    /// Get all entries under a user key
    ///
    /// An unknown user key is an empty map
    async fn get_all(&self, user_key: &str) -> Result<HashMap<String, String>>;

    /// Get a single entry under a user key
    async fn get_one(&self, user_key: &str, note_key: &str) -> Result<Option<String>>;

    /// Create or overwrite a single entry under a user key
    async fn upsert(&self, user_key: &str, note_key: &str, value: &str) -> Result<()>;

    /// Remove a single entry under a user key
    ///
    /// Removing an absent entry is a no-op
    async fn delete(&self, user_key: &str, note_key: &str) -> Result<()>;
}
