//! Memory cache
//!
//! Will be destroyed on system shutdown

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use moka::future::Cache as MokaCache;
use tokio::sync::Mutex;

use super::Cache;
use super::Result;

/// All entries under a single user key
type Entries = Arc<Mutex<HashMap<String, String>>>;

/// An in-memory cache
///
/// Will be destroyed on system shutdown
#[derive(Clone, Debug)]
pub struct Memory {
    /// The entries of all user keys
    namespaces: MokaCache<String, Entries>,
}

impl Memory {
    /// Create a new empty Memory cache
    pub fn new() -> Self {
        Self {
            namespaces: MokaCache::builder().build(),
        }
    }

    /// Get the entries of a user key, creating them when absent
    async fn namespace(&self, user_key: &str) -> Entries {
        self.namespaces
            .get_with(user_key.to_string(), async { Entries::default() })
            .await
    }
}

#[async_trait]
impl Cache for Memory {
    async fn get_all(&self, user_key: &str) -> Result<HashMap<String, String>> {
        match self.namespaces.get(user_key).await {
            Some(entries) => Ok(entries.lock().await.clone()),
            None => Ok(HashMap::new()),
        }
    }

    async fn get_one(&self, user_key: &str, note_key: &str) -> Result<Option<String>> {
        match self.namespaces.get(user_key).await {
            Some(entries) => Ok(entries.lock().await.get(note_key).cloned()),
            None => Ok(None),
        }
    }

    async fn upsert(&self, user_key: &str, note_key: &str, value: &str) -> Result<()> {
        let entries = self.namespace(user_key).await;

        entries
            .lock()
            .await
            .insert(note_key.to_string(), value.to_string());

        Ok(())
    }

    async fn delete(&self, user_key: &str, note_key: &str) -> Result<()> {
        if let Some(entries) = self.namespaces.get(user_key).await {
            entries.lock().await.remove(note_key);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::note_key;
    use super::super::user_key;
    use super::*;

    #[test]
    fn test_keys_carry_a_type_prefix() {
        assert_eq!("user_42".to_string(), user_key(42));
        assert_eq!("note_7".to_string(), note_key(7));
    }

    #[tokio::test]
    async fn test_unknown_user_key_is_empty() {
        let cache = Memory::new();

        let entries = cache.get_all("user_1").await.unwrap();
        assert!(entries.is_empty());

        let entry = cache.get_one("user_1", "note_1").await.unwrap();
        assert!(entry.is_none());
    }

    #[tokio::test]
    async fn test_upsert_overwrites() {
        let cache = Memory::new();

        cache.upsert("user_1", "note_1", "first").await.unwrap();
        cache.upsert("user_1", "note_1", "second").await.unwrap();
        cache.upsert("user_1", "note_2", "other").await.unwrap();

        let entry = cache.get_one("user_1", "note_1").await.unwrap();
        assert_eq!(Some("second".to_string()), entry);

        let entries = cache.get_all("user_1").await.unwrap();
        assert_eq!(2, entries.len());
    }

    #[tokio::test]
    async fn test_user_keys_are_isolated() {
        let cache = Memory::new();

        cache.upsert("user_1", "note_1", "mine").await.unwrap();

        let entry = cache.get_one("user_2", "note_1").await.unwrap();
        assert!(entry.is_none());
    }

    #[tokio::test]
    async fn test_delete_is_a_no_op_for_absent_entries() {
        let cache = Memory::new();

        // on an unknown user key
        cache.delete("user_1", "note_1").await.unwrap();

        cache.upsert("user_1", "note_1", "mine").await.unwrap();
        cache.delete("user_1", "note_1").await.unwrap();

        // and again on a known user key
        cache.delete("user_1", "note_1").await.unwrap();

        let entry = cache.get_one("user_1", "note_1").await.unwrap();
        assert!(entry.is_none());
    }

    #[tokio::test]
    async fn test_clones_share_entries() {
        let cache = Memory::new();
        let clone = cache.clone();

        cache.upsert("user_1", "note_1", "shared").await.unwrap();

        let entry = clone.get_one("user_1", "note_1").await.unwrap();
        assert_eq!(Some("shared".to_string()), entry);
    }
}
