use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::store::{DocumentStore, StoreError};

/// Process-local store. Used in tests and when nothing needs to survive a restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: RwLock<HashMap<String, String>>,
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.documents.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.documents
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Store whose reads succeed and whose writes always fail.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct ReadOnlyStore {
    inner: MemoryStore,
}

#[cfg(test)]
#[async_trait]
impl DocumentStore for ReadOnlyStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, _value: &str) -> Result<(), StoreError> {
        Err(StoreError::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            format!("document '{key}' is read-only"),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_then_get_replaces_document() {
        let store = MemoryStore::default();
        assert!(store.get("k").await.unwrap().is_none());
        store.set("k", "1").await.unwrap();
        store.set("k", "2").await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn test_read_only_store_rejects_writes() {
        let store = ReadOnlyStore::default();
        assert!(matches!(store.set("k", "1").await, Err(StoreError::Io(_))));
        assert!(store.get("k").await.unwrap().is_none());
    }
}
