//! Document persistence.
//!
//! State is kept as a handful of whole JSON documents under fixed string keys.
//! Every write replaces the full document; there are no partial patches.
//! Loads fall back to a per-key default when the document is missing or does
//! not decode.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::{Application, DashboardFilters};

pub mod defaults;
pub mod file;
pub mod memory;
pub mod redis_store;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use redis_store::RedisStore;

pub const APPLICATIONS_KEY: &str = "job-applications";
pub const RESUME_KEY: &str = "user-resume";
pub const PREFERENCES_KEY: &str = "career-preferences";
pub const FILTERS_KEY: &str = "job-filters";
pub const TOUR_KEY: &str = "has-completed-tour";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Redis error: {0}")]
    Redis(#[from] ::redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Raw string-keyed document storage.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Replaces the whole document stored under `key`.
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// Typed access to the application's documents.
#[derive(Clone)]
pub struct Documents {
    store: Arc<dyn DocumentStore>,
}

impl Documents {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn applications(&self) -> Result<Vec<Application>, StoreError> {
        self.load_or(APPLICATIONS_KEY, defaults::sample_applications)
            .await
    }

    pub async fn save_applications(&self, apps: &[Application]) -> Result<(), StoreError> {
        self.save(APPLICATIONS_KEY, &apps).await
    }

    pub async fn resume(&self) -> Result<String, StoreError> {
        self.load_or(RESUME_KEY, || defaults::SAMPLE_RESUME.to_string())
            .await
    }

    pub async fn save_resume(&self, resume: &str) -> Result<(), StoreError> {
        self.save(RESUME_KEY, &resume).await
    }

    pub async fn preferences(&self) -> Result<String, StoreError> {
        self.load_or(PREFERENCES_KEY, || {
            defaults::SAMPLE_PREFERENCES.to_string()
        })
        .await
    }

    pub async fn save_preferences(&self, preferences: &str) -> Result<(), StoreError> {
        self.save(PREFERENCES_KEY, &preferences).await
    }

    pub async fn filters(&self) -> Result<DashboardFilters, StoreError> {
        self.load_or(FILTERS_KEY, DashboardFilters::default).await
    }

    pub async fn save_filters(&self, filters: &DashboardFilters) -> Result<(), StoreError> {
        self.save(FILTERS_KEY, filters).await
    }

    pub async fn tour_completed(&self) -> Result<bool, StoreError> {
        self.load_or(TOUR_KEY, || false).await
    }

    pub async fn save_tour_completed(&self, completed: bool) -> Result<(), StoreError> {
        self.save(TOUR_KEY, &completed).await
    }

    /// Loads `key`, using `default` when it is absent or corrupt.
    /// Backend failures still propagate.
    async fn load_or<T, F>(&self, key: &str, default: F) -> Result<T, StoreError>
    where
        T: DeserializeOwned,
        F: FnOnce() -> T,
    {
        let Some(raw) = self.store.get(key).await? else {
            debug!("Document '{key}' not found, using default");
            return Ok(default());
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Ok(value),
            Err(e) => {
                warn!("Document '{key}' is corrupt ({e}), using default");
                Ok(default())
            }
        }
    }

    async fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let raw = serde_json::to_string(value)?;
        self.store.set(key, &raw).await?;
        debug!("Wrote document '{key}' ({} bytes)", raw.len());
        Ok(())
    }
}
