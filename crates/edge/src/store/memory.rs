use super::{ManifestStore, non_empty};
use crate::error::Result;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// In-process store, used for tests and for running the edge without a publisher.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_entries(entries: HashMap<String, String>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(entries)),
        }
    }

    pub fn put(&self, key: impl Into<String>, value: impl Into<String>) {
        self.inner.write().insert(key.into(), value.into());
    }

    pub fn remove(&self, key: &str) {
        self.inner.write().remove(key);
    }
}

#[async_trait]
impl ManifestStore for MemoryStore {
    fn kind(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.inner.read().get(key).cloned().and_then(non_empty))
    }
}
