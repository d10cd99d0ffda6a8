//! Manifest store backends.
//!
//! The store is written by an external publishing process; the edge only reads one key per
//! manifest request. Absence (including an empty value) is `Ok(None)`, never an error.

mod file;
mod memory;
mod workers_kv;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use workers_kv::WorkersKvStore;

use crate::config::StoreConfig;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait ManifestStore: Send + Sync {
    /// Short backend name for logs.
    fn kind(&self) -> &'static str;

    /// Read the text stored under `key`.
    async fn get(&self, key: &str) -> Result<Option<String>>;
}

/// Build the configured store backend.
///
/// # Errors
///
/// Returns an error if the backend cannot be constructed (e.g. HTTP client setup fails).
pub fn build_store(cfg: &StoreConfig) -> Result<Arc<dyn ManifestStore>> {
    Ok(match cfg {
        StoreConfig::Memory { entries } => Arc::new(MemoryStore::with_entries(entries.clone())),
        StoreConfig::File { dir } => Arc::new(FileStore::new(dir.clone())),
        StoreConfig::WorkersKv {
            account_id,
            namespace_id,
            api_token,
            api_base,
        } => Arc::new(WorkersKvStore::new(
            api_base,
            account_id,
            namespace_id,
            api_token.clone(),
        )?),
    })
}

fn non_empty(value: String) -> Option<String> {
    (!value.is_empty()).then_some(value)
}
