use crate::config::EdgeConfig;
use crate::error::Result;
use crate::forward::{HttpOriginFetcher, OriginFetcher};
use crate::origin::OriginPolicy;
use crate::store::{ManifestStore, build_store};
use std::sync::Arc;
use stelae_manifest::Allowlist;

/// Per-invocation collaborators handed to every handler.
///
/// Nothing here is mutated while serving; tests swap in their own store and fetcher.
#[derive(Clone)]
pub struct EdgeContext {
    pub store: Arc<dyn ManifestStore>,
    pub fetcher: Arc<dyn OriginFetcher>,
    pub manifest_key: String,
    pub allowlist: Arc<Allowlist>,
    pub origin_policy: OriginPolicy,
}

impl EdgeContext {
    #[must_use]
    pub fn new(store: Arc<dyn ManifestStore>, fetcher: Arc<dyn OriginFetcher>) -> Self {
        Self {
            store,
            fetcher,
            manifest_key: crate::config::DEFAULT_MANIFEST_KEY.to_string(),
            allowlist: Arc::new(Allowlist::default()),
            origin_policy: OriginPolicy::default(),
        }
    }

    /// Build the store and origin fetcher described by `cfg`.
    ///
    /// # Errors
    ///
    /// Returns an error if the origin URL is invalid or a client cannot be constructed.
    pub fn from_config(cfg: &EdgeConfig) -> Result<Self> {
        let store = build_store(&cfg.store)?;
        let fetcher = Arc::new(HttpOriginFetcher::new(cfg.origin()?)?);
        Ok(Self {
            store,
            fetcher,
            manifest_key: cfg.manifest_key.clone(),
            allowlist: Arc::new(Allowlist::default()),
            origin_policy: OriginPolicy {
                default_scheme: cfg.default_scheme.clone(),
                trust_forwarded_headers: cfg.trust_forwarded_headers,
            },
        })
    }
}
