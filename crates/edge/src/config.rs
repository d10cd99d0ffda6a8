//! Edge configuration.
//!
//! Values come from an optional YAML file and are overridden by CLI flags / environment
//! variables (`STELAE_EDGE_*`).

use crate::error::{EdgeError, Result};
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use url::Url;

pub const DEFAULT_MANIFEST_KEY: &str = "manifest_json";
pub const DEFAULT_KV_API_BASE: &str = "https://api.cloudflare.com/client/v4";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per line.
    #[default]
    Json,
    /// Human-readable text.
    Pretty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreKind {
    Memory,
    File,
    WorkersKv,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum StoreConfig {
    /// In-process store, optionally seeded with entries.
    Memory {
        #[serde(default)]
        entries: HashMap<String, String>,
    },
    /// One file per key inside `dir`.
    File { dir: PathBuf },
    /// Cloudflare Workers KV namespace, read through the REST API.
    #[serde(rename_all = "camelCase")]
    WorkersKv {
        account_id: String,
        namespace_id: String,
        api_token: String,
        #[serde(default = "default_kv_api_base")]
        api_base: String,
    },
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::Memory {
            entries: HashMap::new(),
        }
    }
}

fn default_kv_api_base() -> String {
    DEFAULT_KV_API_BASE.to_string()
}

fn default_bind() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8787))
}

fn default_scheme() -> String {
    "http".to_string()
}

fn default_true() -> bool {
    true
}

fn default_manifest_key() -> String {
    DEFAULT_MANIFEST_KEY.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EdgeConfig {
    #[serde(default = "default_bind")]
    pub bind: SocketAddr,
    /// Origin every non-manifest path is forwarded to.
    #[serde(default)]
    pub origin_url: Option<String>,
    /// Scheme assumed for the request origin when none is forwarded.
    #[serde(default = "default_scheme")]
    pub default_scheme: String,
    /// Honor `X-Forwarded-Host` / `X-Forwarded-Proto` (the edge normally sits behind a tunnel).
    #[serde(default = "default_true")]
    pub trust_forwarded_headers: bool,
    #[serde(default = "default_manifest_key")]
    pub manifest_key: String,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_format: LogFormat,
}

impl Default for EdgeConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            origin_url: None,
            default_scheme: default_scheme(),
            trust_forwarded_headers: true,
            manifest_key: default_manifest_key(),
            store: StoreConfig::default(),
            log_level: default_log_level(),
            log_format: LogFormat::default(),
        }
    }
}

impl EdgeConfig {
    /// Parse a YAML config document.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is invalid or contains unknown fields.
    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(raw)?)
    }

    /// Load a YAML config file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            EdgeError::Config(format!("read config {}: {e}", path.display()))
        })?;
        Self::from_yaml_str(&raw)
    }

    /// The validated origin base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if `originUrl` is unset, unparsable, not `http(s)`, or carries a query
    /// or fragment.
    pub fn origin(&self) -> Result<Url> {
        let raw = self
            .origin_url
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| EdgeError::Config("originUrl is required".to_string()))?;
        let url = Url::parse(raw)
            .map_err(|e| EdgeError::Config(format!("invalid originUrl '{raw}': {e}")))?;
        match url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(EdgeError::Config(format!(
                    "originUrl must be http(s), got scheme '{other}'"
                )));
            }
        }
        if url.query().is_some() || url.fragment().is_some() {
            return Err(EdgeError::Config(
                "originUrl must not carry a query or fragment".to_string(),
            ));
        }
        Ok(url)
    }

    /// Validate everything the server needs before binding.
    ///
    /// # Errors
    ///
    /// Returns the first configuration problem found.
    pub fn validate(&self) -> Result<()> {
        self.origin()?;
        if !matches!(self.default_scheme.as_str(), "http" | "https") {
            return Err(EdgeError::Config(format!(
                "defaultScheme must be 'http' or 'https', got '{}'",
                self.default_scheme
            )));
        }
        if self.manifest_key.trim().is_empty() {
            return Err(EdgeError::Config("manifestKey must be non-empty".to_string()));
        }
        match &self.store {
            StoreConfig::Memory { .. } => {}
            StoreConfig::File { dir } => {
                if dir.as_os_str().is_empty() {
                    return Err(EdgeError::Config("store.dir must be non-empty".to_string()));
                }
            }
            StoreConfig::WorkersKv {
                account_id,
                namespace_id,
                api_token,
                api_base,
            } => {
                for (name, value) in [
                    ("accountId", account_id),
                    ("namespaceId", namespace_id),
                    ("apiToken", api_token),
                ] {
                    if value.trim().is_empty() {
                        return Err(EdgeError::Config(format!(
                            "store.{name} is required for workers-kv"
                        )));
                    }
                }
                Url::parse(api_base)
                    .map_err(|e| EdgeError::Config(format!("invalid store.apiBase: {e}")))?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "stelae-manifest-edge",
    version,
    about = "Serve the MCP connector manifest and forward everything else to origin"
)]
pub struct Cli {
    /// Optional YAML config file; flags and env vars override its values.
    #[arg(long, env = "STELAE_EDGE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address to listen on.
    #[arg(long, env = "STELAE_EDGE_BIND")]
    pub bind: Option<SocketAddr>,

    /// Origin base URL for forwarded paths (e.g. `http://127.0.0.1:9092`).
    #[arg(long, env = "STELAE_EDGE_ORIGIN_URL")]
    pub origin_url: Option<String>,

    /// Scheme assumed for the request origin when no `X-Forwarded-Proto` is trusted.
    #[arg(long, env = "STELAE_EDGE_DEFAULT_SCHEME")]
    pub default_scheme: Option<String>,

    /// Honor `X-Forwarded-Host` / `X-Forwarded-Proto`.
    #[arg(long, env = "STELAE_EDGE_TRUST_FORWARDED_HEADERS")]
    pub trust_forwarded_headers: Option<bool>,

    /// Store key holding the serialized manifest.
    #[arg(long, env = "STELAE_EDGE_MANIFEST_KEY")]
    pub manifest_key: Option<String>,

    /// Manifest store backend.
    #[arg(long, env = "STELAE_EDGE_STORE", value_enum)]
    pub store: Option<StoreKind>,

    /// Directory for the `file` store.
    #[arg(long, env = "STELAE_EDGE_STORE_DIR")]
    pub store_dir: Option<PathBuf>,

    /// Cloudflare account id for the `workers-kv` store.
    #[arg(long, env = "STELAE_EDGE_KV_ACCOUNT_ID")]
    pub kv_account_id: Option<String>,

    /// Workers KV namespace id.
    #[arg(long, env = "STELAE_EDGE_KV_NAMESPACE_ID")]
    pub kv_namespace_id: Option<String>,

    /// API token with KV read access.
    #[arg(long, env = "STELAE_EDGE_KV_API_TOKEN", hide_env_values = true)]
    pub kv_api_token: Option<String>,

    /// Override the Cloudflare API base URL.
    #[arg(long, env = "STELAE_EDGE_KV_API_BASE")]
    pub kv_api_base: Option<String>,

    /// Log level used when `RUST_LOG` is unset.
    #[arg(long, env = "STELAE_EDGE_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Log output format.
    #[arg(long, env = "STELAE_EDGE_LOG_FORMAT", value_enum)]
    pub log_format: Option<LogFormat>,
}

impl Cli {
    /// Merge the config file (if any) with flag / env overrides and validate the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be loaded, a store flag is missing, or validation
    /// fails.
    pub fn into_config(self) -> Result<EdgeConfig> {
        let mut cfg = match &self.config {
            Some(path) => EdgeConfig::load(path)?,
            None => EdgeConfig::default(),
        };

        if let Some(bind) = self.bind {
            cfg.bind = bind;
        }
        if let Some(origin_url) = self.origin_url {
            cfg.origin_url = Some(origin_url);
        }
        if let Some(scheme) = self.default_scheme {
            cfg.default_scheme = scheme.to_ascii_lowercase();
        }
        if let Some(trust) = self.trust_forwarded_headers {
            cfg.trust_forwarded_headers = trust;
        }
        if let Some(key) = self.manifest_key {
            cfg.manifest_key = key;
        }
        if let Some(level) = self.log_level {
            cfg.log_level = level;
        }
        if let Some(format) = self.log_format {
            cfg.log_format = format;
        }

        if let Some(kind) = self.store {
            cfg.store = match kind {
                StoreKind::Memory => StoreConfig::default(),
                StoreKind::File => StoreConfig::File {
                    dir: self.store_dir.ok_or_else(|| {
                        EdgeError::Config("--store-dir is required for the file store".to_string())
                    })?,
                },
                StoreKind::WorkersKv => StoreConfig::WorkersKv {
                    account_id: self.kv_account_id.unwrap_or_default(),
                    namespace_id: self.kv_namespace_id.unwrap_or_default(),
                    api_token: self.kv_api_token.unwrap_or_default(),
                    api_base: self.kv_api_base.unwrap_or_else(default_kv_api_base),
                },
            };
        }

        cfg.validate()?;
        Ok(cfg)
    }
}
