//! Structured request logging.
//!
//! Every request gets a `stage = "request"` record on entry, and each handler records the
//! routing decision it took. Records go through `tracing`; sink write failures are dropped by
//! the subscriber and never reach the response path.

use crate::config::LogFormat;
use crate::error::{EdgeError, Result};
use axum::http::{HeaderMap, Method, Uri, header};
use tracing_subscriber::EnvFilter;

/// Install the global subscriber. `RUST_LOG` takes precedence over `level`.
///
/// # Errors
///
/// Returns an error if `level` is not a valid filter or a subscriber is already installed.
pub fn init(level: &str, format: LogFormat) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level)
            .map_err(|e| EdgeError::Config(format!("invalid log level '{level}': {e}")))?,
    };

    let installed = match format {
        LogFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .flatten_event(true)
            .with_current_span(false)
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).try_init(),
    };
    installed.map_err(|e| EdgeError::Config(format!("init logging: {e}")))
}

#[must_use]
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Request fields carried on every stage record.
#[derive(Debug, Clone)]
pub struct RequestLog {
    pub method: String,
    pub path: String,
    pub user_agent: String,
}

impl RequestLog {
    #[must_use]
    pub fn new(method: &Method, uri: &Uri, headers: &HeaderMap) -> Self {
        Self {
            method: method.as_str().to_string(),
            path: uri.path().to_string(),
            user_agent: headers
                .get(header::USER_AGENT)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("")
                .to_string(),
        }
    }

    pub fn stage(&self, stage: &str) {
        tracing::info!(
            stage,
            path = %self.path,
            method = %self.method,
            user_agent = %self.user_agent,
            ts = now_millis(),
            "edge request"
        );
    }

    pub fn stage_with_outcome(&self, stage: &str, outcome: &str) {
        tracing::info!(
            stage,
            outcome,
            path = %self.path,
            method = %self.method,
            user_agent = %self.user_agent,
            ts = now_millis(),
            "edge request"
        );
    }

    pub fn stage_error(&self, stage: &str, error: &str) {
        tracing::warn!(
            stage,
            error,
            path = %self.path,
            method = %self.method,
            user_agent = %self.user_agent,
            ts = now_millis(),
            "edge request failed"
        );
    }
}
