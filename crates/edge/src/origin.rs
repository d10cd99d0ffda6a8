//! Request origin derivation.
//!
//! The manifest `endpointURL`, the root redirect and the diag payload are all computed from
//! the origin the client used to reach the edge, not from configuration or storage.

use axum::http::{HeaderMap, Uri, header};

const X_FORWARDED_HOST: &str = "x-forwarded-host";
const X_FORWARDED_PROTO: &str = "x-forwarded-proto";

#[derive(Debug, Clone)]
pub struct OriginPolicy {
    pub default_scheme: String,
    pub trust_forwarded_headers: bool,
}

impl Default for OriginPolicy {
    fn default() -> Self {
        Self {
            default_scheme: "http".to_string(),
            trust_forwarded_headers: true,
        }
    }
}

/// First comma-separated value of a header, trimmed.
fn first_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

impl OriginPolicy {
    /// `host[:port]` the client addressed.
    #[must_use]
    pub fn request_host(&self, headers: &HeaderMap, uri: &Uri) -> String {
        let forwarded = self
            .trust_forwarded_headers
            .then(|| first_value(headers, X_FORWARDED_HOST))
            .flatten();
        forwarded
            .or_else(|| first_value(headers, header::HOST.as_str()))
            .or_else(|| uri.authority().map(|a| a.as_str()))
            .unwrap_or("localhost")
            .to_ascii_lowercase()
    }

    /// `http` or `https`.
    #[must_use]
    pub fn request_scheme(&self, headers: &HeaderMap, uri: &Uri) -> String {
        let forwarded = self
            .trust_forwarded_headers
            .then(|| first_value(headers, X_FORWARDED_PROTO))
            .flatten()
            .map(str::to_ascii_lowercase)
            .filter(|p| p == "http" || p == "https");
        forwarded
            .or_else(|| uri.scheme_str().map(str::to_ascii_lowercase))
            .unwrap_or_else(|| self.default_scheme.clone())
    }

    /// `scheme://host[:port]` without a trailing slash.
    #[must_use]
    pub fn request_origin(&self, headers: &HeaderMap, uri: &Uri) -> String {
        format!(
            "{}://{}",
            self.request_scheme(headers, uri),
            self.request_host(headers, uri)
        )
    }
}
