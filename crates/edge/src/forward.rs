//! Pass-through forwarding to the origin.
//!
//! Everything that is not the manifest, the root redirect or the diag endpoint (notably the
//! `/mcp` protocol endpoint itself) goes to the origin unchanged. Bodies are streamed both
//! ways; nothing is buffered or inspected. No retries and no timeout beyond the client
//! defaults.

use crate::error::{EdgeError, Result};
use async_trait::async_trait;
use axum::body::{Body, HttpBody as _};
use axum::extract::Request;
use axum::http::{HeaderMap, HeaderName, Uri, header};
use axum::response::Response;
use url::Url;

/// Sends a request to the origin and returns its response unmodified.
#[async_trait]
pub trait OriginFetcher: Send + Sync {
    async fn forward(&self, req: Request) -> Result<Response>;
}

/// Headers that describe a single connection and must not be relayed.
const HOP_BY_HOP: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

fn strip_hop_by_hop(headers: &mut HeaderMap) {
    // Headers named in `Connection` are connection-scoped too.
    let named: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();
    for name in named {
        headers.remove(name);
    }
    for name in HOP_BY_HOP {
        headers.remove(name);
    }
}

/// reqwest-backed forwarder. Redirects are returned to the caller, not followed.
#[derive(Clone)]
pub struct HttpOriginFetcher {
    http: reqwest::Client,
    base: Url,
}

impl HttpOriginFetcher {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base: Url) -> Result<Self> {
        let http = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| EdgeError::Config(format!("build origin http client: {e}")))?;
        Ok(Self { http, base })
    }

    /// Origin URL for an inbound request URI (path and query are kept as-is).
    #[must_use]
    pub fn target_url(&self, uri: &Uri) -> String {
        let path_and_query = uri.path_and_query().map_or("/", |pq| pq.as_str());
        format!(
            "{}{}",
            self.base.as_str().trim_end_matches('/'),
            path_and_query
        )
    }
}

#[async_trait]
impl OriginFetcher for HttpOriginFetcher {
    async fn forward(&self, req: Request) -> Result<Response> {
        let (parts, body) = req.into_parts();
        let url = self.target_url(&parts.uri);

        let mut headers = parts.headers;
        strip_hop_by_hop(&mut headers);
        // reqwest derives Host from the target URL.
        headers.remove(header::HOST);

        let mut outbound = self.http.request(parts.method, url).headers(headers);
        if body.size_hint().exact() != Some(0) {
            outbound = outbound.body(reqwest::Body::wrap_stream(body.into_data_stream()));
        }

        let resp = outbound
            .send()
            .await
            .map_err(|e| EdgeError::Forward(e.to_string()))?;

        let status = resp.status();
        let mut headers = resp.headers().clone();
        strip_hop_by_hop(&mut headers);

        let mut response = Response::new(Body::from_stream(resp.bytes_stream()));
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        Ok(response)
    }
}
