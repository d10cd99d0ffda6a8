use anyhow::Context as _;
use serde::Deserialize;
use serde_json::Value;
use stelae_manifest::MANIFEST_PATH;
use url::Url;

#[derive(Debug, Clone, Deserialize)]
pub struct Diag {
    pub ok: bool,
    pub host: String,
    pub path: String,
    pub ts: i64,
}

/// Manifest as served, plus the headers a connector cares about.
#[derive(Debug, Clone)]
pub struct ServedManifest {
    pub status: reqwest::StatusCode,
    pub content_type: Option<String>,
    pub cache_control: Option<String>,
    pub body: String,
}

impl ServedManifest {
    /// # Errors
    ///
    /// Returns an error if the body is not JSON.
    pub fn json(&self) -> anyhow::Result<Value> {
        serde_json::from_str(&self.body).context("manifest body is not valid JSON")
    }
}

#[derive(Clone)]
pub struct EdgeClient {
    base: Url,
    http: reqwest::Client,
}

impl EdgeClient {
    pub fn new(base: Url) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .context("build http client")?;
        Ok(Self { base, http })
    }

    /// `scheme://host[:port]` of the configured base URL.
    #[must_use]
    pub fn origin(&self) -> String {
        self.base.origin().ascii_serialization()
    }

    fn url(&self, path: &str) -> anyhow::Result<Url> {
        self.base
            .join(path)
            .with_context(|| format!("join base url with path '{path}'"))
    }

    pub async fn manifest(&self) -> anyhow::Result<ServedManifest> {
        let url = self.url(MANIFEST_PATH)?;
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .with_context(|| format!("GET {MANIFEST_PATH}"))?
            .error_for_status()
            .with_context(|| format!("GET {MANIFEST_PATH} status"))?;
        let status = resp.status();
        let header = |name: reqwest::header::HeaderName| {
            resp.headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        let content_type = header(reqwest::header::CONTENT_TYPE);
        let cache_control = header(reqwest::header::CACHE_CONTROL);
        let body = resp.text().await.context("read manifest body")?;
        Ok(ServedManifest {
            status,
            content_type,
            cache_control,
            body,
        })
    }

    pub async fn diag(&self) -> anyhow::Result<Diag> {
        let url = self.url("/__diag")?;
        let diag: Diag = self
            .http
            .get(url)
            .send()
            .await
            .context("GET /__diag")?
            .error_for_status()
            .context("GET /__diag status")?
            .json()
            .await
            .context("parse diag response")?;
        Ok(diag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use stelae_manifest::{Allowlist, compliance};
    use stelae_manifest_edge::forward::HttpOriginFetcher;
    use stelae_manifest_edge::store::MemoryStore;
    use stelae_manifest_edge::{EdgeContext, router};
    use stelae_test_support::{pick_unused_port, spawn_router};

    async fn spawn_edge(store: MemoryStore) -> String {
        let origin: Url = format!("http://127.0.0.1:{}", pick_unused_port().unwrap())
            .parse()
            .unwrap();
        let fetcher = HttpOriginFetcher::new(origin).unwrap();
        let ctx = EdgeContext::new(Arc::new(store), Arc::new(fetcher));
        spawn_router(router(ctx)).await.unwrap()
    }

    #[tokio::test]
    async fn live_fallback_manifest_is_compliant() {
        let base = spawn_edge(MemoryStore::new()).await;
        let client = EdgeClient::new(base.parse().unwrap()).unwrap();

        let served = client.manifest().await.unwrap();
        assert_eq!(served.status, reqwest::StatusCode::OK);
        assert_eq!(
            served.content_type.as_deref(),
            Some("application/json; charset=utf-8")
        );
        assert!(served.cache_control.is_some());

        let doc = served.json().unwrap();
        let issues = compliance::check(&doc, Some(&client.origin()), &Allowlist::default());
        assert!(issues.is_empty(), "{issues:?}");
    }

    #[tokio::test]
    async fn unparsable_manifest_surfaces_as_json_error() {
        let store = MemoryStore::new();
        store.put("manifest_json", "{broken");
        let base = spawn_edge(store).await;
        let client = EdgeClient::new(base.parse().unwrap()).unwrap();

        let served = client.manifest().await.unwrap();
        assert_eq!(served.body, "{broken");
        assert!(served.json().is_err());
    }

    #[tokio::test]
    async fn diag_round_trip() {
        let base = spawn_edge(MemoryStore::new()).await;
        let client = EdgeClient::new(base.parse().unwrap()).unwrap();
        let diag = client.diag().await.unwrap();
        assert!(diag.ok);
        assert_eq!(diag.path, "/__diag");
        assert_eq!(format!("http://{}", diag.host), client.origin());
        assert!(diag.ts > 0);
    }
}
