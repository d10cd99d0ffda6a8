use super::{ManifestStore, non_empty};
use crate::error::{EdgeError, Result};
use async_trait::async_trait;
use url::Url;

/// Cloudflare Workers KV namespace, read through the REST API.
///
/// `GET {api_base}/accounts/{account}/storage/kv/namespaces/{namespace}/values/{key}`;
/// `404` means the key was never published.
#[derive(Clone)]
pub struct WorkersKvStore {
    http: reqwest::Client,
    namespace_url: Url,
    api_token: String,
}

impl WorkersKvStore {
    /// # Errors
    ///
    /// Returns an error if `api_base` is not an absolute URL or the HTTP client cannot be built.
    pub fn new(
        api_base: &str,
        account_id: &str,
        namespace_id: &str,
        api_token: String,
    ) -> Result<Self> {
        let mut namespace_url = Url::parse(api_base)
            .map_err(|e| EdgeError::Config(format!("invalid KV api base '{api_base}': {e}")))?;
        namespace_url
            .path_segments_mut()
            .map_err(|()| EdgeError::Config(format!("KV api base '{api_base}' cannot be a base")))?
            .pop_if_empty()
            .extend([
                "accounts",
                account_id,
                "storage",
                "kv",
                "namespaces",
                namespace_id,
                "values",
            ]);
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| EdgeError::Config(format!("build KV http client: {e}")))?;
        Ok(Self {
            http,
            namespace_url,
            api_token,
        })
    }

    fn value_url(&self, key: &str) -> Url {
        let mut url = self.namespace_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.push(key);
        }
        url
    }
}

#[async_trait]
impl ManifestStore for WorkersKvStore {
    fn kind(&self) -> &'static str {
        "workers-kv"
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let resp = self
            .http
            .get(self.value_url(key))
            .bearer_auth(&self.api_token)
            .send()
            .await
            .map_err(|e| EdgeError::Store(format!("KV request failed: {e}")))?;

        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(EdgeError::Store(format!("KV read returned http {status}")));
        }
        let text = resp
            .text()
            .await
            .map_err(|e| EdgeError::Store(format!("KV body read failed: {e}")))?;
        Ok(non_empty(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Router,
        extract::Path,
        http::{HeaderMap, StatusCode},
        response::IntoResponse,
        routing::get,
    };

    async fn kv_value(
        Path((account, ns, key)): Path<(String, String, String)>,
        headers: HeaderMap,
    ) -> impl IntoResponse {
        let authorized = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            == Some("Bearer kv-token");
        if !authorized {
            return (StatusCode::FORBIDDEN, String::new());
        }
        match (account.as_str(), ns.as_str(), key.as_str()) {
            ("acc", "ns", "manifest_json") => {
                (StatusCode::OK, r#"{"name":"stored"}"#.to_string())
            }
            ("acc", "ns", "empty") => (StatusCode::OK, String::new()),
            ("acc", "ns", "a key/with slash") => (StatusCode::OK, "escaped".to_string()),
            _ => (StatusCode::NOT_FOUND, r#"{"success":false}"#.to_string()),
        }
    }

    async fn spawn_kv_api() -> String {
        let app = Router::new().route(
            "/client/v4/accounts/{account}/storage/kv/namespaces/{ns}/values/{key}",
            get(kv_value),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/client/v4")
    }

    #[tokio::test]
    async fn reads_values_and_maps_404_to_absent() {
        let base = spawn_kv_api().await;
        let store = WorkersKvStore::new(&base, "acc", "ns", "kv-token".into()).unwrap();

        assert_eq!(
            store.get("manifest_json").await.unwrap().as_deref(),
            Some(r#"{"name":"stored"}"#)
        );
        assert_eq!(store.get("missing").await.unwrap(), None);
        assert_eq!(store.get("empty").await.unwrap(), None);
        assert_eq!(
            store.get("a key/with slash").await.unwrap().as_deref(),
            Some("escaped")
        );
    }

    #[tokio::test]
    async fn auth_failure_is_a_store_error() {
        let base = spawn_kv_api().await;
        let store = WorkersKvStore::new(&base, "acc", "ns", "wrong".into()).unwrap();
        assert!(matches!(
            store.get("manifest_json").await,
            Err(EdgeError::Store(_))
        ));
    }

    #[test]
    fn value_url_layout() {
        let store = WorkersKvStore::new(
            "https://api.cloudflare.com/client/v4/",
            "acc",
            "ns",
            "t".into(),
        )
        .unwrap();
        assert_eq!(
            store.value_url("manifest_json").as_str(),
            "https://api.cloudflare.com/client/v4/accounts/acc/storage/kv/namespaces/ns/values/manifest_json"
        );
    }
}
