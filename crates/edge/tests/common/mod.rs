#![allow(dead_code)]

use anyhow::Context as _;
use axum::{
    Json, Router,
    body::Bytes,
    http::{HeaderMap, Method, StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use serde_json::{Map, Value, json};
use std::process::{Command, Stdio};
use std::sync::Arc;
use stelae_manifest_edge::forward::HttpOriginFetcher;
use stelae_manifest_edge::store::ManifestStore;
use stelae_manifest_edge::{EdgeContext, router};

pub use stelae_test_support::{
    KillOnDrop, http_client, pick_unused_port, spawn_router, wait_http_ok,
};

/// Context forwarding to `origin_base` and reading manifests from `store`.
pub fn context(store: Arc<dyn ManifestStore>, origin_base: &str) -> anyhow::Result<EdgeContext> {
    let fetcher = HttpOriginFetcher::new(origin_base.parse().context("parse origin url")?)?;
    Ok(EdgeContext::new(store, Arc::new(fetcher)))
}

/// Serve the edge router in-process.
pub async fn spawn_edge(ctx: EdgeContext) -> anyhow::Result<String> {
    spawn_router(router(ctx)).await
}

async fn echo(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Response {
    if uri.path() == "/moved" {
        return (StatusCode::FOUND, [(header::LOCATION, "/elsewhere")]).into_response();
    }
    let headers: Map<String, Value> = headers
        .iter()
        .map(|(k, v)| (k.to_string(), json!(v.to_str().unwrap_or_default())))
        .collect();
    (
        StatusCode::CREATED,
        [("x-origin", "stub")],
        Json(json!({
            "method": method.as_str(),
            "path": uri.path(),
            "query": uri.query(),
            "headers": headers,
            "body": String::from_utf8_lossy(&body),
        })),
    )
        .into_response()
}

/// Origin stub that echoes the request it received as JSON with status 201.
///
/// `/moved` answers 302 so redirect pass-through can be observed.
pub async fn spawn_stub_origin() -> anyhow::Result<String> {
    spawn_router(Router::new().fallback(echo)).await
}

pub fn spawn_edge_binary(args: &[&str]) -> anyhow::Result<KillOnDrop> {
    let bin = env!("CARGO_BIN_EXE_stelae-manifest-edge");
    let child = Command::new(bin)
        .args(args)
        .env("RUST_LOG", "info")
        .stdout(Stdio::null())
        .stderr(Stdio::inherit())
        .spawn()
        .context("spawn stelae-manifest-edge")?;
    Ok(KillOnDrop(child))
}
