use crate::context::EdgeContext;
use crate::logging::{RequestLog, now_millis};
use axum::Extension;
use axum::Json;
use axum::http::{HeaderMap, Method, Uri};
use axum::response::{IntoResponse, Redirect, Response};
use serde::Serialize;
use std::sync::Arc;
use stelae_manifest::endpoint_url;

pub const DIAG_PATH: &str = "/__diag";

#[derive(Debug, Serialize)]
pub struct DiagResponse {
    pub ok: bool,
    pub host: String,
    pub path: String,
    pub ts: i64,
}

/// Fixed diagnostic payload, for any method.
pub(crate) async fn diag(
    Extension(ctx): Extension<Arc<EdgeContext>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    RequestLog::new(&method, &uri, &headers).stage("diag");
    Json(DiagResponse {
        ok: true,
        host: ctx.origin_policy.request_host(&headers, &uri),
        path: uri.path().to_string(),
        ts: now_millis(),
    })
    .into_response()
}

/// `/` sends clients to the protocol endpoint on the same origin.
pub(crate) async fn root_redirect(
    Extension(ctx): Extension<Arc<EdgeContext>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    RequestLog::new(&method, &uri, &headers).stage("redirect");
    let origin = ctx.origin_policy.request_origin(&headers, &uri);
    Redirect::temporary(&endpoint_url(&origin)).into_response()
}
