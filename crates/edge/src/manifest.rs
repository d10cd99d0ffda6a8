//! Manifest responder.
//!
//! Every outcome is a `200`: an empty store serves the fallback, a store failure is logged and
//! treated as empty, and unparsable stored text is served verbatim.

use crate::context::EdgeContext;
use crate::logging::RequestLog;
use axum::Extension;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, Uri, header};
use axum::response::{IntoResponse, Response};
use std::sync::Arc;
use stelae_manifest::{ResolutionOutcome, resolve};

pub const MANIFEST_CONTENT_TYPE: &str = "application/json; charset=utf-8";
pub const MANIFEST_CACHE_CONTROL: &str =
    "public, s-maxage=600, stale-while-revalidate=60, stale-if-error=86400";
pub const SERVED_BY_HEADER: &str = "x-worker";
pub const SERVED_BY: &str = "stelae-manifest";

/// Attach the manifest header set to `body`.
#[must_use]
pub fn manifest_response(body: String) -> Response {
    (
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static(MANIFEST_CONTENT_TYPE),
            ),
            (
                header::CACHE_CONTROL,
                HeaderValue::from_static(MANIFEST_CACHE_CONTROL),
            ),
            (
                HeaderName::from_static(SERVED_BY_HEADER),
                HeaderValue::from_static(SERVED_BY),
            ),
        ],
        body,
    )
        .into_response()
}

pub(crate) async fn manifest(
    Extension(ctx): Extension<Arc<EdgeContext>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    let log = RequestLog::new(&method, &uri, &headers);
    let origin = ctx.origin_policy.request_origin(&headers, &uri);

    let raw = match ctx.store.get(&ctx.manifest_key).await {
        Ok(raw) => raw,
        Err(e) => {
            tracing::warn!(
                stage = "store_error",
                store = ctx.store.kind(),
                key = %ctx.manifest_key,
                error = %e,
                "manifest store read failed; serving fallback"
            );
            None
        }
    };

    let resolution = resolve(raw.as_deref(), &origin, &ctx.allowlist);
    if let ResolutionOutcome::Unparsed { error } = &resolution.outcome {
        log.stage_error("manifest_parse_error", error);
    }
    log.stage_with_outcome("manifest", resolution.outcome.as_str());

    manifest_response(resolution.body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn response_carries_fixed_headers() {
        let resp = manifest_response("not json".to_string());
        assert_eq!(resp.status(), StatusCode::OK);
        let h = resp.headers();
        assert_eq!(h[header::CONTENT_TYPE], MANIFEST_CONTENT_TYPE);
        assert_eq!(
            h[header::CACHE_CONTROL],
            "public, s-maxage=600, stale-while-revalidate=60, stale-if-error=86400"
        );
        assert_eq!(h["x-worker"], "stelae-manifest");
    }
}
