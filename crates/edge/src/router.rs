use crate::context::EdgeContext;
use crate::diag::{DIAG_PATH, diag, root_redirect};
use crate::logging::RequestLog;
use crate::manifest::manifest;
use axum::{
    Extension, Router,
    extract::Request,
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::any,
};
use std::sync::Arc;
use stelae_manifest::MANIFEST_PATH;

/// Build the edge router: diag, root redirect, manifest, and origin pass-through for
/// everything else.
pub fn router(ctx: EdgeContext) -> Router {
    Router::new()
        .route(DIAG_PATH, any(diag))
        .route("/", any(root_redirect))
        .route(MANIFEST_PATH, any(manifest))
        .fallback(forward)
        .layer(middleware::from_fn(log_request))
        .layer(Extension(Arc::new(ctx)))
}

async fn log_request(req: Request, next: Next) -> Response {
    RequestLog::new(req.method(), req.uri(), req.headers()).stage("request");
    next.run(req).await
}

async fn forward(Extension(ctx): Extension<Arc<EdgeContext>>, req: Request) -> Response {
    let log = RequestLog::new(req.method(), req.uri(), req.headers());
    log.stage("forward");
    match ctx.fetcher.forward(req).await {
        Ok(resp) => resp,
        Err(e) => {
            log.stage_error("forward_error", &e.to_string());
            (StatusCode::BAD_GATEWAY, format!("origin unreachable: {e}")).into_response()
        }
    }
}
