use std::{panic::AssertUnwindSafe, time::Instant};

use axum::{
    extract::Request,
    http::{header::ALLOW, StatusCode, Uri},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use futures::FutureExt;
use serde_json::json;
use tower::ServiceBuilder;

use super::types::ApiError;
use crate::reporting;

/// Wraps the resource routes with the liveness route, the envelope fallback and the shared middleware.
pub fn app(router: Router) -> Router {
    let routes = Router::new()
        .route("/", get(liveness))
        .merge(router)
        .fallback(|| async { ApiError::NotFound })
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(log_request))
                .layer(middleware::from_fn(recover_panic))
                .layer(middleware::map_response(envelope_method_not_allowed)),
        );

    // Rewriting has to happen before routing, so the routes sit behind an outer router as its fallback.
    Router::new().fallback_service(routes).layer(middleware::map_request(strip_trailing_slash))
}

async fn liveness() -> impl IntoResponse {
    Json(json!({ "success": true, "code": StatusCode::OK.as_u16(), "message": "Services run properly" }))
}

async fn log_request(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_owned();
    let started = Instant::now();

    let response = next.run(req).await;

    let status = response.status().as_u16();
    let elapsed_ms = started.elapsed().as_millis() as u64;
    if response.status().is_server_error() {
        tracing::warn!(%method, %path, status, elapsed_ms, "request failed");
    } else {
        tracing::info!(%method, %path, status, elapsed_ms, "request");
    }
    response
}

async fn recover_panic(req: Request, next: Next) -> Response {
    match AssertUnwindSafe(next.run(req)).catch_unwind().await {
        Ok(response) => response,
        Err(panic) => {
            let detail = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_default();
            tracing::error!(panic = %detail, "handler panicked");
            reporting::capture_panic(&detail);
            ApiError::Internal.into_response()
        }
    }
}

// The router answers a known path with the wrong method by an empty 405.
async fn envelope_method_not_allowed(response: Response) -> Response {
    if response.status() != StatusCode::METHOD_NOT_ALLOWED {
        return response;
    }
    let mut enveloped = ApiError::MethodNotAllowed.into_response();
    if let Some(allow) = response.headers().get(ALLOW) {
        enveloped.headers_mut().insert(ALLOW, allow.clone());
    }
    enveloped
}

async fn strip_trailing_slash(mut req: Request) -> Request {
    let path = req.uri().path();
    if path.len() > 1 && path.ends_with('/') {
        let trimmed = match path.trim_end_matches('/') { "" => "/", p => p };
        let rewritten = match req.uri().query() {
            Some(query) => format!("{trimmed}?{query}"),
            None => trimmed.to_owned(),
        };
        if let Ok(uri) = rewritten.parse::<Uri>() {
            *req.uri_mut() = uri;
        }
    }
    req
}
