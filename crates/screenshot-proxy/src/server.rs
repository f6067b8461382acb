//! HTTP server for the screenshot endpoints
//!
//! Provides /health, GET and DELETE /screenshot, and /screenshot/stats.

use crate::fetcher::ScreenshotFetcher;
use crate::placeholder;
use crate::types::{ClearResponse, HealthResponse, ScreenshotQuery, ScreenshotRequest};
use axum::{
    body::Body,
    extract::{rejection::QueryRejection, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use screenshot_cache::{CacheStats, ScreenshotCache};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

/// Shared state for the HTTP server
pub struct ServerState {
    pub cache: ScreenshotCache,
    pub fetcher: ScreenshotFetcher,
    pub started_at: DateTime<Utc>,
}

impl ServerState {
    pub fn new(cache: ScreenshotCache, fetcher: ScreenshotFetcher) -> Self {
        Self {
            cache,
            fetcher,
            started_at: Utc::now(),
        }
    }
}

pub type SharedState = Arc<ServerState>;

/// Error response
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// Where the bytes of a screenshot response came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Source {
    Hit,
    Miss,
    Placeholder,
}

impl Source {
    fn header_value(self) -> &'static str {
        match self {
            Source::Hit => "HIT",
            Source::Miss => "MISS",
            Source::Placeholder => "PLACEHOLDER",
        }
    }
}

/// Create the HTTP router
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/screenshot", get(get_screenshot).delete(clear_screenshots))
        .route("/screenshot/stats", get(screenshot_stats))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the HTTP server
pub async fn start_server(state: SharedState, port: u16) -> std::io::Result<()> {
    let router = create_router(state);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await
}

/// Health check endpoint
async fn health(State(state): State<SharedState>) -> Json<HealthResponse> {
    let cache_stats = state.cache.stats().await;
    let uptime_secs = (Utc::now() - state.started_at).num_seconds().max(0) as u64;

    Json(HealthResponse {
        status: "ok".to_string(),
        uptime_secs,
        cache: cache_stats,
    })
}

/// Get a screenshot for `?url=&width=&height=`, rendering and caching it on
/// a miss and falling back to a placeholder when rendering fails
async fn get_screenshot(
    State(state): State<SharedState>,
    query: Result<Query<ScreenshotQuery>, QueryRejection>,
) -> Response {
    // Malformed numbers get the same JSON error body as failed validation
    let Query(query) = match query {
        Ok(query) => query,
        Err(rejection) => {
            let error = rejection.body_text();
            return (StatusCode::BAD_REQUEST, Json(ErrorResponse { error })).into_response();
        }
    };

    let request = match ScreenshotRequest::try_from(query) {
        Ok(request) => request,
        Err(error) => {
            return (StatusCode::BAD_REQUEST, Json(ErrorResponse { error })).into_response()
        }
    };

    let (data, content_type, source) = fetch_and_cache_screenshot(&state, &request).await;

    let cache_control = match source {
        Source::Placeholder => "no-store",
        _ => "public, max-age=86400",
    };

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CACHE_CONTROL, cache_control)
        .header("X-Cache", source.header_value())
        .body(Body::from(data))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

/// Drop every cached screenshot
async fn clear_screenshots(State(state): State<SharedState>) -> Json<ClearResponse> {
    let removed = state.cache.clear().await;
    Json(ClearResponse {
        cleared: true,
        removed,
    })
}

/// Cache statistics
async fn screenshot_stats(State(state): State<SharedState>) -> Json<CacheStats> {
    Json(state.cache.stats().await)
}

/// Serve from cache if possible, otherwise render, cache, and serve
async fn fetch_and_cache_screenshot(
    state: &ServerState,
    request: &ScreenshotRequest,
) -> (Vec<u8>, &'static str, Source) {
    let ScreenshotRequest { url, width, height } = request;

    if let Some(data) = state.cache.get(url, *width, *height).await {
        return (data, "image/png", Source::Hit);
    }

    match state.fetcher.fetch(url, *width, *height).await {
        Ok(data) => {
            state.cache.put(url, *width, *height, &data).await;
            (data, "image/png", Source::Miss)
        }
        Err(e) => {
            warn!(url = %url, width, height, error = %e, "Failed to render screenshot, serving placeholder");
            let svg = placeholder::render(url, *width, *height);
            (svg.into_bytes(), placeholder::CONTENT_TYPE, Source::Placeholder)
        }
    }
}
