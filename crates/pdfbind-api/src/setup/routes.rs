//! Router assembly.

use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

// The service only ever receives small JSON bodies; uploads go straight to
// storage under a grant.
const MAX_JSON_BODY_BYTES: usize = 1024 * 1024;

pub fn create_router(state: Arc<AppState>) -> Result<Router, anyhow::Error> {
    let cors = build_cors_layer(&state.config.cors_origins)?;

    let router = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/upload", post(handlers::grants::issue_upload_grants))
        .route("/merge", post(handlers::merge::merge_documents))
        .layer(TraceLayer::new_for_http())
        .layer(RequestBodyLimitLayer::new(MAX_JSON_BODY_BYTES))
        .layer(cors)
        .with_state(state);

    Ok(router)
}

fn build_cors_layer(origins: &[String]) -> Result<CorsLayer, anyhow::Error> {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    if origins.is_empty() {
        Ok(layer.allow_origin(Any))
    } else {
        let parsed: Result<Vec<HeaderValue>, _> =
            origins.iter().map(|o| o.parse::<HeaderValue>()).collect();
        let parsed = parsed.map_err(|e| anyhow::anyhow!("Invalid CORS origin: {}", e))?;
        Ok(layer.allow_origin(AllowOrigin::list(parsed)))
    }
}
