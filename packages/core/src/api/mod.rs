//! HTTP surface.
//!
//! [`create_router`] assembles every route the binary serves. Integration
//! tests call it too, so the test app is the production app.

pub mod health;
pub mod warns;

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    middleware,
    response::Response,
    routing::get,
    Router,
};
use sqlx::SqlitePool;
use tower_http::trace::TraceLayer;

use crate::metrics::{track_http, AppMetrics};

pub use warns::{create_warns_router, WarnsApiState, WarnsState};

/// `GET /metrics`: Prometheus text exposition.
pub async fn render_metrics(State(metrics): State<Arc<AppMetrics>>) -> Response {
    let (status, content_type, body) = match metrics.render() {
        Ok(body) => (StatusCode::OK, "text/plain; version=0.0.4", body),
        Err(err) => {
            tracing::error!("Failed to render metrics: {}", err);
            (StatusCode::INTERNAL_SERVER_ERROR, "text/plain", "metrics error".to_string())
        }
    };

    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from(body))
        .expect("metrics response should be valid")
}

pub fn create_router(state: WarnsState, pool: SqlitePool) -> Router {
    let metrics = state.metrics.clone();

    Router::new()
        .merge(
            Router::new()
                .route("/health", get(health::health))
                .with_state(pool),
        )
        .merge(
            Router::new()
                .route("/metrics", get(render_metrics))
                .with_state(metrics.clone()),
        )
        .merge(create_warns_router(state))
        .layer(middleware::from_fn_with_state(metrics, track_http))
        .layer(TraceLayer::new_for_http())
}
