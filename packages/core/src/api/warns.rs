//! Warning endpoints.
//!
//! Routes:
//! - `POST /warns`: record a warning and fan it out
//! - `GET  /warns/:id`: a warning event by the `content_id` `POST` returned
//! - `GET  /users/:uid/warns`: paginated history for a user
//! - `GET  /users/:uid/warns/daily`: per-day counts over a recent window

use std::collections::BTreeSet;
use std::fmt::Display;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::metrics::AppMetrics;
use crate::services::{WarnFanoutService, WarnQueryService};
use crate::types::{UserId, UserWarn, UserWarnCount, WarnContentId, WarnType};

pub const DEFAULT_PAGE_SIZE: u32 = 20;

pub struct WarnsApiState {
    pub fanout: Arc<WarnFanoutService>,
    pub query: Arc<WarnQueryService>,
    pub metrics: Arc<AppMetrics>,
    pub max_page_size: u32,
    pub default_count_days: u32,
}

pub type WarnsState = Arc<WarnsApiState>;

type ApiError = (StatusCode, Json<Value>);

fn api_error(status: StatusCode, message: impl Display) -> ApiError {
    (status, Json(serde_json::json!({ "error": message.to_string() })))
}

pub fn create_warns_router(state: WarnsState) -> Router {
    Router::new()
        .route("/warns", post(create_warn))
        .route("/warns/:id", get(get_warn))
        .route("/users/:uid/warns", get(list_user_warns))
        .route("/users/:uid/warns/daily", get(daily_warn_counts))
        .with_state(state)
}

// ---- Request / response shapes ----

#[derive(Debug, Deserialize)]
pub struct CreateWarnRequest {
    /// Explicit recipients. Empty means "the monitor users".
    #[serde(default)]
    pub uids: Vec<UserId>,
    pub warn_type: WarnType,
    #[serde(default)]
    pub resource: String,
    pub content: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateWarnResponse {
    pub content_id: WarnContentId,
    pub recipients: usize,
    pub inserted: u64,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub offset: Option<u32>,
    pub size: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct UserWarnPage {
    pub total: i64,
    pub items: Vec<UserWarn>,
}

#[derive(Debug, Deserialize)]
pub struct DailyQuery {
    pub days: Option<u32>,
}

// ---- Handlers ----

/// `POST /warns`: 201 with the fan-out result, or 204 when there was
/// nothing to record.
pub async fn create_warn(
    State(state): State<WarnsState>,
    Json(body): Json<CreateWarnRequest>,
) -> Result<Response, ApiError> {
    let recipients: BTreeSet<UserId> = body.uids.into_iter().collect();

    let result = state
        .fanout
        .save(&recipients, body.warn_type, &body.resource, body.content.as_deref())
        .await;

    match result {
        Ok(Some(outcome)) => {
            state.metrics.warn_events_total.inc();
            state.metrics.warn_rows_total.inc_by(outcome.inserted as f64);
            let response = CreateWarnResponse {
                content_id: outcome.content.id,
                recipients: outcome.recipients,
                inserted: outcome.inserted,
            };
            Ok((StatusCode::CREATED, Json(response)).into_response())
        }
        Ok(None) => {
            state.metrics.warn_noop_total.inc();
            Ok(StatusCode::NO_CONTENT.into_response())
        }
        Err(err) => {
            state.metrics.warn_failures_total.inc();
            tracing::error!("Saving {} warn on {} failed: {}", body.warn_type, body.resource, err);
            let mut payload = serde_json::json!({ "error": err.to_string() });
            if let Some(content_id) = err.orphaned_content() {
                payload["content_id"] = content_id.into();
            }
            Err((StatusCode::INTERNAL_SERVER_ERROR, Json(payload)))
        }
    }
}

/// `GET /users/:uid/warns`: `size` defaults to 20 and is clamped to the
/// configured maximum.
pub async fn list_user_warns(
    State(state): State<WarnsState>,
    Path(uid): Path<UserId>,
    Query(params): Query<ListQuery>,
) -> Result<Json<UserWarnPage>, ApiError> {
    let size = params
        .size
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, state.max_page_size.max(1));
    let offset = params.offset.unwrap_or(0);

    let (items, total) = tokio::try_join!(
        state.query.list_by_user(uid, offset, size),
        state.query.count_by_user(uid),
    )
    .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e))?;

    Ok(Json(UserWarnPage { total, items }))
}

/// `GET /users/:uid/warns/daily?days=N`
pub async fn daily_warn_counts(
    State(state): State<WarnsState>,
    Path(uid): Path<UserId>,
    Query(params): Query<DailyQuery>,
) -> Result<Json<Vec<UserWarnCount>>, ApiError> {
    let days = params.days.unwrap_or(state.default_count_days);

    let counts = state
        .query
        .count_by_user_since(uid, days)
        .await
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e))?;

    Ok(Json(counts))
}

/// `GET /warns/:id`, where `id` is the warning's content id.
pub async fn get_warn(
    State(state): State<WarnsState>,
    Path(wid): Path<WarnContentId>,
) -> Result<Json<UserWarn>, ApiError> {
    state
        .query
        .get_detail(wid)
        .await
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e))?
        .map(Json)
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "Warn not found"))
}
