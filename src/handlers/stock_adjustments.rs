use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    auth::ActorContext,
    errors::ServiceError,
    handlers::common::{created_response, success_response, PaginatedResponse, PaginationParams},
    services::stock_adjustments::NewAdjustmentLine,
    AppState,
};

#[derive(Debug, Deserialize)]
pub struct ProposeAdjustmentRequest {
    pub reason: String,
    pub lines: Vec<NewAdjustmentLine>,
}

#[derive(Debug, Deserialize)]
pub struct RejectAdjustmentRequest {
    pub reason: String,
}

async fn propose(
    State(state): State<AppState>,
    actor: ActorContext,
    Json(payload): Json<ProposeAdjustmentRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let detail = state
        .services
        .stock_adjustments
        .propose(&actor, payload.reason, payload.lines)
        .await?;
    Ok(created_response(detail))
}

async fn list(
    State(state): State<AppState>,
    actor: ActorContext,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl IntoResponse, ServiceError> {
    let (page, per_page) = pagination.clamped(state.config.api_max_page_size as u64);
    let (adjustments, total) = state
        .services
        .stock_adjustments
        .list(&actor, page, per_page)
        .await?;
    Ok(success_response(PaginatedResponse::new(
        adjustments,
        page,
        per_page,
        total,
    )))
}

async fn get_adjustment(
    State(state): State<AppState>,
    actor: ActorContext,
    Path(adjustment_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let detail = state
        .services
        .stock_adjustments
        .get(&actor, adjustment_id)
        .await?;
    Ok(success_response(detail))
}

async fn approve(
    State(state): State<AppState>,
    actor: ActorContext,
    Path(adjustment_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let detail = state
        .services
        .stock_adjustments
        .approve(&actor, adjustment_id)
        .await?;
    Ok(success_response(detail))
}

async fn reject(
    State(state): State<AppState>,
    actor: ActorContext,
    Path(adjustment_id): Path<Uuid>,
    Json(payload): Json<RejectAdjustmentRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let adjustment = state
        .services
        .stock_adjustments
        .reject(&actor, adjustment_id, payload.reason)
        .await?;
    Ok(success_response(adjustment))
}

pub fn stock_adjustment_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(propose).get(list))
        .route("/:id", get(get_adjustment))
        .route("/:id/approve", post(approve))
        .route("/:id/reject", post(reject))
}
