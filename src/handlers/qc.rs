use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::{
    auth::ActorContext, errors::ServiceError, handlers::common::success_response,
    services::qc::QcVerdict, AppState,
};

async fn list_pending(
    State(state): State<AppState>,
    actor: ActorContext,
) -> Result<impl IntoResponse, ServiceError> {
    let requests = state.services.qc.list_pending(&actor).await?;
    Ok(success_response(requests))
}

async fn get_review(
    State(state): State<AppState>,
    actor: ActorContext,
    Path(qc_request_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let detail = state.services.qc.get(&actor, qc_request_id).await?;
    Ok(success_response(detail))
}

async fn review(
    State(state): State<AppState>,
    actor: ActorContext,
    Path(qc_request_id): Path<Uuid>,
    Json(payload): Json<QcVerdict>,
) -> Result<impl IntoResponse, ServiceError> {
    let detail = state
        .services
        .qc
        .review(&actor, qc_request_id, payload)
        .await?;
    Ok(success_response(detail))
}

pub fn qc_routes() -> Router<AppState> {
    Router::new()
        .route("/pending", get(list_pending))
        .route("/:id", get(get_review))
        .route("/:id/review", post(review))
}
