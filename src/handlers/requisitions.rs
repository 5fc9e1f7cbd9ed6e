use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    auth::ActorContext,
    errors::ServiceError,
    handlers::common::{created_response, success_response},
    services::requisitions::NewRequisitionItem,
    AppState,
};

#[derive(Debug, Deserialize)]
pub struct CreateRequisitionRequest {
    pub job_card_id: Uuid,
    pub items: Vec<NewRequisitionItem>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ReasonRequest {
    pub reason: Option<String>,
}

async fn create_group(
    State(state): State<AppState>,
    actor: ActorContext,
    Json(payload): Json<CreateRequisitionRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let group = state
        .services
        .requisitions
        .create_group(&actor, payload.job_card_id, payload.items)
        .await?;
    Ok(created_response(group))
}

async fn get_group(
    State(state): State<AppState>,
    actor: ActorContext,
    Path(group_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let group = state
        .services
        .requisitions
        .get_group(&actor, group_id)
        .await?;
    Ok(success_response(group))
}

async fn approve_group(
    State(state): State<AppState>,
    actor: ActorContext,
    Path(group_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let outcome = state
        .services
        .requisitions
        .approve_group(&actor, group_id)
        .await?;
    Ok(success_response(outcome))
}

async fn reject_group(
    State(state): State<AppState>,
    actor: ActorContext,
    Path(group_id): Path<Uuid>,
    Json(payload): Json<ReasonRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let outcome = state
        .services
        .requisitions
        .reject_group(&actor, group_id, payload.reason)
        .await?;
    Ok(success_response(outcome))
}

async fn approve_item(
    State(state): State<AppState>,
    actor: ActorContext,
    Path(item_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let item = state
        .services
        .requisitions
        .approve_item(&actor, item_id)
        .await?;
    Ok(success_response(item))
}

async fn reject_item(
    State(state): State<AppState>,
    actor: ActorContext,
    Path(item_id): Path<Uuid>,
    Json(payload): Json<ReasonRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let item = state
        .services
        .requisitions
        .reject_item(&actor, item_id, payload.reason)
        .await?;
    Ok(success_response(item))
}

async fn return_item(
    State(state): State<AppState>,
    actor: ActorContext,
    Path(item_id): Path<Uuid>,
    Json(payload): Json<ReasonRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let item = state
        .services
        .requisitions
        .return_item(&actor, item_id, payload.reason)
        .await?;
    Ok(success_response(item))
}

async fn list_for_job(
    State(state): State<AppState>,
    actor: ActorContext,
    Path(job_card_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let items = state
        .services
        .requisitions
        .list_for_job(&actor, job_card_id)
        .await?;
    Ok(success_response(items))
}

pub fn requisition_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_group))
        .route("/:group_id", get(get_group))
        .route("/:group_id/approve", post(approve_group))
        .route("/:group_id/reject", post(reject_group))
        .route("/items/:item_id/approve", post(approve_item))
        .route("/items/:item_id/reject", post(reject_item))
        .route("/items/:item_id/return", post(return_item))
        .route("/by-job/:job_card_id", get(list_for_job))
}
