use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::str::FromStr;
use uuid::Uuid;

use crate::{
    auth::ActorContext,
    entities::job_card::JobStatus,
    errors::ServiceError,
    handlers::common::{created_response, success_response, PaginatedResponse, PaginationParams},
    services::job_cards::{NewJobCard, NewServiceTask},
    AppState,
};

#[derive(Debug, Deserialize)]
pub struct ListJobCardsQuery {
    pub status: Option<String>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Deserialize, Default)]
pub struct SubmitQcRequest {
    pub notes: Option<String>,
}

async fn create_job_card(
    State(state): State<AppState>,
    actor: ActorContext,
    Json(payload): Json<NewJobCard>,
) -> Result<impl IntoResponse, ServiceError> {
    let job = state.services.job_cards.create(&actor, payload).await?;
    Ok(created_response(job))
}

async fn list_job_cards(
    State(state): State<AppState>,
    actor: ActorContext,
    Query(query): Query<ListJobCardsQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let status = query
        .status
        .as_deref()
        .map(|s| {
            JobStatus::from_str(s)
                .map_err(|_| ServiceError::ValidationError(format!("unknown job status {}", s)))
        })
        .transpose()?;
    let (page, per_page) = query
        .pagination
        .clamped(state.config.api_max_page_size as u64);
    let (jobs, total) = state
        .services
        .job_cards
        .list(&actor, status, page, per_page)
        .await?;
    Ok(success_response(PaginatedResponse::new(
        jobs, page, per_page, total,
    )))
}

async fn get_job_card(
    State(state): State<AppState>,
    actor: ActorContext,
    Path(job_card_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let job = state.services.job_cards.get(&actor, job_card_id).await?;
    Ok(success_response(job))
}

async fn job_history(
    State(state): State<AppState>,
    actor: ActorContext,
    Path(job_card_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let history = state
        .services
        .job_cards
        .history(&actor, job_card_id)
        .await?;
    Ok(success_response(history))
}

async fn start_work(
    State(state): State<AppState>,
    actor: ActorContext,
    Path(job_card_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let job = state
        .services
        .job_cards
        .start_work(&actor, job_card_id)
        .await?;
    Ok(success_response(job))
}

async fn submit_for_qc(
    State(state): State<AppState>,
    actor: ActorContext,
    Path(job_card_id): Path<Uuid>,
    Json(payload): Json<SubmitQcRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let (job, request) = state
        .services
        .job_cards
        .submit_for_qc(&actor, job_card_id, payload.notes)
        .await?;
    Ok(success_response(serde_json::json!({
        "job_card": job,
        "qc_request": request,
    })))
}

async fn list_tasks(
    State(state): State<AppState>,
    actor: ActorContext,
    Path(job_card_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let tasks = state.services.job_cards.tasks(&actor, job_card_id).await?;
    Ok(success_response(tasks))
}

async fn add_task(
    State(state): State<AppState>,
    actor: ActorContext,
    Path(job_card_id): Path<Uuid>,
    Json(payload): Json<NewServiceTask>,
) -> Result<impl IntoResponse, ServiceError> {
    let task = state
        .services
        .job_cards
        .add_task(&actor, job_card_id, payload)
        .await?;
    Ok(created_response(task))
}

async fn complete_task(
    State(state): State<AppState>,
    actor: ActorContext,
    Path((job_card_id, task_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ServiceError> {
    let task = state
        .services
        .job_cards
        .complete_task(&actor, job_card_id, task_id)
        .await?;
    Ok(success_response(task))
}

pub fn job_card_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_job_card).get(list_job_cards))
        .route("/:id", get(get_job_card))
        .route("/:id/history", get(job_history))
        .route("/:id/start", post(start_work))
        .route("/:id/submit-qc", post(submit_for_qc))
        .route("/:id/tasks", get(list_tasks).post(add_task))
        .route("/:id/tasks/:task_id/complete", post(complete_task))
}
