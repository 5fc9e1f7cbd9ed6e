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
    entities::inventory_movement::ReferenceType,
    errors::ServiceError,
    handlers::common::{success_response, PaginatedResponse, PaginationParams},
    AppState,
};

#[derive(Debug, Deserialize)]
pub struct AdjustStockRequest {
    /// Signed delta; negative debits stock.
    pub delta: i32,
    /// One of "requisition", "requisition_return", "adjustment", "sale".
    pub reference_type: String,
    pub reference_id: Uuid,
    pub reason: Option<String>,
}

async fn list_products(
    State(state): State<AppState>,
    actor: ActorContext,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl IntoResponse, ServiceError> {
    let (page, per_page) = pagination.clamped(state.config.api_max_page_size as u64);
    let (products, total) = state
        .services
        .inventory
        .list_products(&actor, page, per_page)
        .await?;
    Ok(success_response(PaginatedResponse::new(
        products, page, per_page, total,
    )))
}

async fn get_product(
    State(state): State<AppState>,
    actor: ActorContext,
    Path(product_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let product = state
        .services
        .inventory
        .get_product(&actor, product_id)
        .await?;
    Ok(success_response(product))
}

async fn adjust_stock(
    State(state): State<AppState>,
    actor: ActorContext,
    Path(product_id): Path<Uuid>,
    Json(payload): Json<AdjustStockRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let reference_type = ReferenceType::from_str(&payload.reference_type).map_err(|_| {
        ServiceError::ValidationError(format!(
            "unknown reference_type {}",
            payload.reference_type
        ))
    })?;
    let movement = state
        .services
        .inventory
        .adjust_stock(
            &actor,
            product_id,
            payload.delta,
            reference_type,
            payload.reference_id,
            payload.reason,
        )
        .await?;
    Ok(success_response(movement))
}

async fn list_movements(
    State(state): State<AppState>,
    actor: ActorContext,
    Path(product_id): Path<Uuid>,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl IntoResponse, ServiceError> {
    let (page, per_page) = pagination.clamped(state.config.api_max_page_size as u64);
    let (movements, total) = state
        .services
        .inventory
        .list_movements(&actor, product_id, page, per_page)
        .await?;
    Ok(success_response(PaginatedResponse::new(
        movements, page, per_page, total,
    )))
}

pub fn inventory_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products))
        .route("/:id", get(get_product))
        .route("/:id/adjust", post(adjust_stock))
        .route("/:id/movements", get(list_movements))
}
