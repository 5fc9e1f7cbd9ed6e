use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    auth::ActorContext,
    errors::ServiceError,
    handlers::common::{created_response, success_response, PaginatedResponse, PaginationParams},
    services::invoicing::{GenerateInvoiceRequest, RecordPaymentRequest},
    AppState,
};

#[derive(Debug, Deserialize)]
pub struct CreateInvoiceRequest {
    pub job_card_id: Uuid,
    pub tax_pct: Option<Decimal>,
    pub discount_pct: Option<Decimal>,
    pub notes: Option<String>,
}

async fn generate_invoice(
    State(state): State<AppState>,
    actor: ActorContext,
    Json(payload): Json<CreateInvoiceRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let detail = state
        .services
        .invoicing
        .generate_invoice(
            &actor,
            payload.job_card_id,
            GenerateInvoiceRequest {
                tax_pct: payload.tax_pct,
                discount_pct: payload.discount_pct,
                notes: payload.notes,
            },
        )
        .await?;
    Ok(created_response(detail))
}

async fn list_invoices(
    State(state): State<AppState>,
    actor: ActorContext,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl IntoResponse, ServiceError> {
    let (page, per_page) = pagination.clamped(state.config.api_max_page_size as u64);
    let (invoices, total) = state
        .services
        .invoicing
        .list(&actor, page, per_page)
        .await?;
    Ok(success_response(PaginatedResponse::new(
        invoices, page, per_page, total,
    )))
}

async fn get_invoice(
    State(state): State<AppState>,
    actor: ActorContext,
    Path(invoice_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let detail = state.services.invoicing.get(&actor, invoice_id).await?;
    Ok(success_response(detail))
}

async fn record_payment(
    State(state): State<AppState>,
    actor: ActorContext,
    Path(invoice_id): Path<Uuid>,
    Json(payload): Json<RecordPaymentRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let detail = state
        .services
        .invoicing
        .record_payment(&actor, invoice_id, payload)
        .await?;
    Ok(success_response(detail))
}

pub fn invoice_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(generate_invoice).get(list_invoices))
        .route("/:id", get(get_invoice))
        .route("/:id/payments", post(record_payment))
}
