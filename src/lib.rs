//! Workshop API Library
//!
//! Core functionality for the dealership workshop API: job cards, parts
//! requisitions, stock adjustments, QC reviews and service invoicing.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod services;

use axum::{extract::State, response::Json, routing::get, Router};
use sea_orm::DatabaseConnection;
use serde_json::{json, Value};
use std::sync::Arc;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: Arc<events::EventSender>,
    pub services: handlers::AppServices,
}

pub fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .route("/status", get(api_status))
        .route("/health", get(health_check))
        .nest("/job-cards", handlers::job_cards::job_card_routes())
        .nest("/requisitions", handlers::requisitions::requisition_routes())
        .nest(
            "/stock-adjustments",
            handlers::stock_adjustments::stock_adjustment_routes(),
        )
        .nest("/qc", handlers::qc::qc_routes())
        .nest("/invoices", handlers::invoices::invoice_routes())
        .nest("/inventory", handlers::inventory::inventory_routes())
}

async fn api_status() -> Result<Json<Value>, errors::ServiceError> {
    let version = env!("CARGO_PKG_VERSION");
    Ok(Json(json!({
        "status": "ok",
        "version": version,
        "service": "workshop-api",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    })))
}

async fn health_check(State(state): State<AppState>) -> Result<Json<Value>, errors::ServiceError> {
    let db_status = match db::check_connection(&state.db).await {
        Ok(_) => "healthy",
        Err(_) => "unhealthy",
    };

    Ok(Json(json!({
        "status": db_status,
        "checks": {
            "database": db_status,
        },
        "timestamp": chrono::Utc::now().to_rfc3339(),
    })))
}
