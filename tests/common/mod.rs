#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, Response},
    Router,
};
use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;
use workshop_api::{
    auth::{ActorContext, Role},
    config::AppConfig,
    db,
    entities::{product, product_batch},
    events::{Event, EventSender},
    handlers::AppServices,
    AppState,
};

/// Labor rate and tax rate used by every test invoice.
pub const TEST_LABOR_RATE: Decimal = dec!(75.00);
pub const TEST_TAX_RATE_PERCENT: Decimal = dec!(10);

/// Test harness backed by an in-memory SQLite database with a single pooled
/// connection, so every query and transaction sees the same schema.
pub struct TestApp {
    pub db: Arc<DatabaseConnection>,
    pub services: AppServices,
    pub router: Router,
    _event_rx: mpsc::Receiver<Event>,
}

fn test_config() -> AppConfig {
    AppConfig {
        database_url: "sqlite::memory:".into(),
        host: "127.0.0.1".into(),
        port: 18080,
        environment: "test".into(),
        log_level: "warn".into(),
        log_json: false,
        auto_migrate: true,
        db_max_connections: 1,
        db_min_connections: 1,
        db_connect_timeout_secs: 30,
        db_idle_timeout_secs: 600,
        db_acquire_timeout_secs: 8,
        event_channel_capacity: 256,
        labor_rate: 75.0,
        tax_rate_percent: 10.0,
        api_default_page_size: 20,
        api_max_page_size: 100,
    }
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        let mut opts = ConnectOptions::new("sqlite::memory:".to_owned());
        opts.max_connections(1).min_connections(1).sqlx_logging(false);
        let pool = Database::connect(opts)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let db = Arc::new(pool);
        let (event_tx, event_rx) = mpsc::channel(256);
        let event_sender = Arc::new(EventSender::new(event_tx));

        let services = AppServices::new(
            db.clone(),
            event_sender.clone(),
            TEST_LABOR_RATE,
            TEST_TAX_RATE_PERCENT,
        );

        let state = AppState {
            db: db.clone(),
            config: test_config(),
            event_sender,
            services: services.clone(),
        };
        let router = Router::new()
            .nest("/api/v1", workshop_api::api_v1_routes())
            .with_state(state);

        Self {
            db,
            services,
            router,
            _event_rx: event_rx,
        }
    }

    /// Issues a request carrying the actor's identity headers.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        actor: &ActorContext,
        body: Option<Value>,
    ) -> Response<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("x-actor-id", actor.actor_id.to_string())
            .header("x-dealer-id", actor.dealer_id.to_string())
            .header("x-actor-role", actor.role.to_string());
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("request failed")
    }

    /// Issues a request with no identity headers at all.
    pub async fn request_anonymous(&self, method: Method, uri: &str) -> Response<Body> {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("request failed")
    }

    pub async fn seed_product(
        &self,
        dealer_id: Uuid,
        sku: &str,
        stock_quantity: i32,
        price: Decimal,
    ) -> product::Model {
        product::ActiveModel {
            id: Set(Uuid::new_v4()),
            dealer_id: Set(dealer_id),
            name: Set(format!("Part {}", sku)),
            sku: Set(sku.to_string()),
            price: Set(price),
            sale_price: Set(None),
            stock_quantity: Set(stock_quantity),
            low_stock_threshold: Set(2),
            stock_status: Set(product::StockStatus::derive(stock_quantity, 2).to_string()),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        }
        .insert(self.db.as_ref())
        .await
        .expect("failed to seed product")
    }

    pub async fn seed_batch(
        &self,
        product: &product::Model,
        batch_number: &str,
        current_quantity: i32,
    ) -> product_batch::Model {
        product_batch::ActiveModel {
            id: Set(Uuid::new_v4()),
            product_id: Set(product.id),
            dealer_id: Set(product.dealer_id),
            batch_number: Set(batch_number.to_string()),
            current_quantity: Set(current_quantity),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        }
        .insert(self.db.as_ref())
        .await
        .expect("failed to seed batch")
    }
}

pub fn technician(dealer_id: Uuid) -> ActorContext {
    ActorContext {
        actor_id: Uuid::new_v4(),
        dealer_id,
        role: Role::Technician,
    }
}

pub fn admin(dealer_id: Uuid) -> ActorContext {
    ActorContext {
        actor_id: Uuid::new_v4(),
        dealer_id,
        role: Role::Admin,
    }
}

pub fn super_admin(dealer_id: Uuid) -> ActorContext {
    ActorContext {
        actor_id: Uuid::new_v4(),
        dealer_id,
        role: Role::SuperAdmin,
    }
}
