use crate::{
    auth::ActorContext,
    entities::{
        inventory_movement::{self, Entity as InventoryMovement, MovementType, ReferenceType},
        product::{self, Entity as Product, StockStatus},
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionError, TransactionTrait,
};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// One requested change to a product's stock, applied inside a caller-owned
/// transaction.
#[derive(Debug, Clone)]
pub struct StockChange {
    pub dealer_id: Uuid,
    pub product_id: Uuid,
    pub batch_id: Option<Uuid>,
    /// Signed delta; negative debits stock.
    pub delta: i32,
    pub reference_type: ReferenceType,
    pub reference_id: Uuid,
    pub reason: Option<String>,
    pub performed_by: Uuid,
}

/// Applies one stock change as a read-modify-write over the locked product
/// row and records the matching movement. This is the only code path that
/// mutates `stock_quantity`, so the ledger stays complete.
///
/// The product row is taken `FOR UPDATE` so concurrent changes serialize;
/// the resulting quantity may go negative and is tolerated.
pub(crate) async fn apply_stock_change<C: ConnectionTrait>(
    txn: &C,
    change: StockChange,
) -> Result<inventory_movement::Model, ServiceError> {
    let product = Product::find_by_id(change.product_id)
        .lock_exclusive()
        .one(txn)
        .await
        .map_err(ServiceError::db_error)?
        .ok_or_else(|| {
            ServiceError::NotFound(format!("product {} not found", change.product_id))
        })?;

    if product.dealer_id != change.dealer_id {
        return Err(ServiceError::Forbidden(
            "product belongs to another dealer".to_string(),
        ));
    }

    let quantity_before = product.stock_quantity;
    let quantity_after = quantity_before + change.delta;
    let new_status = StockStatus::derive(quantity_after, product.low_stock_threshold);

    let mut active_product: product::ActiveModel = product.into();
    active_product.stock_quantity = Set(quantity_after);
    active_product.stock_status = Set(new_status.to_string());
    active_product.updated_at = Set(Some(Utc::now()));
    active_product
        .update(txn)
        .await
        .map_err(ServiceError::db_error)?;

    let movement = inventory_movement::ActiveModel {
        id: Set(Uuid::new_v4()),
        dealer_id: Set(change.dealer_id),
        product_id: Set(change.product_id),
        batch_id: Set(change.batch_id),
        movement_type: Set(MovementType::from_delta(change.delta).to_string()),
        quantity_before: Set(quantity_before),
        quantity_change: Set(change.delta),
        quantity_after: Set(quantity_after),
        reference_type: Set(change.reference_type.to_string()),
        reference_id: Set(change.reference_id),
        reason: Set(change.reason),
        performed_by: Set(change.performed_by),
        created_at: Set(Utc::now()),
    };
    let movement = movement.insert(txn).await.map_err(ServiceError::db_error)?;

    Ok(movement)
}

pub struct InventoryService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl InventoryService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Direct manual stock change outside the requisition/adjustment flows,
    /// e.g. an over-the-counter sale or goods receipt.
    #[instrument(skip(self, actor))]
    pub async fn adjust_stock(
        &self,
        actor: &ActorContext,
        product_id: Uuid,
        delta: i32,
        reference_type: ReferenceType,
        reference_id: Uuid,
        reason: Option<String>,
    ) -> Result<inventory_movement::Model, ServiceError> {
        if delta == 0 {
            return Err(ServiceError::ValidationError(
                "stock change must be non-zero".to_string(),
            ));
        }

        let change = StockChange {
            dealer_id: actor.dealer_id,
            product_id,
            batch_id: None,
            delta,
            reference_type,
            reference_id,
            reason,
            performed_by: actor.actor_id,
        };

        let movement = self
            .db
            .transaction::<_, inventory_movement::Model, ServiceError>(move |txn| {
                Box::pin(async move { apply_stock_change(txn, change).await })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => ServiceError::db_error(db_err),
                TransactionError::Transaction(service_err) => service_err,
            })?;

        info!(
            "stock adjusted: product={} change={} after={}",
            product_id, movement.quantity_change, movement.quantity_after
        );

        self.event_sender
            .send_or_log(Event::StockMovementRecorded {
                product_id,
                movement_id: movement.id,
                quantity_before: movement.quantity_before,
                quantity_change: movement.quantity_change,
                quantity_after: movement.quantity_after,
                reference_type: movement.reference_type.clone(),
            })
            .await;

        Ok(movement)
    }

    /// Movement history for one product, newest first.
    #[instrument(skip(self, actor))]
    pub async fn list_movements(
        &self,
        actor: &ActorContext,
        product_id: Uuid,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<inventory_movement::Model>, u64), ServiceError> {
        let product = Product::find_by_id(product_id)
            .one(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("product {} not found", product_id)))?;
        actor.ensure_dealer(product.dealer_id)?;

        let paginator = InventoryMovement::find()
            .filter(inventory_movement::Column::ProductId.eq(product_id))
            .order_by_desc(inventory_movement::Column::CreatedAt)
            .paginate(self.db.as_ref(), per_page.max(1));

        let total = paginator.num_items().await.map_err(ServiceError::db_error)?;
        let movements = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(ServiceError::db_error)?;

        Ok((movements, total))
    }

    #[instrument(skip(self, actor))]
    pub async fn get_product(
        &self,
        actor: &ActorContext,
        product_id: Uuid,
    ) -> Result<product::Model, ServiceError> {
        let product = Product::find_by_id(product_id)
            .one(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("product {} not found", product_id)))?;
        actor.ensure_dealer(product.dealer_id)?;
        Ok(product)
    }

    /// Products for the actor's dealer, low-stock first.
    #[instrument(skip(self, actor))]
    pub async fn list_products(
        &self,
        actor: &ActorContext,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<product::Model>, u64), ServiceError> {
        let paginator = Product::find()
            .filter(product::Column::DealerId.eq(actor.dealer_id))
            .order_by_asc(product::Column::StockQuantity)
            .paginate(self.db.as_ref(), per_page.max(1));

        let total = paginator.num_items().await.map_err(ServiceError::db_error)?;
        let products = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(ServiceError::db_error)?;

        Ok((products, total))
    }
}
