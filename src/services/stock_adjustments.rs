use crate::{
    auth::ActorContext,
    entities::{
        inventory_movement::{self, ReferenceType},
        product::Entity as Product,
        product_batch::{self, Entity as ProductBatch},
        stock_adjustment::{self, AdjustmentStatus, Entity as StockAdjustment},
        stock_adjustment_item::{self, Entity as StockAdjustmentItem},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::inventory::{apply_stock_change, StockChange},
};
use chrono::{Datelike, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionError, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewAdjustmentLine {
    pub product_id: Uuid,
    pub batch_id: Option<Uuid>,
    #[validate(range(min = 0, message = "counted quantity cannot be negative"))]
    pub actual_quantity: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdjustmentDetail {
    pub adjustment: stock_adjustment::Model,
    pub items: Vec<stock_adjustment_item::Model>,
}

pub struct StockAdjustmentService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl StockAdjustmentService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Proposes a reconciliation from a physical count. The difference of
    /// each line is frozen against the recorded quantity at this moment;
    /// approval later applies these stored differences as-is.
    #[instrument(skip(self, actor, lines))]
    pub async fn propose(
        &self,
        actor: &ActorContext,
        reason: String,
        lines: Vec<NewAdjustmentLine>,
    ) -> Result<AdjustmentDetail, ServiceError> {
        if lines.is_empty() {
            return Err(ServiceError::ValidationError(
                "an adjustment needs at least one counted line".to_string(),
            ));
        }
        if reason.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "a reason is required".to_string(),
            ));
        }
        for line in &lines {
            line.validate()?;
        }

        let actor = *actor;

        let detail = self
            .db
            .transaction::<_, AdjustmentDetail, ServiceError>(move |txn| {
                Box::pin(async move {
                    let sequence = StockAdjustment::find()
                        .filter(stock_adjustment::Column::DealerId.eq(actor.dealer_id))
                        .count(txn)
                        .await
                        .map_err(ServiceError::db_error)?
                        + 1;
                    let adjustment_number =
                        format!("ADJ-{}-{:06}", Utc::now().year(), sequence);

                    let adjustment = stock_adjustment::ActiveModel {
                        id: Set(Uuid::new_v4()),
                        dealer_id: Set(actor.dealer_id),
                        adjustment_number: Set(adjustment_number),
                        reason: Set(reason),
                        status: Set(AdjustmentStatus::Pending.to_string()),
                        performed_by: Set(actor.actor_id),
                        approved_by: Set(None),
                        approved_at: Set(None),
                        rejection_reason: Set(None),
                        total_items: Set(lines.len() as i32),
                        created_at: Set(Utc::now()),
                        updated_at: Set(None),
                    }
                    .insert(txn)
                    .await
                    .map_err(ServiceError::db_error)?;

                    let mut items = Vec::with_capacity(lines.len());
                    for line in lines {
                        let product = Product::find_by_id(line.product_id)
                            .one(txn)
                            .await
                            .map_err(ServiceError::db_error)?
                            .ok_or_else(|| {
                                ServiceError::NotFound(format!(
                                    "product {} not found",
                                    line.product_id
                                ))
                            })?;
                        actor.ensure_dealer(product.dealer_id)?;

                        // Count against the batch when one is named, else the product total.
                        let system_quantity = match line.batch_id {
                            Some(batch_id) => {
                                let batch = ProductBatch::find_by_id(batch_id)
                                    .one(txn)
                                    .await
                                    .map_err(ServiceError::db_error)?
                                    .ok_or_else(|| {
                                        ServiceError::NotFound(format!(
                                            "batch {} not found",
                                            batch_id
                                        ))
                                    })?;
                                if batch.product_id != product.id {
                                    return Err(ServiceError::ValidationError(format!(
                                        "batch {} does not belong to product {}",
                                        batch_id, product.id
                                    )));
                                }
                                batch.current_quantity
                            }
                            None => product.stock_quantity,
                        };

                        let item = stock_adjustment_item::ActiveModel {
                            id: Set(Uuid::new_v4()),
                            adjustment_id: Set(adjustment.id),
                            product_id: Set(product.id),
                            batch_id: Set(line.batch_id),
                            system_quantity: Set(system_quantity),
                            actual_quantity: Set(line.actual_quantity),
                            difference: Set(line.actual_quantity - system_quantity),
                            created_at: Set(Utc::now()),
                        }
                        .insert(txn)
                        .await
                        .map_err(ServiceError::db_error)?;
                        items.push(item);
                    }

                    Ok(AdjustmentDetail { adjustment, items })
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => ServiceError::db_error(db_err),
                TransactionError::Transaction(service_err) => service_err,
            })?;

        info!(
            "stock adjustment {} proposed with {} lines",
            detail.adjustment.adjustment_number, detail.adjustment.total_items
        );

        self.event_sender
            .send_or_log(Event::StockAdjustmentProposed(detail.adjustment.id))
            .await;

        Ok(detail)
    }

    /// Applies an approved count atomically: every line's stored difference
    /// is posted to the ledger in one transaction. The live quantity may have
    /// drifted since the count; the stored difference is applied regardless,
    /// so the approver should re-count if the proposal has gone stale.
    #[instrument(skip(self, actor))]
    pub async fn approve(
        &self,
        actor: &ActorContext,
        adjustment_id: Uuid,
    ) -> Result<AdjustmentDetail, ServiceError> {
        if !actor.is_admin() {
            return Err(ServiceError::Forbidden(
                "only an admin can approve stock adjustments".to_string(),
            ));
        }
        let actor = *actor;

        let (detail, movements) = self
            .db
            .transaction::<_, (AdjustmentDetail, Vec<inventory_movement::Model>), ServiceError>(
                move |txn| {
                    Box::pin(async move {
                        let adjustment = StockAdjustment::find_by_id(adjustment_id)
                            .lock_exclusive()
                            .one(txn)
                            .await
                            .map_err(ServiceError::db_error)?
                            .ok_or_else(|| {
                                ServiceError::NotFound(format!(
                                    "stock adjustment {} not found",
                                    adjustment_id
                                ))
                            })?;
                        actor.ensure_dealer(adjustment.dealer_id)?;

                        let status = parse_status(&adjustment)?;
                        if !status.can_transition_to(AdjustmentStatus::Approved) {
                            return Err(ServiceError::InvalidTransition(format!(
                                "cannot approve a {} adjustment",
                                adjustment.status
                            )));
                        }

                        let items = StockAdjustmentItem::find()
                            .filter(
                                stock_adjustment_item::Column::AdjustmentId.eq(adjustment.id),
                            )
                            .order_by_asc(stock_adjustment_item::Column::CreatedAt)
                            .all(txn)
                            .await
                            .map_err(ServiceError::db_error)?;

                        // Ownership can change between count and approval;
                        // every line is re-checked before anything posts,
                        // including lines whose difference is zero.
                        for item in &items {
                            let product = Product::find_by_id(item.product_id)
                                .one(txn)
                                .await
                                .map_err(ServiceError::db_error)?
                                .ok_or_else(|| {
                                    ServiceError::NotFound(format!(
                                        "product {} not found",
                                        item.product_id
                                    ))
                                })?;
                            if product.dealer_id != adjustment.dealer_id {
                                return Err(ServiceError::Forbidden(
                                    "product belongs to another dealer".to_string(),
                                ));
                            }
                            if let Some(batch_id) = item.batch_id {
                                let batch = ProductBatch::find_by_id(batch_id)
                                    .one(txn)
                                    .await
                                    .map_err(ServiceError::db_error)?
                                    .ok_or_else(|| {
                                        ServiceError::NotFound(format!(
                                            "batch {} not found",
                                            batch_id
                                        ))
                                    })?;
                                if batch.dealer_id != adjustment.dealer_id {
                                    return Err(ServiceError::Forbidden(
                                        "batch belongs to another dealer".to_string(),
                                    ));
                                }
                            }
                        }

                        let mut movements = Vec::new();
                        for item in &items {
                            if item.difference != 0 {
                                let movement = apply_stock_change(
                                    txn,
                                    StockChange {
                                        dealer_id: adjustment.dealer_id,
                                        product_id: item.product_id,
                                        batch_id: item.batch_id,
                                        delta: item.difference,
                                        reference_type: ReferenceType::Adjustment,
                                        reference_id: adjustment.id,
                                        reason: Some(adjustment.reason.clone()),
                                        performed_by: actor.actor_id,
                                    },
                                )
                                .await?;
                                movements.push(movement);
                            }

                            // Batch counts are set absolutely from the counted value.
                            if let Some(batch_id) = item.batch_id {
                                let batch = ProductBatch::find_by_id(batch_id)
                                    .lock_exclusive()
                                    .one(txn)
                                    .await
                                    .map_err(ServiceError::db_error)?
                                    .ok_or_else(|| {
                                        ServiceError::NotFound(format!(
                                            "batch {} not found",
                                            batch_id
                                        ))
                                    })?;
                                let mut active: product_batch::ActiveModel = batch.into();
                                active.current_quantity = Set(item.actual_quantity);
                                active.updated_at = Set(Some(Utc::now()));
                                active.update(txn).await.map_err(ServiceError::db_error)?;
                            }
                        }

                        let mut active: stock_adjustment::ActiveModel = adjustment.into();
                        active.status = Set(AdjustmentStatus::Approved.to_string());
                        active.approved_by = Set(Some(actor.actor_id));
                        active.approved_at = Set(Some(Utc::now()));
                        active.updated_at = Set(Some(Utc::now()));
                        let adjustment =
                            active.update(txn).await.map_err(ServiceError::db_error)?;

                        Ok((AdjustmentDetail { adjustment, items }, movements))
                    })
                },
            )
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => ServiceError::db_error(db_err),
                TransactionError::Transaction(service_err) => service_err,
            })?;

        info!(
            "stock adjustment {} approved, {} movements posted",
            detail.adjustment.adjustment_number,
            movements.len()
        );

        self.event_sender
            .send_or_log(Event::StockAdjustmentApproved(detail.adjustment.id))
            .await;
        for movement in movements {
            self.event_sender
                .send_or_log(Event::StockMovementRecorded {
                    product_id: movement.product_id,
                    movement_id: movement.id,
                    quantity_before: movement.quantity_before,
                    quantity_change: movement.quantity_change,
                    quantity_after: movement.quantity_after,
                    reference_type: movement.reference_type,
                })
                .await;
        }

        Ok(detail)
    }

    /// Rejects a pending proposal. Nothing is posted to the ledger.
    #[instrument(skip(self, actor))]
    pub async fn reject(
        &self,
        actor: &ActorContext,
        adjustment_id: Uuid,
        reason: String,
    ) -> Result<stock_adjustment::Model, ServiceError> {
        if !actor.is_admin() {
            return Err(ServiceError::Forbidden(
                "only an admin can reject stock adjustments".to_string(),
            ));
        }
        if reason.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "a rejection reason is required".to_string(),
            ));
        }
        let actor = *actor;

        let adjustment = self
            .db
            .transaction::<_, stock_adjustment::Model, ServiceError>(move |txn| {
                Box::pin(async move {
                    let adjustment = StockAdjustment::find_by_id(adjustment_id)
                        .lock_exclusive()
                        .one(txn)
                        .await
                        .map_err(ServiceError::db_error)?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!(
                                "stock adjustment {} not found",
                                adjustment_id
                            ))
                        })?;
                    actor.ensure_dealer(adjustment.dealer_id)?;

                    let status = parse_status(&adjustment)?;
                    if !status.can_transition_to(AdjustmentStatus::Rejected) {
                        return Err(ServiceError::InvalidTransition(format!(
                            "cannot reject a {} adjustment",
                            adjustment.status
                        )));
                    }

                    let mut active: stock_adjustment::ActiveModel = adjustment.into();
                    active.status = Set(AdjustmentStatus::Rejected.to_string());
                    active.rejection_reason = Set(Some(reason));
                    active.updated_at = Set(Some(Utc::now()));
                    active.update(txn).await.map_err(ServiceError::db_error)
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => ServiceError::db_error(db_err),
                TransactionError::Transaction(service_err) => service_err,
            })?;

        self.event_sender
            .send_or_log(Event::StockAdjustmentRejected(adjustment.id))
            .await;

        Ok(adjustment)
    }

    #[instrument(skip(self, actor))]
    pub async fn get(
        &self,
        actor: &ActorContext,
        adjustment_id: Uuid,
    ) -> Result<AdjustmentDetail, ServiceError> {
        let adjustment = StockAdjustment::find_by_id(adjustment_id)
            .one(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("stock adjustment {} not found", adjustment_id))
            })?;
        actor.ensure_dealer(adjustment.dealer_id)?;

        let items = StockAdjustmentItem::find()
            .filter(stock_adjustment_item::Column::AdjustmentId.eq(adjustment.id))
            .order_by_asc(stock_adjustment_item::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)?;

        Ok(AdjustmentDetail { adjustment, items })
    }

    /// Proposals for the actor's dealer, newest first.
    #[instrument(skip(self, actor))]
    pub async fn list(
        &self,
        actor: &ActorContext,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<stock_adjustment::Model>, u64), ServiceError> {
        let paginator = StockAdjustment::find()
            .filter(stock_adjustment::Column::DealerId.eq(actor.dealer_id))
            .order_by_desc(stock_adjustment::Column::CreatedAt)
            .paginate(self.db.as_ref(), per_page.max(1));

        let total = paginator.num_items().await.map_err(ServiceError::db_error)?;
        let adjustments = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(ServiceError::db_error)?;

        Ok((adjustments, total))
    }
}

fn parse_status(adjustment: &stock_adjustment::Model) -> Result<AdjustmentStatus, ServiceError> {
    AdjustmentStatus::from_str(&adjustment.status).map_err(|_| {
        ServiceError::InternalError(format!(
            "stock adjustment {} has unknown status {}",
            adjustment.id, adjustment.status
        ))
    })
}
