use crate::{
    auth::ActorContext,
    entities::{
        inventory_movement::{self, ReferenceType},
        job_card::{Entity as JobCard, JobStatus},
        product::Entity as Product,
        requisition_item::{self, derive_group_status, Entity as RequisitionItem, RequisitionStatus},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::inventory::{apply_stock_change, StockChange},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionError, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewRequisitionItem {
    pub product_id: Uuid,
    #[validate(range(min = 1, message = "quantity must be at least 1"))]
    pub quantity: i32,
    pub notes: Option<String>,
}

/// Per-item outcome of a batch approve/reject. The batch is not atomic:
/// items that fail leave the rest untouched, and the caller sees exactly
/// which ones failed and why.
#[derive(Debug, Clone, Serialize)]
pub struct GroupActionOutcome {
    pub succeeded: Vec<Uuid>,
    pub failed: Vec<FailedItem>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailedItem {
    pub item_id: Uuid,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RequisitionGroup {
    pub requisition_group_id: Uuid,
    pub status: RequisitionStatus,
    pub items: Vec<requisition_item::Model>,
}

pub struct RequisitionService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl RequisitionService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Creates a requisition group: all lines land pending in one transaction
    /// or none do. Unit prices are snapshotted from the catalog at this
    /// moment. Stock is not touched until approval.
    #[instrument(skip(self, actor, items))]
    pub async fn create_group(
        &self,
        actor: &ActorContext,
        job_card_id: Uuid,
        items: Vec<NewRequisitionItem>,
    ) -> Result<RequisitionGroup, ServiceError> {
        if items.is_empty() {
            return Err(ServiceError::ValidationError(
                "a requisition needs at least one item".to_string(),
            ));
        }
        for item in &items {
            item.validate()?;
        }

        let actor = *actor;
        let group_id = Uuid::new_v4();

        let models = self
            .db
            .transaction::<_, Vec<requisition_item::Model>, ServiceError>(move |txn| {
                Box::pin(async move {
                    let job = JobCard::find_by_id(job_card_id)
                        .one(txn)
                        .await
                        .map_err(ServiceError::db_error)?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!("job card {} not found", job_card_id))
                        })?;
                    actor.ensure_dealer(job.dealer_id)?;

                    let status = JobStatus::from_str(&job.status).map_err(|_| {
                        ServiceError::InternalError(format!(
                            "job card {} has unknown status {}",
                            job.id, job.status
                        ))
                    })?;
                    if matches!(status, JobStatus::Completed | JobStatus::Delivered) {
                        return Err(ServiceError::InvalidTransition(format!(
                            "cannot requisition parts for a {} job",
                            job.status
                        )));
                    }

                    let mut created = Vec::with_capacity(items.len());
                    for item in items {
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
                        // One foreign product aborts the whole group.
                        if product.dealer_id != job.dealer_id {
                            return Err(ServiceError::Forbidden(
                                "product belongs to another dealer".to_string(),
                            ));
                        }

                        let unit_price = product.effective_price();
                        let model = requisition_item::ActiveModel {
                            id: Set(Uuid::new_v4()),
                            requisition_group_id: Set(group_id),
                            job_card_id: Set(job.id),
                            ticket_id: Set(job.ticket_id),
                            dealer_id: Set(job.dealer_id),
                            staff_id: Set(actor.actor_id),
                            product_id: Set(product.id),
                            quantity: Set(item.quantity),
                            unit_price: Set(unit_price),
                            total_price: Set(unit_price * Decimal::from(item.quantity)),
                            status: Set(RequisitionStatus::Pending.to_string()),
                            notes: Set(item.notes),
                            created_at: Set(Utc::now()),
                            updated_at: Set(None),
                        };
                        created.push(model.insert(txn).await.map_err(ServiceError::db_error)?);
                    }
                    Ok(created)
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => ServiceError::db_error(db_err),
                TransactionError::Transaction(service_err) => service_err,
            })?;

        info!(
            "requisition group {} created with {} items for job {}",
            group_id,
            models.len(),
            job_card_id
        );

        self.event_sender
            .send_or_log(Event::RequisitionCreated {
                requisition_group_id: group_id,
                job_card_id,
                item_count: models.len(),
            })
            .await;

        Ok(RequisitionGroup {
            requisition_group_id: group_id,
            status: RequisitionStatus::Pending,
            items: models,
        })
    }

    /// Approves one pending item and debits its quantity from stock, both in
    /// the same transaction. Stock may go negative; approval never fails for
    /// lack of stock.
    #[instrument(skip(self, actor))]
    pub async fn approve_item(
        &self,
        actor: &ActorContext,
        item_id: Uuid,
    ) -> Result<requisition_item::Model, ServiceError> {
        let actor = *actor;

        let (item, movement) = self
            .db
            .transaction::<_, (requisition_item::Model, inventory_movement::Model), ServiceError>(
                move |txn| {
                    Box::pin(async move {
                        let item = RequisitionItem::find_by_id(item_id)
                            .lock_exclusive()
                            .one(txn)
                            .await
                            .map_err(ServiceError::db_error)?
                            .ok_or_else(|| {
                                ServiceError::NotFound(format!(
                                    "requisition item {} not found",
                                    item_id
                                ))
                            })?;
                        actor.ensure_dealer(item.dealer_id)?;

                        let status = parse_status(&item)?;
                        if !status.can_transition_to(RequisitionStatus::Approved) {
                            return Err(ServiceError::InvalidTransition(format!(
                                "cannot approve a {} requisition item",
                                item.status
                            )));
                        }

                        let movement = apply_stock_change(
                            txn,
                            StockChange {
                                dealer_id: item.dealer_id,
                                product_id: item.product_id,
                                batch_id: None,
                                delta: -item.quantity,
                                reference_type: ReferenceType::Requisition,
                                reference_id: item.id,
                                reason: None,
                                performed_by: actor.actor_id,
                            },
                        )
                        .await?;

                        let mut active: requisition_item::ActiveModel = item.into();
                        active.status = Set(RequisitionStatus::Approved.to_string());
                        active.updated_at = Set(Some(Utc::now()));
                        let item = active.update(txn).await.map_err(ServiceError::db_error)?;

                        Ok((item, movement))
                    })
                },
            )
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => ServiceError::db_error(db_err),
                TransactionError::Transaction(service_err) => service_err,
            })?;

        if movement.quantity_after < 0 {
            warn!(
                "requisition {} approved into negative stock: product={} after={}",
                item.id, item.product_id, movement.quantity_after
            );
        }

        self.event_sender
            .send_or_log(Event::RequisitionItemApproved(item.id))
            .await;
        self.event_sender
            .send_or_log(Event::StockMovementRecorded {
                product_id: movement.product_id,
                movement_id: movement.id,
                quantity_before: movement.quantity_before,
                quantity_change: movement.quantity_change,
                quantity_after: movement.quantity_after,
                reference_type: movement.reference_type.clone(),
            })
            .await;

        Ok(item)
    }

    /// Rejects one pending item. No stock is touched.
    #[instrument(skip(self, actor))]
    pub async fn reject_item(
        &self,
        actor: &ActorContext,
        item_id: Uuid,
        reason: Option<String>,
    ) -> Result<requisition_item::Model, ServiceError> {
        let actor = *actor;

        let item = self
            .db
            .transaction::<_, requisition_item::Model, ServiceError>(move |txn| {
                Box::pin(async move {
                    let item = RequisitionItem::find_by_id(item_id)
                        .lock_exclusive()
                        .one(txn)
                        .await
                        .map_err(ServiceError::db_error)?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!(
                                "requisition item {} not found",
                                item_id
                            ))
                        })?;
                    actor.ensure_dealer(item.dealer_id)?;

                    let status = parse_status(&item)?;
                    if !status.can_transition_to(RequisitionStatus::Rejected) {
                        return Err(ServiceError::InvalidTransition(format!(
                            "cannot reject a {} requisition item",
                            item.status
                        )));
                    }

                    // The requester's notes stay on the item; the rejection
                    // reason is appended after them.
                    let existing_notes = item.notes.clone();
                    let mut active: requisition_item::ActiveModel = item.into();
                    active.status = Set(RequisitionStatus::Rejected.to_string());
                    if let Some(reason) = reason {
                        let notes = match existing_notes {
                            Some(notes) => format!("{}\n{}", notes, reason),
                            None => reason,
                        };
                        active.notes = Set(Some(notes));
                    }
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
            .send_or_log(Event::RequisitionItemRejected(item.id))
            .await;

        Ok(item)
    }

    /// Returns an approved item's parts to stock: credits the debited
    /// quantity back and marks the item returned, in one transaction.
    #[instrument(skip(self, actor))]
    pub async fn return_item(
        &self,
        actor: &ActorContext,
        item_id: Uuid,
        reason: Option<String>,
    ) -> Result<requisition_item::Model, ServiceError> {
        let actor = *actor;

        let (item, movement) = self
            .db
            .transaction::<_, (requisition_item::Model, inventory_movement::Model), ServiceError>(
                move |txn| {
                    Box::pin(async move {
                        let item = RequisitionItem::find_by_id(item_id)
                            .lock_exclusive()
                            .one(txn)
                            .await
                            .map_err(ServiceError::db_error)?
                            .ok_or_else(|| {
                                ServiceError::NotFound(format!(
                                    "requisition item {} not found",
                                    item_id
                                ))
                            })?;
                        actor.ensure_dealer(item.dealer_id)?;

                        let status = parse_status(&item)?;
                        if !status.can_transition_to(RequisitionStatus::Returned) {
                            return Err(ServiceError::InvalidTransition(format!(
                                "cannot return a {} requisition item",
                                item.status
                            )));
                        }

                        let movement = apply_stock_change(
                            txn,
                            StockChange {
                                dealer_id: item.dealer_id,
                                product_id: item.product_id,
                                batch_id: None,
                                delta: item.quantity,
                                reference_type: ReferenceType::RequisitionReturn,
                                reference_id: item.id,
                                reason: reason.clone(),
                                performed_by: actor.actor_id,
                            },
                        )
                        .await?;

                        let mut active: requisition_item::ActiveModel = item.into();
                        active.status = Set(RequisitionStatus::Returned.to_string());
                        active.updated_at = Set(Some(Utc::now()));
                        let item = active.update(txn).await.map_err(ServiceError::db_error)?;

                        Ok((item, movement))
                    })
                },
            )
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => ServiceError::db_error(db_err),
                TransactionError::Transaction(service_err) => service_err,
            })?;

        self.event_sender
            .send_or_log(Event::RequisitionItemReturned(item.id))
            .await;
        self.event_sender
            .send_or_log(Event::StockMovementRecorded {
                product_id: movement.product_id,
                movement_id: movement.id,
                quantity_before: movement.quantity_before,
                quantity_change: movement.quantity_change,
                quantity_after: movement.quantity_after,
                reference_type: movement.reference_type.clone(),
            })
            .await;

        Ok(item)
    }

    /// Approves every pending item in the group, one item-level transaction
    /// at a time. Items that fail are reported; the rest still go through.
    #[instrument(skip(self, actor))]
    pub async fn approve_group(
        &self,
        actor: &ActorContext,
        group_id: Uuid,
    ) -> Result<GroupActionOutcome, ServiceError> {
        let pending = self.pending_item_ids(actor, group_id).await?;
        let mut outcome = GroupActionOutcome {
            succeeded: Vec::new(),
            failed: Vec::new(),
        };

        for item_id in pending {
            match self.approve_item(actor, item_id).await {
                Ok(_) => outcome.succeeded.push(item_id),
                Err(e) => outcome.failed.push(FailedItem {
                    item_id,
                    reason: e.response_message(),
                }),
            }
        }

        Ok(outcome)
    }

    /// Rejects every pending item in the group, reporting per-item results.
    #[instrument(skip(self, actor))]
    pub async fn reject_group(
        &self,
        actor: &ActorContext,
        group_id: Uuid,
        reason: Option<String>,
    ) -> Result<GroupActionOutcome, ServiceError> {
        let pending = self.pending_item_ids(actor, group_id).await?;
        let mut outcome = GroupActionOutcome {
            succeeded: Vec::new(),
            failed: Vec::new(),
        };

        for item_id in pending {
            match self.reject_item(actor, item_id, reason.clone()).await {
                Ok(_) => outcome.succeeded.push(item_id),
                Err(e) => outcome.failed.push(FailedItem {
                    item_id,
                    reason: e.response_message(),
                }),
            }
        }

        Ok(outcome)
    }

    /// The group with its aggregate status derived from item statuses.
    #[instrument(skip(self, actor))]
    pub async fn get_group(
        &self,
        actor: &ActorContext,
        group_id: Uuid,
    ) -> Result<RequisitionGroup, ServiceError> {
        let items = RequisitionItem::find()
            .filter(requisition_item::Column::RequisitionGroupId.eq(group_id))
            .order_by_asc(requisition_item::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)?;

        let first = items.first().ok_or_else(|| {
            ServiceError::NotFound(format!("requisition group {} not found", group_id))
        })?;
        actor.ensure_dealer(first.dealer_id)?;

        let statuses = items
            .iter()
            .map(parse_status)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(RequisitionGroup {
            requisition_group_id: group_id,
            status: derive_group_status(&statuses),
            items,
        })
    }

    /// Requisition lines attached to a job card, newest group first.
    #[instrument(skip(self, actor))]
    pub async fn list_for_job(
        &self,
        actor: &ActorContext,
        job_card_id: Uuid,
    ) -> Result<Vec<requisition_item::Model>, ServiceError> {
        let job = JobCard::find_by_id(job_card_id)
            .one(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("job card {} not found", job_card_id)))?;
        actor.ensure_dealer(job.dealer_id)?;

        RequisitionItem::find()
            .filter(requisition_item::Column::JobCardId.eq(job_card_id))
            .order_by_desc(requisition_item::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)
    }

    async fn pending_item_ids(
        &self,
        actor: &ActorContext,
        group_id: Uuid,
    ) -> Result<Vec<Uuid>, ServiceError> {
        let group = self.get_group(actor, group_id).await?;
        Ok(group
            .items
            .iter()
            .filter(|i| i.status == RequisitionStatus::Pending.to_string())
            .map(|i| i.id)
            .collect())
    }
}

fn parse_status(item: &requisition_item::Model) -> Result<RequisitionStatus, ServiceError> {
    RequisitionStatus::from_str(&item.status).map_err(|_| {
        ServiceError::InternalError(format!(
            "requisition item {} has unknown status {}",
            item.id, item.status
        ))
    })
}
