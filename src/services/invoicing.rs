use crate::{
    auth::ActorContext,
    entities::{
        invoice_item::{self, Entity as InvoiceItem, InvoiceItemType},
        job_card::{self, Entity as JobCard, JobStatus},
        payment::{self, Entity as Payment},
        requisition_item::{self, Entity as RequisitionItem, RequisitionStatus},
        service_invoice::{
            self, compute_totals, Entity as ServiceInvoice, InvoiceStatus, PaymentStatus,
            SETTLEMENT_EPSILON,
        },
        service_task::{self, Entity as ServiceTask},
    },
    errors::ServiceError,
    events::{outbox, Event, EventSender},
    services::job_cards::{parse_job_status, transition_job},
};
use chrono::{Datelike, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionError, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize)]
pub struct GenerateInvoiceRequest {
    /// Tax percentage for this invoice; the configured rate when absent.
    pub tax_pct: Option<Decimal>,
    /// Discount as a percentage of the subtotal; no discount when absent.
    pub discount_pct: Option<Decimal>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecordPaymentRequest {
    pub amount: Decimal,
    pub method: String,
    pub reference: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InvoiceDetail {
    pub invoice: service_invoice::Model,
    pub items: Vec<invoice_item::Model>,
    pub payments: Vec<payment::Model>,
}

pub struct InvoicingService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    /// Flat rate billed per labor task.
    labor_rate: Decimal,
    /// Tax percentage applied to the post-discount amount.
    tax_rate_percent: Decimal,
}

impl InvoicingService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        labor_rate: Decimal,
        tax_rate_percent: Decimal,
    ) -> Self {
        Self {
            db,
            event_sender,
            labor_rate,
            tax_rate_percent,
        }
    }

    /// Bills a QC-approved job: one labor line per service task plus every
    /// approved requisition line, a percentage discount on the subtotal, tax
    /// on what remains. Both percentages may be set per invoice; tax falls
    /// back to the configured rate. Moves the job to `completed` in the same
    /// transaction, which also makes a second invoice for the job a conflict.
    #[instrument(skip(self, actor, request))]
    pub async fn generate_invoice(
        &self,
        actor: &ActorContext,
        job_card_id: Uuid,
        request: GenerateInvoiceRequest,
    ) -> Result<InvoiceDetail, ServiceError> {
        let discount_pct = request.discount_pct.unwrap_or(Decimal::ZERO);
        if discount_pct < Decimal::ZERO || discount_pct > Decimal::ONE_HUNDRED {
            return Err(ServiceError::ValidationError(
                "discount_pct must be between 0 and 100".to_string(),
            ));
        }
        let tax_rate = request.tax_pct.unwrap_or(self.tax_rate_percent);
        if tax_rate < Decimal::ZERO || tax_rate > Decimal::ONE_HUNDRED {
            return Err(ServiceError::ValidationError(
                "tax_pct must be between 0 and 100".to_string(),
            ));
        }

        let actor = *actor;
        let labor_rate = self.labor_rate;
        let notes = request.notes;

        let (detail, job) = self
            .db
            .transaction::<_, (InvoiceDetail, job_card::Model), ServiceError>(move |txn| {
                Box::pin(async move {
                    let job = JobCard::find_by_id(job_card_id)
                        .lock_exclusive()
                        .one(txn)
                        .await
                        .map_err(ServiceError::db_error)?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!("job card {} not found", job_card_id))
                        })?;
                    actor.ensure_dealer(job.dealer_id)?;

                    let status = parse_job_status(&job)?;
                    if !status.can_transition_to(JobStatus::Completed) {
                        return Err(ServiceError::InvalidTransition(format!(
                            "cannot invoice a {} job",
                            job.status
                        )));
                    }

                    let tasks = ServiceTask::find()
                        .filter(service_task::Column::JobCardId.eq(job.id))
                        .order_by_asc(service_task::Column::CreatedAt)
                        .all(txn)
                        .await
                        .map_err(ServiceError::db_error)?;

                    let parts = RequisitionItem::find()
                        .filter(requisition_item::Column::JobCardId.eq(job.id))
                        .filter(
                            requisition_item::Column::Status
                                .eq(RequisitionStatus::Approved.to_string()),
                        )
                        .order_by_asc(requisition_item::Column::CreatedAt)
                        .all(txn)
                        .await
                        .map_err(ServiceError::db_error)?;

                    let mut lines: Vec<invoice_item::ActiveModel> = Vec::new();
                    let mut subtotal = Decimal::ZERO;
                    for task in &tasks {
                        subtotal += labor_rate;
                        lines.push(invoice_item::ActiveModel {
                            id: Set(Uuid::new_v4()),
                            invoice_id: Set(Uuid::nil()), // filled in below
                            item_type: Set(InvoiceItemType::Labor.to_string()),
                            description: Set(task.name.clone()),
                            quantity: Set(1),
                            unit_price: Set(labor_rate),
                            total: Set(labor_rate),
                            created_at: Set(Utc::now()),
                        });
                    }
                    for part in &parts {
                        subtotal += part.total_price;
                        lines.push(invoice_item::ActiveModel {
                            id: Set(Uuid::new_v4()),
                            invoice_id: Set(Uuid::nil()),
                            item_type: Set(InvoiceItemType::Part.to_string()),
                            description: Set(format!("Part {}", part.product_id)),
                            quantity: Set(part.quantity),
                            unit_price: Set(part.unit_price),
                            total: Set(part.total_price),
                            created_at: Set(Utc::now()),
                        });
                    }

                    if lines.is_empty() {
                        return Err(ServiceError::ValidationError(
                            "nothing to bill: the job has no tasks or approved parts"
                                .to_string(),
                        ));
                    }

                    let discount = (subtotal * discount_pct / Decimal::ONE_HUNDRED).round_dp(2);
                    let (tax_amount, grand_total) = compute_totals(subtotal, discount, tax_rate);

                    let sequence = ServiceInvoice::find()
                        .filter(service_invoice::Column::DealerId.eq(job.dealer_id))
                        .count(txn)
                        .await
                        .map_err(ServiceError::db_error)?
                        + 1;
                    let invoice_number = format!("INV-{}-{:06}", Utc::now().year(), sequence);

                    let invoice = service_invoice::ActiveModel {
                        id: Set(Uuid::new_v4()),
                        dealer_id: Set(job.dealer_id),
                        job_card_id: Set(job.id),
                        invoice_number: Set(invoice_number),
                        subtotal: Set(subtotal),
                        discount_amount: Set(discount),
                        tax_amount: Set(tax_amount),
                        grand_total: Set(grand_total),
                        paid_amount: Set(Decimal::ZERO),
                        due_amount: Set(grand_total),
                        payment_status: Set(PaymentStatus::Unpaid.to_string()),
                        status: Set(InvoiceStatus::Issued.to_string()),
                        notes: Set(notes),
                        created_at: Set(Utc::now()),
                        updated_at: Set(None),
                    }
                    .insert(txn)
                    .await
                    .map_err(ServiceError::db_error)?;

                    let mut items = Vec::with_capacity(lines.len());
                    for mut line in lines {
                        line.invoice_id = Set(invoice.id);
                        items.push(line.insert(txn).await.map_err(ServiceError::db_error)?);
                    }

                    let job =
                        transition_job(txn, job, JobStatus::Completed, actor.actor_id, None)
                            .await?;

                    outbox::enqueue(
                        txn,
                        "service_invoice",
                        Some(invoice.id),
                        "InvoiceGenerated",
                        &serde_json::json!({
                            "invoice_id": invoice.id,
                            "job_card_id": job.id,
                            "invoice_number": invoice.invoice_number.clone(),
                        }),
                    )
                    .await?;

                    Ok((
                        InvoiceDetail {
                            invoice,
                            items,
                            payments: Vec::new(),
                        },
                        job,
                    ))
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => ServiceError::db_error(db_err),
                TransactionError::Transaction(service_err) => service_err,
            })?;

        info!(
            "invoice {} generated for job {} totalling {}",
            detail.invoice.invoice_number, job.id, detail.invoice.grand_total
        );

        self.event_sender
            .send_or_log(Event::InvoiceGenerated {
                invoice_id: detail.invoice.id,
                job_card_id: job.id,
                invoice_number: detail.invoice.invoice_number.clone(),
            })
            .await;
        self.event_sender
            .send_or_log(Event::JobStatusChanged {
                job_card_id: job.id,
                old_status: JobStatus::QcApproved.to_string(),
                new_status: job.status.clone(),
            })
            .await;

        Ok(detail)
    }

    /// Records a received payment against an invoice. The running totals keep
    /// `paid + due == grand_total`; a payment that would overshoot the
    /// remaining balance beyond the rounding tolerance is refused. Full
    /// settlement completes the invoice and delivers the job.
    #[instrument(skip(self, actor, request))]
    pub async fn record_payment(
        &self,
        actor: &ActorContext,
        invoice_id: Uuid,
        request: RecordPaymentRequest,
    ) -> Result<InvoiceDetail, ServiceError> {
        if request.amount <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "payment amount must be positive".to_string(),
            ));
        }
        if request.method.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "payment method is required".to_string(),
            ));
        }

        let actor = *actor;

        let (invoice, paid_record, settled, job_change) = self
            .db
            .transaction::<_, (
                service_invoice::Model,
                payment::Model,
                bool,
                Option<(Uuid, String, String)>,
            ), ServiceError>(move |txn| {
                Box::pin(async move {
                    let invoice = ServiceInvoice::find_by_id(invoice_id)
                        .lock_exclusive()
                        .one(txn)
                        .await
                        .map_err(ServiceError::db_error)?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!("invoice {} not found", invoice_id))
                        })?;
                    actor.ensure_dealer(invoice.dealer_id)?;

                    if invoice.due_amount <= SETTLEMENT_EPSILON {
                        return Err(ServiceError::InvalidTransition(
                            "invoice is already settled".to_string(),
                        ));
                    }
                    if request.amount > invoice.due_amount + SETTLEMENT_EPSILON {
                        return Err(ServiceError::OverLimit(format!(
                            "payment {} exceeds remaining balance {}",
                            request.amount, invoice.due_amount
                        )));
                    }

                    let paid_record = payment::ActiveModel {
                        id: Set(Uuid::new_v4()),
                        invoice_id: Set(invoice.id),
                        dealer_id: Set(invoice.dealer_id),
                        amount: Set(request.amount),
                        method: Set(request.method),
                        reference: Set(request.reference),
                        notes: Set(request.notes),
                        received_by: Set(actor.actor_id),
                        created_at: Set(Utc::now()),
                    }
                    .insert(txn)
                    .await
                    .map_err(ServiceError::db_error)?;

                    let new_paid = invoice.paid_amount + request.amount;
                    let new_due = invoice.grand_total - new_paid;
                    let payment_status = PaymentStatus::derive(new_paid, new_due);
                    let settled = payment_status == PaymentStatus::Paid;

                    let job_card_id = invoice.job_card_id;
                    let mut active: service_invoice::ActiveModel = invoice.into();
                    active.paid_amount = Set(new_paid);
                    active.due_amount = Set(new_due);
                    active.payment_status = Set(payment_status.to_string());
                    if settled {
                        active.status = Set(InvoiceStatus::Completed.to_string());
                    }
                    active.updated_at = Set(Some(Utc::now()));
                    let invoice = active.update(txn).await.map_err(ServiceError::db_error)?;

                    // Settlement hands the bike back: deliver the job if it is
                    // still sitting in completed.
                    let mut job_change = None;
                    if settled {
                        let job = JobCard::find_by_id(job_card_id)
                            .lock_exclusive()
                            .one(txn)
                            .await
                            .map_err(ServiceError::db_error)?
                            .ok_or_else(|| {
                                ServiceError::NotFound(format!(
                                    "job card {} not found",
                                    job_card_id
                                ))
                            })?;
                        if parse_job_status(&job)? == JobStatus::Completed {
                            let old_status = job.status.clone();
                            let job = transition_job(
                                txn,
                                job,
                                JobStatus::Delivered,
                                actor.actor_id,
                                None,
                            )
                            .await?;
                            job_change = Some((job.id, old_status, job.status));
                        }
                    }

                    outbox::enqueue(
                        txn,
                        "service_invoice",
                        Some(invoice.id),
                        "PaymentRecorded",
                        &serde_json::json!({
                            "payment_id": paid_record.id,
                            "invoice_id": invoice.id,
                            "settled": settled,
                        }),
                    )
                    .await?;

                    Ok((invoice, paid_record, settled, job_change))
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => ServiceError::db_error(db_err),
                TransactionError::Transaction(service_err) => service_err,
            })?;

        info!(
            "payment {} of {} recorded on invoice {} (settled={})",
            paid_record.id, paid_record.amount, invoice.invoice_number, settled
        );

        self.event_sender
            .send_or_log(Event::PaymentRecorded {
                payment_id: paid_record.id,
                invoice_id: invoice.id,
                settled,
            })
            .await;
        if let Some((job_card_id, old_status, new_status)) = job_change {
            self.event_sender
                .send_or_log(Event::JobStatusChanged {
                    job_card_id,
                    old_status,
                    new_status,
                })
                .await;
        }

        self.get(&actor, invoice.id).await
    }

    #[instrument(skip(self, actor))]
    pub async fn get(
        &self,
        actor: &ActorContext,
        invoice_id: Uuid,
    ) -> Result<InvoiceDetail, ServiceError> {
        let invoice = ServiceInvoice::find_by_id(invoice_id)
            .one(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("invoice {} not found", invoice_id)))?;
        actor.ensure_dealer(invoice.dealer_id)?;

        let items = InvoiceItem::find()
            .filter(invoice_item::Column::InvoiceId.eq(invoice.id))
            .order_by_asc(invoice_item::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)?;

        let payments = Payment::find()
            .filter(payment::Column::InvoiceId.eq(invoice.id))
            .order_by_asc(payment::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)?;

        Ok(InvoiceDetail {
            invoice,
            items,
            payments,
        })
    }

    /// Invoices for the actor's dealer, newest first.
    #[instrument(skip(self, actor))]
    pub async fn list(
        &self,
        actor: &ActorContext,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<service_invoice::Model>, u64), ServiceError> {
        let paginator = ServiceInvoice::find()
            .filter(service_invoice::Column::DealerId.eq(actor.dealer_id))
            .order_by_desc(service_invoice::Column::CreatedAt)
            .paginate(self.db.as_ref(), per_page.max(1));

        let total = paginator.num_items().await.map_err(ServiceError::db_error)?;
        let invoices = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(ServiceError::db_error)?;

        Ok((invoices, total))
    }
}
