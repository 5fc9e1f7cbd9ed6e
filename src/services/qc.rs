use crate::{
    auth::ActorContext,
    entities::{
        job_card::{Entity as JobCard, JobStatus},
        qc_checklist_item::{self, Entity as QcChecklistItem},
        qc_request::{self, Entity as QcRequest, QcStatus},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::job_cards::transition_job,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionError, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewChecklistItem {
    #[validate(length(min = 1, max = 100))]
    pub category: String,
    #[validate(length(min = 1, max = 1000))]
    pub description: String,
    pub passed: bool,
    #[validate(url)]
    pub photo_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct QcVerdict {
    pub approved: bool,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
    #[validate]
    pub checklist: Vec<NewChecklistItem>,
}

#[derive(Debug, Clone, Serialize)]
pub struct QcReviewDetail {
    pub request: qc_request::Model,
    pub checklist: Vec<qc_checklist_item::Model>,
}

pub struct QcService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl QcService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Settles a pending QC request and drives the job forward in the same
    /// transaction: approval moves the job to `qc_approved`, rejection sends
    /// it back through `qc_rejected` for rework. The checklist is stored
    /// with the verdict.
    #[instrument(skip(self, actor, verdict))]
    pub async fn review(
        &self,
        actor: &ActorContext,
        qc_request_id: Uuid,
        verdict: QcVerdict,
    ) -> Result<QcReviewDetail, ServiceError> {
        verdict.validate()?;
        if !verdict.approved && verdict.notes.as_deref().map_or(true, str::is_empty) {
            return Err(ServiceError::ValidationError(
                "a rejection needs notes explaining the rework".to_string(),
            ));
        }

        let actor = *actor;
        let approved = verdict.approved;

        let (detail, job_old_status, job) = self
            .db
            .transaction::<_, (QcReviewDetail, String, crate::entities::job_card::Model), ServiceError>(
                move |txn| {
                    Box::pin(async move {
                        let request = QcRequest::find_by_id(qc_request_id)
                            .lock_exclusive()
                            .one(txn)
                            .await
                            .map_err(ServiceError::db_error)?
                            .ok_or_else(|| {
                                ServiceError::NotFound(format!(
                                    "qc request {} not found",
                                    qc_request_id
                                ))
                            })?;
                        actor.ensure_dealer(request.dealer_id)?;

                        let status = QcStatus::from_str(&request.status).map_err(|_| {
                            ServiceError::InternalError(format!(
                                "qc request {} has unknown status {}",
                                request.id, request.status
                            ))
                        })?;
                        if status.is_settled() {
                            return Err(ServiceError::InvalidTransition(format!(
                                "qc request already {}",
                                request.status
                            )));
                        }
                        // Reviewer independence: the technician who requested
                        // the review cannot settle it.
                        if request.requested_by == actor.actor_id {
                            return Err(ServiceError::Forbidden(
                                "the requesting technician cannot review their own work"
                                    .to_string(),
                            ));
                        }

                        let mut checklist = Vec::with_capacity(verdict.checklist.len());
                        for item in verdict.checklist {
                            let model = qc_checklist_item::ActiveModel {
                                id: Set(Uuid::new_v4()),
                                qc_request_id: Set(request.id),
                                category: Set(item.category),
                                description: Set(item.description),
                                passed: Set(item.passed),
                                photo_url: Set(item.photo_url),
                                created_at: Set(Utc::now()),
                            }
                            .insert(txn)
                            .await
                            .map_err(ServiceError::db_error)?;
                            checklist.push(model);
                        }

                        let next = if verdict.approved {
                            QcStatus::Approved
                        } else {
                            QcStatus::Rejected
                        };
                        let mut active: qc_request::ActiveModel = request.clone().into();
                        active.status = Set(next.to_string());
                        active.reviewer_id = Set(Some(actor.actor_id));
                        active.reviewed_at = Set(Some(Utc::now()));
                        if verdict.notes.is_some() {
                            active.notes = Set(verdict.notes.clone());
                        }
                        let request = active.update(txn).await.map_err(ServiceError::db_error)?;

                        let job = JobCard::find_by_id(request.job_card_id)
                            .lock_exclusive()
                            .one(txn)
                            .await
                            .map_err(ServiceError::db_error)?
                            .ok_or_else(|| {
                                ServiceError::NotFound(format!(
                                    "job card {} not found",
                                    request.job_card_id
                                ))
                            })?;
                        let job_old_status = job.status.clone();
                        let job_next = if verdict.approved {
                            JobStatus::QcApproved
                        } else {
                            JobStatus::QcRejected
                        };
                        let job = transition_job(
                            txn,
                            job,
                            job_next,
                            actor.actor_id,
                            verdict.notes,
                        )
                        .await?;

                        Ok((QcReviewDetail { request, checklist }, job_old_status, job))
                    })
                },
            )
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => ServiceError::db_error(db_err),
                TransactionError::Transaction(service_err) => service_err,
            })?;

        info!(
            "qc request {} reviewed: {}",
            detail.request.id, detail.request.status
        );

        self.event_sender
            .send_or_log(Event::QcReviewed {
                qc_request_id: detail.request.id,
                job_card_id: job.id,
                approved,
            })
            .await;
        self.event_sender
            .send_or_log(Event::JobStatusChanged {
                job_card_id: job.id,
                old_status: job_old_status,
                new_status: job.status.clone(),
            })
            .await;

        Ok(detail)
    }

    #[instrument(skip(self, actor))]
    pub async fn get(
        &self,
        actor: &ActorContext,
        qc_request_id: Uuid,
    ) -> Result<QcReviewDetail, ServiceError> {
        let request = QcRequest::find_by_id(qc_request_id)
            .one(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("qc request {} not found", qc_request_id))
            })?;
        actor.ensure_dealer(request.dealer_id)?;

        let checklist = QcChecklistItem::find()
            .filter(qc_checklist_item::Column::QcRequestId.eq(request.id))
            .order_by_asc(qc_checklist_item::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)?;

        Ok(QcReviewDetail { request, checklist })
    }

    /// Open reviews waiting on the actor's dealer, oldest first.
    #[instrument(skip(self, actor))]
    pub async fn list_pending(
        &self,
        actor: &ActorContext,
    ) -> Result<Vec<qc_request::Model>, ServiceError> {
        QcRequest::find()
            .filter(qc_request::Column::DealerId.eq(actor.dealer_id))
            .filter(qc_request::Column::Status.eq(QcStatus::Pending.to_string()))
            .order_by_asc(qc_request::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)
    }
}
