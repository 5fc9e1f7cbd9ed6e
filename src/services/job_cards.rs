use crate::{
    auth::ActorContext,
    entities::{
        job_card::{self, Entity as JobCard, JobStatus},
        job_status_history::{self, Entity as JobStatusHistory},
        qc_request::{self, QcStatus},
        service_task::{self, Entity as ServiceTask},
    },
    errors::ServiceError,
    events::{outbox, Event, EventSender},
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionError, TransactionTrait,
};
use serde::Deserialize;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewJobCard {
    pub ticket_id: Uuid,
    pub technician_id: Option<Uuid>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
    pub estimated_completion_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewServiceTask {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
}

pub(crate) fn parse_job_status(job: &job_card::Model) -> Result<JobStatus, ServiceError> {
    JobStatus::from_str(&job.status).map_err(|_| {
        ServiceError::InternalError(format!(
            "job card {} has unknown status {}",
            job.id, job.status
        ))
    })
}

/// Moves a job to `to` if the lifecycle allows it, recording the transition
/// in the history table. Runs inside the caller's transaction so the status
/// change commits together with whatever triggered it.
pub(crate) async fn transition_job<C: ConnectionTrait>(
    txn: &C,
    job: job_card::Model,
    to: JobStatus,
    actor_id: Uuid,
    reason: Option<String>,
) -> Result<job_card::Model, ServiceError> {
    let from = parse_job_status(&job)?;
    if !from.can_transition_to(to) {
        return Err(ServiceError::InvalidTransition(format!(
            "job cannot move from {} to {}",
            from, to
        )));
    }

    job_status_history::ActiveModel {
        id: Set(Uuid::new_v4()),
        job_card_id: Set(job.id),
        from_status: Set(from.to_string()),
        to_status: Set(to.to_string()),
        actor_id: Set(actor_id),
        reason: Set(reason),
        created_at: Set(Utc::now()),
    }
    .insert(txn)
    .await
    .map_err(ServiceError::db_error)?;

    let mut active: job_card::ActiveModel = job.into();
    active.status = Set(to.to_string());
    active.updated_at = Set(Some(Utc::now()));
    let updated = active.update(txn).await.map_err(ServiceError::db_error)?;

    // Durable copy of the transition, committed with it.
    outbox::enqueue(
        txn,
        "job_card",
        Some(updated.id),
        "JobStatusChanged",
        &serde_json::json!({
            "job_card_id": updated.id,
            "old_status": from.to_string(),
            "new_status": updated.status.clone(),
        }),
    )
    .await?;

    Ok(updated)
}

pub struct JobCardService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl JobCardService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Opens a job card in `pending` for the actor's dealer. One job per
    /// ticket; a second create for the same ticket is a conflict.
    #[instrument(skip(self, actor, input))]
    pub async fn create(
        &self,
        actor: &ActorContext,
        input: NewJobCard,
    ) -> Result<job_card::Model, ServiceError> {
        input.validate()?;

        let existing = JobCard::find()
            .filter(job_card::Column::TicketId.eq(input.ticket_id))
            .one(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)?;
        if existing.is_some() {
            return Err(ServiceError::InvalidTransition(format!(
                "ticket {} already has a job card",
                input.ticket_id
            )));
        }

        let job = job_card::ActiveModel {
            id: Set(Uuid::new_v4()),
            ticket_id: Set(input.ticket_id),
            dealer_id: Set(actor.dealer_id),
            technician_id: Set(input.technician_id),
            status: Set(JobStatus::Pending.to_string()),
            notes: Set(input.notes),
            estimated_completion_at: Set(input.estimated_completion_at),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        }
        .insert(self.db.as_ref())
        .await
        .map_err(ServiceError::db_error)?;

        info!("job card {} opened for ticket {}", job.id, job.ticket_id);
        Ok(job)
    }

    /// Starts (or restarts after QC rejection) work on a job.
    #[instrument(skip(self, actor))]
    pub async fn start_work(
        &self,
        actor: &ActorContext,
        job_card_id: Uuid,
    ) -> Result<job_card::Model, ServiceError> {
        self.simple_transition(actor, job_card_id, JobStatus::InProgress, None)
            .await
    }

    /// Submits a finished job for QC review: moves the job to `qc_requested`
    /// and opens a fresh QC request, in one transaction.
    #[instrument(skip(self, actor))]
    pub async fn submit_for_qc(
        &self,
        actor: &ActorContext,
        job_card_id: Uuid,
        notes: Option<String>,
    ) -> Result<(job_card::Model, qc_request::Model), ServiceError> {
        let actor = *actor;

        let (job, old_status, request) = self
            .db
            .transaction::<_, (job_card::Model, String, qc_request::Model), ServiceError>(
                move |txn| {
                    Box::pin(async move {
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
                        actor.ensure_dealer(job.dealer_id)?;

                        let old_status = job.status.clone();
                        let job =
                            transition_job(txn, job, JobStatus::QcRequested, actor.actor_id, None)
                                .await?;

                        let request = qc_request::ActiveModel {
                            id: Set(Uuid::new_v4()),
                            job_card_id: Set(job.id),
                            dealer_id: Set(job.dealer_id),
                            status: Set(QcStatus::Pending.to_string()),
                            requested_by: Set(actor.actor_id),
                            reviewer_id: Set(None),
                            reviewed_at: Set(None),
                            notes: Set(notes),
                            created_at: Set(Utc::now()),
                        }
                        .insert(txn)
                        .await
                        .map_err(ServiceError::db_error)?;

                        Ok((job, old_status, request))
                    })
                },
            )
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => ServiceError::db_error(db_err),
                TransactionError::Transaction(service_err) => service_err,
            })?;

        self.event_sender
            .send_or_log(Event::JobStatusChanged {
                job_card_id: job.id,
                old_status,
                new_status: job.status.clone(),
            })
            .await;

        Ok((job, request))
    }

    /// Adds a labor task to a job. Tasks can only be added while work can
    /// still happen on the job.
    #[instrument(skip(self, actor, input))]
    pub async fn add_task(
        &self,
        actor: &ActorContext,
        job_card_id: Uuid,
        input: NewServiceTask,
    ) -> Result<service_task::Model, ServiceError> {
        input.validate()?;

        let job = self.get(actor, job_card_id).await?;
        let status = parse_job_status(&job)?;
        if matches!(status, JobStatus::Completed | JobStatus::Delivered) {
            return Err(ServiceError::InvalidTransition(format!(
                "cannot add tasks to a {} job",
                job.status
            )));
        }

        service_task::ActiveModel {
            id: Set(Uuid::new_v4()),
            job_card_id: Set(job.id),
            name: Set(input.name),
            description: Set(input.description),
            completed: Set(false),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        }
        .insert(self.db.as_ref())
        .await
        .map_err(ServiceError::db_error)
    }

    #[instrument(skip(self, actor))]
    pub async fn complete_task(
        &self,
        actor: &ActorContext,
        job_card_id: Uuid,
        task_id: Uuid,
    ) -> Result<service_task::Model, ServiceError> {
        let job = self.get(actor, job_card_id).await?;

        let task = ServiceTask::find_by_id(task_id)
            .one(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)?
            .filter(|t| t.job_card_id == job.id)
            .ok_or_else(|| ServiceError::NotFound(format!("task {} not found", task_id)))?;

        let mut active: service_task::ActiveModel = task.into();
        active.completed = Set(true);
        active.updated_at = Set(Some(Utc::now()));
        active
            .update(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)
    }

    #[instrument(skip(self, actor))]
    pub async fn get(
        &self,
        actor: &ActorContext,
        job_card_id: Uuid,
    ) -> Result<job_card::Model, ServiceError> {
        let job = JobCard::find_by_id(job_card_id)
            .one(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("job card {} not found", job_card_id)))?;
        actor.ensure_dealer(job.dealer_id)?;
        Ok(job)
    }

    /// Transition trail for one job, oldest first.
    #[instrument(skip(self, actor))]
    pub async fn history(
        &self,
        actor: &ActorContext,
        job_card_id: Uuid,
    ) -> Result<Vec<job_status_history::Model>, ServiceError> {
        let job = self.get(actor, job_card_id).await?;

        JobStatusHistory::find()
            .filter(job_status_history::Column::JobCardId.eq(job.id))
            .order_by_asc(job_status_history::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)
    }

    #[instrument(skip(self, actor))]
    pub async fn tasks(
        &self,
        actor: &ActorContext,
        job_card_id: Uuid,
    ) -> Result<Vec<service_task::Model>, ServiceError> {
        let job = self.get(actor, job_card_id).await?;

        ServiceTask::find()
            .filter(service_task::Column::JobCardId.eq(job.id))
            .order_by_asc(service_task::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)
    }

    /// Jobs for the actor's dealer, newest first, optionally filtered by status.
    #[instrument(skip(self, actor))]
    pub async fn list(
        &self,
        actor: &ActorContext,
        status: Option<JobStatus>,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<job_card::Model>, u64), ServiceError> {
        let mut query = JobCard::find().filter(job_card::Column::DealerId.eq(actor.dealer_id));
        if let Some(status) = status {
            query = query.filter(job_card::Column::Status.eq(status.to_string()));
        }

        let paginator = query
            .order_by_desc(job_card::Column::CreatedAt)
            .paginate(self.db.as_ref(), per_page.max(1));

        let total = paginator.num_items().await.map_err(ServiceError::db_error)?;
        let jobs = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(ServiceError::db_error)?;

        Ok((jobs, total))
    }

    async fn simple_transition(
        &self,
        actor: &ActorContext,
        job_card_id: Uuid,
        to: JobStatus,
        reason: Option<String>,
    ) -> Result<job_card::Model, ServiceError> {
        let actor = *actor;

        let (job, old_status) = self
            .db
            .transaction::<_, (job_card::Model, String), ServiceError>(move |txn| {
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

                    let old_status = job.status.clone();
                    let job = transition_job(txn, job, to, actor.actor_id, reason).await?;
                    Ok((job, old_status))
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => ServiceError::db_error(db_err),
                TransactionError::Transaction(service_err) => service_err,
            })?;

        self.event_sender
            .send_or_log(Event::JobStatusChanged {
                job_card_id: job.id,
                old_status,
                new_status: job.status.clone(),
            })
            .await;

        Ok(job)
    }
}
