use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The workshop's unit of work for one vehicle service visit.
/// 1:1 with the originating service ticket.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "job_cards")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub dealer_id: Uuid,
    pub technician_id: Option<Uuid>,
    pub status: String,
    pub notes: Option<String>,
    pub estimated_completion_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::requisition_item::Entity")]
    RequisitionItems,
    #[sea_orm(has_many = "super::service_task::Entity")]
    Tasks,
    #[sea_orm(has_many = "super::qc_request::Entity")]
    QcRequests,
    #[sea_orm(has_many = "super::job_status_history::Entity")]
    StatusHistory,
}

impl Related<super::requisition_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RequisitionItems.def()
    }
}

impl Related<super::service_task::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tasks.def()
    }
}

impl Related<super::qc_request::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::QcRequests.def()
    }
}

impl Related<super::job_status_history::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StatusHistory.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    InProgress,
    QcRequested,
    QcApproved,
    QcRejected,
    Completed,
    Delivered,
}

impl JobStatus {
    /// Legal transitions across the job lifecycle. `qc_rejected` loops back
    /// to `in_progress` for rework; `completed → delivered` happens at
    /// settlement.
    pub fn can_transition_to(self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Pending, JobStatus::InProgress)
                | (JobStatus::QcRejected, JobStatus::InProgress)
                | (JobStatus::InProgress, JobStatus::QcRequested)
                | (JobStatus::QcRequested, JobStatus::QcApproved)
                | (JobStatus::QcRequested, JobStatus::QcRejected)
                | (JobStatus::QcApproved, JobStatus::Completed)
                | (JobStatus::Completed, JobStatus::Delivered)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use test_case::test_case;

    #[test_case(JobStatus::Pending, JobStatus::InProgress, true)]
    #[test_case(JobStatus::InProgress, JobStatus::QcRequested, true)]
    #[test_case(JobStatus::QcRequested, JobStatus::QcApproved, true)]
    #[test_case(JobStatus::QcRequested, JobStatus::QcRejected, true)]
    #[test_case(JobStatus::QcRejected, JobStatus::InProgress, true; "rework loop")]
    #[test_case(JobStatus::QcApproved, JobStatus::Completed, true; "invoice generation")]
    #[test_case(JobStatus::Completed, JobStatus::Delivered, true; "settlement")]
    #[test_case(JobStatus::Pending, JobStatus::QcRequested, false; "cannot skip work")]
    #[test_case(JobStatus::Pending, JobStatus::Delivered, false)]
    #[test_case(JobStatus::Delivered, JobStatus::Pending, false; "terminal state")]
    #[test_case(JobStatus::Completed, JobStatus::InProgress, false)]
    #[test_case(JobStatus::QcApproved, JobStatus::Delivered, false; "must be invoiced first")]
    fn transition_table(from: JobStatus, to: JobStatus, allowed: bool) {
        assert_eq!(from.can_transition_to(to), allowed);
    }

    #[test]
    fn status_strings_round_trip() {
        for status in [
            JobStatus::Pending,
            JobStatus::InProgress,
            JobStatus::QcRequested,
            JobStatus::QcApproved,
            JobStatus::QcRejected,
            JobStatus::Completed,
            JobStatus::Delivered,
        ] {
            assert_eq!(JobStatus::from_str(&status.to_string()).unwrap(), status);
        }
        assert_eq!(JobStatus::QcRequested.to_string(), "qc_requested");
    }

    #[test]
    fn returned_is_unreachable_without_approval_analog_for_jobs() {
        // A job can never reach delivered without passing through completed.
        for from in [
            JobStatus::Pending,
            JobStatus::InProgress,
            JobStatus::QcRequested,
            JobStatus::QcApproved,
            JobStatus::QcRejected,
        ] {
            assert!(!from.can_transition_to(JobStatus::Delivered));
        }
    }
}
