use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A request for quality-control review of a finished job. One open request
/// per job at a time; a rework loop creates a fresh request on resubmission.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "qc_requests")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub job_card_id: Uuid,
    pub dealer_id: Uuid,
    pub status: String,
    pub requested_by: Uuid,
    pub reviewer_id: Option<Uuid>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::job_card::Entity",
        from = "Column::JobCardId",
        to = "super::job_card::Column::Id"
    )]
    JobCard,
    #[sea_orm(has_many = "super::qc_checklist_item::Entity")]
    ChecklistItems,
}

impl Related<super::job_card::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::JobCard.def()
    }
}

impl Related<super::qc_checklist_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ChecklistItems.def()
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
pub enum QcStatus {
    Pending,
    Approved,
    Rejected,
}

impl QcStatus {
    pub fn is_settled(self) -> bool {
        !matches!(self, QcStatus::Pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn status_strings_round_trip() {
        for status in [QcStatus::Pending, QcStatus::Approved, QcStatus::Rejected] {
            assert_eq!(QcStatus::from_str(&status.to_string()).unwrap(), status);
        }
    }

    #[test]
    fn settled_means_reviewed() {
        assert!(!QcStatus::Pending.is_settled());
        assert!(QcStatus::Approved.is_settled());
        assert!(QcStatus::Rejected.is_settled());
    }
}
