use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One line of a technician's parts request against a job card.
///
/// Unit price is snapshotted at creation time and never re-fetched, so the
/// line total stays frozen even if the catalog price changes later.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "requisition_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Correlates items submitted together as one batch.
    pub requisition_group_id: Uuid,
    pub job_card_id: Uuid,
    pub ticket_id: Uuid,
    pub dealer_id: Uuid,
    /// Requesting technician.
    pub staff_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub total_price: Decimal,
    pub status: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::job_card::Entity",
        from = "Column::JobCardId",
        to = "super::job_card::Column::Id"
    )]
    JobCard,
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id"
    )]
    Product,
}

impl Related<super::job_card::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::JobCard.def()
    }
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
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
pub enum RequisitionStatus {
    Pending,
    Approved,
    Rejected,
    Returned,
}

impl RequisitionStatus {
    /// Legal transitions: pending → approved | rejected, approved → returned.
    /// Everything else is an invalid transition.
    pub fn can_transition_to(self, next: RequisitionStatus) -> bool {
        matches!(
            (self, next),
            (RequisitionStatus::Pending, RequisitionStatus::Approved)
                | (RequisitionStatus::Pending, RequisitionStatus::Rejected)
                | (RequisitionStatus::Approved, RequisitionStatus::Returned)
        )
    }
}

/// Aggregate status of a requisition group, derived from its items:
/// rejected if any item was rejected, else pending if any item is still
/// pending, else approved.
pub fn derive_group_status(statuses: &[RequisitionStatus]) -> RequisitionStatus {
    if statuses
        .iter()
        .any(|s| *s == RequisitionStatus::Rejected)
    {
        RequisitionStatus::Rejected
    } else if statuses.iter().any(|s| *s == RequisitionStatus::Pending) {
        RequisitionStatus::Pending
    } else {
        RequisitionStatus::Approved
    }
}
