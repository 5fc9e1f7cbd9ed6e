use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A proposed reconciliation between counted and recorded stock.
/// Differences are snapshotted at proposal time and applied as stored
/// when the adjustment is approved.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stock_adjustments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub dealer_id: Uuid,
    /// Dealer-scoped human-readable number, e.g. "ADJ-2026-000007".
    pub adjustment_number: String,
    pub reason: String,
    pub status: String,
    pub performed_by: Uuid,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub total_items: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::stock_adjustment_item::Entity")]
    Items,
}

impl Related<super::stock_adjustment_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
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
pub enum AdjustmentStatus {
    Pending,
    Approved,
    Rejected,
}

impl AdjustmentStatus {
    /// Adjustments are single-shot: only a pending proposal can be settled.
    pub fn can_transition_to(self, next: AdjustmentStatus) -> bool {
        matches!(
            (self, next),
            (AdjustmentStatus::Pending, AdjustmentStatus::Approved)
                | (AdjustmentStatus::Pending, AdjustmentStatus::Rejected)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(AdjustmentStatus::Pending, AdjustmentStatus::Approved, true)]
    #[test_case(AdjustmentStatus::Pending, AdjustmentStatus::Rejected, true)]
    #[test_case(AdjustmentStatus::Approved, AdjustmentStatus::Rejected, false; "cannot reject after approval")]
    #[test_case(AdjustmentStatus::Rejected, AdjustmentStatus::Approved, false; "cannot approve after rejection")]
    #[test_case(AdjustmentStatus::Approved, AdjustmentStatus::Approved, false; "approval is not idempotent")]
    fn transition_table(from: AdjustmentStatus, to: AdjustmentStatus, allowed: bool) {
        assert_eq!(from.can_transition_to(to), allowed);
    }
}
