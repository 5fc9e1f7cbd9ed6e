use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Immutable audit record of one stock change.
///
/// Created once per ledger operation, never updated or deleted.
/// Invariant: `quantity_after == quantity_before + quantity_change`, and
/// `quantity_after` equals the product's `stock_quantity` at the moment the
/// enclosing transaction commits.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "inventory_movements")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub dealer_id: Uuid,
    pub product_id: Uuid,
    pub batch_id: Option<Uuid>,
    /// "stock_in" or "stock_out".
    pub movement_type: String,
    pub quantity_before: i32,
    /// Signed delta applied to the product quantity.
    pub quantity_change: i32,
    pub quantity_after: i32,
    /// What caused the movement: requisition, requisition_return, adjustment, sale.
    pub reference_type: String,
    pub reference_id: Uuid,
    pub reason: Option<String>,
    pub performed_by: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id"
    )]
    Product,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum MovementType {
    StockIn,
    StockOut,
}

impl MovementType {
    /// Movement direction implied by a signed quantity delta.
    pub fn from_delta(delta: i32) -> Self {
        if delta >= 0 {
            MovementType::StockIn
        } else {
            MovementType::StockOut
        }
    }
}

/// What a movement is bookkeeping for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum ReferenceType {
    Requisition,
    RequisitionReturn,
    Adjustment,
    Sale,
}
