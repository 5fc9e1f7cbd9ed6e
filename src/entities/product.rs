use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stockable catalog item, owned by exactly one dealer.
///
/// `stock_quantity` is mutated exclusively through the inventory ledger so
/// that every change has a matching movement record. The quantity can go
/// transiently negative under concurrent debits; `stock_status` then derives
/// to `out_of_stock`.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub dealer_id: Uuid,
    pub name: String,
    pub sku: String,
    /// Base catalog price.
    pub price: Decimal,
    /// Promotional price; takes precedence over `price` when present.
    pub sale_price: Option<Decimal>,
    pub stock_quantity: i32,
    pub low_stock_threshold: i32,
    /// Derived from quantity and threshold on every ledger write.
    pub stock_status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::inventory_movement::Entity")]
    InventoryMovements,
    #[sea_orm(has_many = "super::product_batch::Entity")]
    Batches,
}

impl Related<super::inventory_movement::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InventoryMovements.def()
    }
}

impl Related<super::product_batch::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Batches.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Effective unit price at requisition time: sale price when set,
    /// otherwise the base price.
    pub fn effective_price(&self) -> Decimal {
        self.sale_price.unwrap_or(self.price)
    }
}

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
pub enum StockStatus {
    InStock,
    LowStock,
    OutOfStock,
}

impl StockStatus {
    /// Derives the status from the current quantity and the low-stock threshold.
    pub fn derive(quantity: i32, low_stock_threshold: i32) -> Self {
        if quantity <= 0 {
            StockStatus::OutOfStock
        } else if quantity <= low_stock_threshold {
            StockStatus::LowStock
        } else {
            StockStatus::InStock
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use test_case::test_case;

    #[test_case(10, 5, StockStatus::InStock; "above threshold")]
    #[test_case(5, 5, StockStatus::LowStock; "at threshold")]
    #[test_case(3, 5, StockStatus::LowStock; "below threshold")]
    #[test_case(0, 5, StockStatus::OutOfStock; "zero")]
    #[test_case(-2, 5, StockStatus::OutOfStock; "negative after race")]
    fn stock_status_derivation(qty: i32, threshold: i32, expected: StockStatus) {
        assert_eq!(StockStatus::derive(qty, threshold), expected);
    }

    #[test]
    fn stock_status_round_trips_as_string() {
        use std::str::FromStr;
        for status in [
            StockStatus::InStock,
            StockStatus::LowStock,
            StockStatus::OutOfStock,
        ] {
            let s = status.to_string();
            assert_eq!(StockStatus::from_str(&s).unwrap(), status);
        }
        assert_eq!(StockStatus::LowStock.to_string(), "low_stock");
    }

    #[test]
    fn effective_price_prefers_sale_price() {
        let now = chrono::Utc::now();
        let mut product = Model {
            id: uuid::Uuid::new_v4(),
            dealer_id: uuid::Uuid::new_v4(),
            name: "Brake pad set".into(),
            sku: "BP-001".into(),
            price: dec!(45.00),
            sale_price: None,
            stock_quantity: 10,
            low_stock_threshold: 5,
            stock_status: "in_stock".into(),
            created_at: now,
            updated_at: None,
        };
        assert_eq!(product.effective_price(), dec!(45.00));

        product.sale_price = Some(dec!(39.50));
        assert_eq!(product.effective_price(), dec!(39.50));
    }
}
