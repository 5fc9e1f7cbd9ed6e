use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Tolerance under which a remaining balance counts as settled.
pub const SETTLEMENT_EPSILON: Decimal = dec!(0.01);

/// Bill for a completed job: labor lines plus approved parts.
///
/// Invariant maintained by the payment ledger:
/// `paid_amount + due_amount == grand_total` after every payment.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "service_invoices")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub dealer_id: Uuid,
    pub job_card_id: Uuid,
    /// Dealer-scoped sequential number, e.g. "INV-2026-000042".
    pub invoice_number: String,
    pub subtotal: Decimal,
    pub discount_amount: Decimal,
    /// Tax is computed on the post-discount amount.
    pub tax_amount: Decimal,
    pub grand_total: Decimal,
    pub paid_amount: Decimal,
    pub due_amount: Decimal,
    pub payment_status: String,
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
    #[sea_orm(has_many = "super::invoice_item::Entity")]
    Items,
    #[sea_orm(has_many = "super::payment::Entity")]
    Payments,
}

impl Related<super::job_card::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::JobCard.def()
    }
}

impl Related<super::invoice_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl Related<super::payment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payments.def()
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
pub enum PaymentStatus {
    Unpaid,
    Partial,
    Paid,
}

impl PaymentStatus {
    /// Derives the payment status from the amounts after a payment lands.
    /// A residual balance at or under [`SETTLEMENT_EPSILON`] counts as paid.
    pub fn derive(paid: Decimal, due: Decimal) -> Self {
        if due <= SETTLEMENT_EPSILON {
            PaymentStatus::Paid
        } else if paid > Decimal::ZERO {
            PaymentStatus::Partial
        } else {
            PaymentStatus::Unpaid
        }
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
pub enum InvoiceStatus {
    Issued,
    Completed,
}

/// Invoice totals: discount applies to the subtotal, then tax applies to the
/// discounted amount. All figures rounded to 2 decimal places.
pub fn compute_totals(
    subtotal: Decimal,
    discount_amount: Decimal,
    tax_rate_percent: Decimal,
) -> (Decimal, Decimal) {
    let taxable = (subtotal - discount_amount).max(Decimal::ZERO);
    let tax_amount = (taxable * tax_rate_percent / dec!(100)).round_dp(2);
    let grand_total = (taxable + tax_amount).round_dp(2);
    (tax_amount, grand_total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(dec!(0), dec!(100), PaymentStatus::Unpaid)]
    #[test_case(dec!(40), dec!(60), PaymentStatus::Partial)]
    #[test_case(dec!(100), dec!(0), PaymentStatus::Paid)]
    #[test_case(dec!(99.995), dec!(0.005), PaymentStatus::Paid; "residual under epsilon")]
    #[test_case(dec!(99.99), dec!(0.01), PaymentStatus::Paid; "residual at epsilon")]
    #[test_case(dec!(99.98), dec!(0.02), PaymentStatus::Partial; "residual above epsilon")]
    fn payment_status_derivation(paid: Decimal, due: Decimal, expected: PaymentStatus) {
        assert_eq!(PaymentStatus::derive(paid, due), expected);
    }

    #[test]
    fn tax_applies_after_discount() {
        // 1000 subtotal, 100 discount, 10% tax: tax on 900, not 1000.
        let (tax, total) = compute_totals(dec!(1000), dec!(100), dec!(10));
        assert_eq!(tax, dec!(90.00));
        assert_eq!(total, dec!(990.00));
    }

    #[test]
    fn discount_exceeding_subtotal_clamps_to_zero() {
        let (tax, total) = compute_totals(dec!(50), dec!(80), dec!(10));
        assert_eq!(tax, dec!(0.00));
        assert_eq!(total, dec!(0.00));
    }

    #[test]
    fn totals_round_to_cents() {
        let (tax, total) = compute_totals(dec!(33.33), dec!(0), dec!(7.5));
        assert_eq!(tax, dec!(2.50));
        assert_eq!(total, dec!(35.83));
    }
}
