use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use workshop_api::entities::{
    inventory_movement::MovementType,
    product::StockStatus,
    requisition_item::{derive_group_status, RequisitionStatus},
    service_invoice::{compute_totals, PaymentStatus, SETTLEMENT_EPSILON},
};

/// Monetary amounts in whole cents, up to 10,000.00.
fn money() -> impl Strategy<Value = Decimal> {
    (0i64..=1_000_000).prop_map(|cents| Decimal::new(cents, 2))
}

/// Tax rates between 0.00% and 100.00%.
fn tax_rate() -> impl Strategy<Value = Decimal> {
    (0i64..=10_000).prop_map(|basis| Decimal::new(basis, 2))
}

fn requisition_status() -> impl Strategy<Value = RequisitionStatus> {
    prop_oneof![
        Just(RequisitionStatus::Pending),
        Just(RequisitionStatus::Approved),
        Just(RequisitionStatus::Rejected),
        Just(RequisitionStatus::Returned),
    ]
}

proptest! {
    #[test]
    fn invoice_totals_are_internally_consistent(
        subtotal in money(),
        discount in money(),
        rate in tax_rate(),
    ) {
        let (tax, grand) = compute_totals(subtotal, discount, rate);
        let taxable = (subtotal - discount).max(Decimal::ZERO);

        prop_assert!(tax >= Decimal::ZERO);
        prop_assert!(grand >= Decimal::ZERO);
        // Inputs carry cent precision, so the rounded sum is exact.
        prop_assert_eq!(grand, taxable + tax);
        // The rounded tax stays within half a cent of the exact figure.
        let exact = taxable * rate / dec!(100);
        prop_assert!((tax - exact).abs() <= dec!(0.005));

        if discount >= subtotal {
            prop_assert_eq!(grand, Decimal::ZERO);
        }
    }

    #[test]
    fn payment_ledger_conserves_the_grand_total(
        grand_cents in 1i64..=1_000_000,
        attempts in proptest::collection::vec(0i64..=1_000_000, 0..12),
    ) {
        let grand = Decimal::new(grand_cents, 2);
        let mut paid = Decimal::ZERO;
        let mut due = grand;

        for cents in attempts {
            let amount = Decimal::new(cents, 2);
            // Mirror the acceptance rules: positive amount, an open balance,
            // and no overshoot beyond the settlement tolerance.
            if amount <= Decimal::ZERO
                || due <= SETTLEMENT_EPSILON
                || amount > due + SETTLEMENT_EPSILON
            {
                continue;
            }
            paid += amount;
            due = grand - paid;

            prop_assert_eq!(paid + due, grand);
            prop_assert!(due >= -SETTLEMENT_EPSILON);
            match PaymentStatus::derive(paid, due) {
                PaymentStatus::Paid => prop_assert!(due <= SETTLEMENT_EPSILON),
                PaymentStatus::Partial => prop_assert!(due > SETTLEMENT_EPSILON),
                PaymentStatus::Unpaid => prop_assert!(paid == Decimal::ZERO),
            }
        }
    }

    #[test]
    fn movement_arithmetic_and_direction_agree(
        before in -10_000i32..=10_000,
        delta in -10_000i32..=10_000,
    ) {
        let after = before + delta;
        prop_assert_eq!(after - before, delta);

        let movement = MovementType::from_delta(delta);
        if delta < 0 {
            prop_assert_eq!(movement, MovementType::StockOut);
        } else {
            prop_assert_eq!(movement, MovementType::StockIn);
        }
    }

    #[test]
    fn stock_status_is_monotone_in_quantity(
        q1 in -100i32..=100,
        q2 in -100i32..=100,
        threshold in 0i32..=50,
    ) {
        fn rank(status: StockStatus) -> u8 {
            match status {
                StockStatus::OutOfStock => 0,
                StockStatus::LowStock => 1,
                StockStatus::InStock => 2,
            }
        }
        let (lo, hi) = if q1 <= q2 { (q1, q2) } else { (q2, q1) };
        prop_assert!(
            rank(StockStatus::derive(lo, threshold)) <= rank(StockStatus::derive(hi, threshold))
        );
    }

    #[test]
    fn group_status_rejection_wins_then_pending(
        statuses in proptest::collection::vec(requisition_status(), 1..10),
    ) {
        let derived = derive_group_status(&statuses);
        if statuses.contains(&RequisitionStatus::Rejected) {
            prop_assert_eq!(derived, RequisitionStatus::Rejected);
        } else if statuses.contains(&RequisitionStatus::Pending) {
            prop_assert_eq!(derived, RequisitionStatus::Pending);
        } else {
            prop_assert_eq!(derived, RequisitionStatus::Approved);
        }
    }
}
