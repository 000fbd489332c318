//! Settlement assertions

use core_kernel::Money;
use domain_order::SettlementView;
use domain_payment::{Payment, PaymentStatus};

/// Asserts the settlement-consistency invariant: the view's `total_paid`
/// equals the sum over completed payments and the balance is clamped at
/// zero.
///
/// # Panics
///
/// Panics with a descriptive message when the invariant does not hold.
pub fn assert_settlement_consistent(total: Money, payments: &[Payment], view: &SettlementView) {
    let expected_paid = payments
        .iter()
        .filter(|p| p.status == PaymentStatus::Completed)
        .fold(Money::zero(total.currency()), |acc, p| acc + p.amount);

    assert_eq!(
        view.total_paid, expected_paid,
        "total_paid {} diverged from the sum over completed payments {}",
        view.total_paid, expected_paid
    );

    let expected_balance = (total - expected_paid).clamp_non_negative();
    assert_eq!(
        view.balance, expected_balance,
        "balance {} diverged from max(0, total - total_paid) {}",
        view.balance, expected_balance
    );

    assert!(
        !view.balance.is_negative(),
        "balance must never go negative, got {}",
        view.balance
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::TestPaymentBuilder;
    use crate::fixtures::MoneyFixtures;
    use rust_decimal_macros::dec;

    #[test]
    fn test_consistent_view_passes() {
        let total = MoneyFixtures::order_total();
        let payments = vec![
            TestPaymentBuilder::new()
                .with_amount(MoneyFixtures::usd(dec!(30)))
                .in_status(PaymentStatus::Completed)
                .build(),
            TestPaymentBuilder::new()
                .with_amount(MoneyFixtures::usd(dec!(70)))
                .in_status(PaymentStatus::Failed)
                .build(),
        ];

        let summaries: Vec<_> = payments.iter().map(Payment::summary).collect();
        let view = SettlementView::recompute(total, &summaries);

        assert_settlement_consistent(total, &payments, &view);
    }

    #[test]
    #[should_panic(expected = "total_paid")]
    fn test_drifted_view_panics() {
        let total = MoneyFixtures::order_total();
        let payments = vec![TestPaymentBuilder::new()
            .with_amount(MoneyFixtures::usd(dec!(30)))
            .in_status(PaymentStatus::Completed)
            .build()];

        let view = SettlementView::empty(total);
        assert_settlement_consistent(total, &payments, &view);
    }
}
