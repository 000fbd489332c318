//! Derived settlement view
//!
//! The settlement view summarizes every payment attempt against an order
//! into four fields: the method of the most recent attempt, an aggregate
//! status, the total credited, and the outstanding balance.
//!
//! The view is always rebuilt from the full payment set. Callers pass the
//! payment set as `PaymentSummary` values so this crate does not depend on
//! the payment domain's full record type.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::Money;

/// Settlement channel for a payment attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Online card gateway (redirect + webhook)
    Gateway,
    /// In-person cash, now or on delivery
    Cash,
    /// Manual bank transfer with proof verification
    BankTransfer,
}

impl PaymentMethod {
    /// Returns the wire name of the method
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Gateway => "gateway",
            PaymentMethod::Cash => "cash",
            PaymentMethod::BankTransfer => "bank_transfer",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a payment attempt contributes to the settlement view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentProgress {
    /// Pending or processing: attempt is still in flight
    Open,
    /// Completed: counts toward the total paid
    Settled,
    /// Failed, cancelled, or refunded: kept for audit, contributes nothing
    Closed,
}

/// The slice of one payment the settlement view needs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentSummary {
    pub method: PaymentMethod,
    pub amount: Money,
    pub progress: PaymentProgress,
    pub created_at: DateTime<Utc>,
}

/// Aggregate payment status of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettlementStatus {
    /// Nothing credited and no attempt in flight
    Pending,
    /// At least one attempt is in flight, or partial credit exists
    Processing,
    /// Total credited covers the order total
    Completed,
}

/// Derived summary of what has been paid against an order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementView {
    /// Method of the most recent payment attempt, if any
    pub method: Option<PaymentMethod>,
    /// Aggregate status
    pub status: SettlementStatus,
    /// Sum of amounts over completed payments
    pub total_paid: Money,
    /// Outstanding balance, never negative
    pub balance: Money,
}

impl SettlementView {
    /// An empty view for an order with no payment attempts
    pub fn empty(total: Money) -> Self {
        Self {
            method: None,
            status: SettlementStatus::Pending,
            total_paid: Money::zero(total.currency()),
            balance: total,
        }
    }

    /// Rebuilds the view from scratch over the full payment set
    ///
    /// `total_paid` sums settled attempts only; the aggregate status is
    /// `Completed` once the total is covered, `Processing` while any attempt
    /// is open or partial credit exists, and `Pending` otherwise.
    pub fn recompute(total: Money, payments: &[PaymentSummary]) -> Self {
        let currency = total.currency();

        let total_paid = payments
            .iter()
            .filter(|p| p.progress == PaymentProgress::Settled)
            .fold(Money::zero(currency), |acc, p| acc + p.amount);

        let any_open = payments
            .iter()
            .any(|p| p.progress == PaymentProgress::Open);

        let status = if total_paid >= total && !total.is_zero() {
            SettlementStatus::Completed
        } else if any_open || total_paid.is_positive() {
            SettlementStatus::Processing
        } else {
            SettlementStatus::Pending
        };

        let method = payments
            .iter()
            .max_by_key(|p| p.created_at)
            .map(|p| p.method);

        Self {
            method,
            status,
            total_paid,
            balance: (total - total_paid).clamp_non_negative(),
        }
    }

    /// Returns true once the order total is fully covered
    pub fn is_fully_paid(&self) -> bool {
        self.status == SettlementStatus::Completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::Currency;
    use rust_decimal_macros::dec;

    fn usd(amount: rust_decimal::Decimal) -> Money {
        Money::new(amount, Currency::USD)
    }

    fn summary(method: PaymentMethod, amount: rust_decimal::Decimal, progress: PaymentProgress) -> PaymentSummary {
        PaymentSummary {
            method,
            amount: usd(amount),
            progress,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_empty_view() {
        let view = SettlementView::empty(usd(dec!(100)));
        assert_eq!(view.status, SettlementStatus::Pending);
        assert_eq!(view.balance, usd(dec!(100)));
        assert!(view.method.is_none());
    }

    #[test]
    fn test_open_attempt_is_processing() {
        let view = SettlementView::recompute(
            usd(dec!(100)),
            &[summary(PaymentMethod::Gateway, dec!(30), PaymentProgress::Open)],
        );

        assert_eq!(view.status, SettlementStatus::Processing);
        assert!(view.total_paid.is_zero());
        assert_eq!(view.balance, usd(dec!(100)));
    }

    #[test]
    fn test_partial_credit_is_processing() {
        let view = SettlementView::recompute(
            usd(dec!(100)),
            &[summary(PaymentMethod::Gateway, dec!(30), PaymentProgress::Settled)],
        );

        assert_eq!(view.status, SettlementStatus::Processing);
        assert_eq!(view.total_paid, usd(dec!(30)));
        assert_eq!(view.balance, usd(dec!(70)));
    }

    #[test]
    fn test_full_credit_is_completed() {
        let view = SettlementView::recompute(
            usd(dec!(100)),
            &[
                summary(PaymentMethod::Gateway, dec!(30), PaymentProgress::Settled),
                summary(PaymentMethod::Cash, dec!(70), PaymentProgress::Settled),
            ],
        );

        assert_eq!(view.status, SettlementStatus::Completed);
        assert!(view.balance.is_zero());
        assert!(view.is_fully_paid());
    }

    #[test]
    fn test_closed_attempts_contribute_nothing() {
        let view = SettlementView::recompute(
            usd(dec!(100)),
            &[
                summary(PaymentMethod::BankTransfer, dec!(100), PaymentProgress::Closed),
            ],
        );

        assert_eq!(view.status, SettlementStatus::Pending);
        assert!(view.total_paid.is_zero());
    }

    #[test]
    fn test_method_is_most_recent_attempt() {
        let mut early = summary(PaymentMethod::Gateway, dec!(30), PaymentProgress::Settled);
        early.created_at = Utc::now() - chrono::Duration::hours(1);
        let late = summary(PaymentMethod::Cash, dec!(70), PaymentProgress::Open);

        let view = SettlementView::recompute(usd(dec!(100)), &[early, late]);
        assert_eq!(view.method, Some(PaymentMethod::Cash));
    }

    #[test]
    fn test_overpayment_clamps_balance() {
        let view = SettlementView::recompute(
            usd(dec!(100)),
            &[summary(PaymentMethod::Cash, dec!(130), PaymentProgress::Settled)],
        );

        assert_eq!(view.status, SettlementStatus::Completed);
        assert!(view.balance.is_zero());
        assert_eq!(view.total_paid, usd(dec!(130)));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use core_kernel::Currency;
    use proptest::prelude::*;

    fn arb_progress() -> impl Strategy<Value = PaymentProgress> {
        prop_oneof![
            Just(PaymentProgress::Open),
            Just(PaymentProgress::Settled),
            Just(PaymentProgress::Closed),
        ]
    }

    fn arb_method() -> impl Strategy<Value = PaymentMethod> {
        prop_oneof![
            Just(PaymentMethod::Gateway),
            Just(PaymentMethod::Cash),
            Just(PaymentMethod::BankTransfer),
        ]
    }

    proptest! {
        /// total_paid always equals the sum over settled attempts, and
        /// balance = max(0, total - total_paid), for any payment set.
        #[test]
        fn settlement_consistency(
            total in 1i64..1_000_000i64,
            attempts in proptest::collection::vec(
                (1i64..1_000_000i64, arb_progress(), arb_method()),
                0..12
            )
        ) {
            let total = Money::from_minor(total, Currency::USD);
            let payments: Vec<PaymentSummary> = attempts
                .iter()
                .map(|(minor, progress, method)| PaymentSummary {
                    method: *method,
                    amount: Money::from_minor(*minor, Currency::USD),
                    progress: *progress,
                    created_at: Utc::now(),
                })
                .collect();

            let view = SettlementView::recompute(total, &payments);

            let expected_paid = payments
                .iter()
                .filter(|p| p.progress == PaymentProgress::Settled)
                .fold(Money::zero(Currency::USD), |acc, p| acc + p.amount);

            prop_assert_eq!(view.total_paid, expected_paid);
            prop_assert_eq!(view.balance, (total - expected_paid).clamp_non_negative());
            prop_assert!(!view.balance.is_negative());

            if view.status == SettlementStatus::Completed {
                prop_assert!(view.total_paid >= total);
            }
        }
    }
}
