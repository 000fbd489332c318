//! Common test fixtures

use core_kernel::{Currency, CustomerId, Money, OrderId, PaymentId, StaffId};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Money values used across tests
pub struct MoneyFixtures;

impl MoneyFixtures {
    /// USD amount from a decimal literal
    pub fn usd(amount: Decimal) -> Money {
        Money::new(amount, Currency::USD)
    }

    /// A typical order total
    pub fn order_total() -> Money {
        Self::usd(dec!(100.00))
    }

    /// A 30% partial of the typical order total
    pub fn partial_deposit() -> Money {
        Self::usd(dec!(30.00))
    }
}

/// Identifier fixtures
pub struct IdFixtures;

impl IdFixtures {
    pub fn customer_id() -> CustomerId {
        CustomerId::new_v7()
    }

    pub fn staff_id() -> StaffId {
        StaffId::new_v7()
    }

    pub fn order_id() -> OrderId {
        OrderId::new_v7()
    }

    pub fn payment_id() -> PaymentId {
        PaymentId::new_v7()
    }
}

/// String fixtures
pub struct StringFixtures;

impl StringFixtures {
    pub fn collection_location() -> &'static str {
        "Store pickup counter, Calle 12 #4-56"
    }

    pub fn rejection_reason() -> &'static str {
        "transferred amount does not match the order"
    }

    pub fn card_summary() -> &'static str {
        "VISA **** 4242"
    }
}
