//! Test data builders
//!
//! Builders for constructing orders and payments with sensible defaults.
//! Target states are reached by walking the real transition tables, never by
//! assigning fields directly, so a builder can only produce reachable
//! states.

use core_kernel::{Actor, CustomerId, Money, OrderId};
use domain_order::{Order, OrderStatus, PaymentMethod};
use domain_payment::{
    CashDetails, GatewayDetails, MethodDetails, Payment, PaymentKind, PaymentStatus,
    PaymentTiming, TargetAccount, TransferDetails,
};

use crate::fixtures::{IdFixtures, MoneyFixtures};

/// Builder for test orders
pub struct TestOrderBuilder {
    customer_id: CustomerId,
    total: Money,
    status: OrderStatus,
}

impl Default for TestOrderBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestOrderBuilder {
    /// Creates a builder with a quoted 100.00 USD order
    pub fn new() -> Self {
        Self {
            customer_id: IdFixtures::customer_id(),
            total: MoneyFixtures::order_total(),
            status: OrderStatus::Quoted,
        }
    }

    /// Sets the customer
    pub fn with_customer(mut self, customer_id: CustomerId) -> Self {
        self.customer_id = customer_id;
        self
    }

    /// Sets the order total
    pub fn with_total(mut self, total: Money) -> Self {
        self.total = total;
        self
    }

    /// Sets the target status
    pub fn in_status(mut self, status: OrderStatus) -> Self {
        self.status = status;
        self
    }

    /// Builds the order, walking the status machine to the target status
    pub fn build(self) -> Order {
        let mut order = Order::new(self.customer_id, self.total);

        let path: &[OrderStatus] = match self.status {
            OrderStatus::Draft => &[],
            OrderStatus::PendingApproval => &[OrderStatus::PendingApproval],
            OrderStatus::Quoted => &[OrderStatus::PendingApproval, OrderStatus::Quoted],
            OrderStatus::Approved => &[
                OrderStatus::PendingApproval,
                OrderStatus::Quoted,
                OrderStatus::Approved,
            ],
            OrderStatus::InProduction => &[
                OrderStatus::PendingApproval,
                OrderStatus::Quoted,
                OrderStatus::Approved,
                OrderStatus::InProduction,
            ],
            OrderStatus::ReadyForDelivery => &[
                OrderStatus::PendingApproval,
                OrderStatus::Quoted,
                OrderStatus::Approved,
                OrderStatus::InProduction,
                OrderStatus::ReadyForDelivery,
            ],
            OrderStatus::Delivered => &[
                OrderStatus::PendingApproval,
                OrderStatus::Quoted,
                OrderStatus::Approved,
                OrderStatus::InProduction,
                OrderStatus::ReadyForDelivery,
                OrderStatus::Delivered,
            ],
            OrderStatus::Completed => &[
                OrderStatus::PendingApproval,
                OrderStatus::Quoted,
                OrderStatus::Approved,
                OrderStatus::InProduction,
                OrderStatus::ReadyForDelivery,
                OrderStatus::Delivered,
                OrderStatus::Completed,
            ],
            OrderStatus::Cancelled => &[OrderStatus::Cancelled],
        };

        for step in path {
            order
                .update_status(*step, Actor::System, None)
                .expect("builder walks only legal transitions");
        }
        order
    }
}

/// Builder for test payments
pub struct TestPaymentBuilder {
    order_id: OrderId,
    amount: Money,
    method: PaymentMethod,
    status: PaymentStatus,
    timing: PaymentTiming,
    kind: PaymentKind,
    created_by: Actor,
}

impl Default for TestPaymentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestPaymentBuilder {
    /// Creates a builder for a pending full cash payment of 100.00 USD
    pub fn new() -> Self {
        Self {
            order_id: IdFixtures::order_id(),
            amount: MoneyFixtures::order_total(),
            method: PaymentMethod::Cash,
            status: PaymentStatus::Pending,
            timing: PaymentTiming::Advance,
            kind: PaymentKind::Full,
            created_by: Actor::Customer(IdFixtures::customer_id()),
        }
    }

    /// Sets the order being settled
    pub fn for_order(mut self, order_id: OrderId) -> Self {
        self.order_id = order_id;
        self
    }

    /// Sets the amount
    pub fn with_amount(mut self, amount: Money) -> Self {
        self.amount = amount;
        self
    }

    /// Sets the settlement channel
    pub fn via(mut self, method: PaymentMethod) -> Self {
        self.method = method;
        self
    }

    /// Sets the target status
    pub fn in_status(mut self, status: PaymentStatus) -> Self {
        self.status = status;
        self
    }

    /// Sets the payment timing
    pub fn with_timing(mut self, timing: PaymentTiming) -> Self {
        self.timing = timing;
        self
    }

    /// Sets the payment kind
    pub fn of_kind(mut self, kind: PaymentKind) -> Self {
        self.kind = kind;
        self
    }

    /// Sets the creating actor
    pub fn created_by(mut self, actor: Actor) -> Self {
        self.created_by = actor;
        self
    }

    /// Builds the payment, walking the status machine to the target status
    pub fn build(self) -> Payment {
        let details = match self.method {
            PaymentMethod::Cash => MethodDetails::Cash(CashDetails::new(self.amount)),
            PaymentMethod::Gateway => {
                let mut d = GatewayDetails::new("GW-TEST-0001".to_string(), true);
                d.redirect_url = Some("https://checkout.simulated.local/pay/GW-TEST-0001".to_string());
                MethodDetails::Gateway(d)
            }
            PaymentMethod::BankTransfer => MethodDetails::BankTransfer(TransferDetails::new(
                "TRF-TEST-0001".to_string(),
                vec![TargetAccount {
                    bank_name: "First Print Bank".to_string(),
                    account_number: "000123456".to_string(),
                    account_holder: "PrintForge SAS".to_string(),
                }],
            )),
        };

        let mut payment = Payment::new(
            self.order_id,
            self.amount,
            details,
            self.timing,
            self.kind,
            None,
            self.created_by,
        );

        let path: &[PaymentStatus] = match self.status {
            PaymentStatus::Pending => &[],
            PaymentStatus::Processing => &[PaymentStatus::Processing],
            PaymentStatus::Completed => &[PaymentStatus::Processing, PaymentStatus::Completed],
            PaymentStatus::Failed => &[PaymentStatus::Processing, PaymentStatus::Failed],
            PaymentStatus::Cancelled => &[PaymentStatus::Cancelled],
            PaymentStatus::Refunded => &[
                PaymentStatus::Processing,
                PaymentStatus::Completed,
                PaymentStatus::Refunded,
            ],
        };

        for step in path {
            payment
                .transition_to(*step, Actor::System)
                .expect("builder walks only legal transitions");
        }
        payment
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_builder_reaches_target_status() {
        let order = TestOrderBuilder::new()
            .in_status(OrderStatus::ReadyForDelivery)
            .build();
        assert_eq!(order.status, OrderStatus::ReadyForDelivery);
        assert!(order.status_history.len() > 1);
    }

    #[test]
    fn test_payment_builder_reaches_target_status() {
        let payment = TestPaymentBuilder::new()
            .via(PaymentMethod::Gateway)
            .in_status(PaymentStatus::Refunded)
            .build();

        assert_eq!(payment.status, PaymentStatus::Refunded);
        assert!(payment.completed_at.is_some());
        assert!(payment.refunded_at.is_some());
        assert_eq!(payment.method, PaymentMethod::Gateway);
    }
}
