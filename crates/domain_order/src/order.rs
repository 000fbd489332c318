//! Order aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{Actor, CustomerId, Money, OrderId};
use crate::error::OrderError;
use crate::settlement::SettlementView;

/// Order status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Customer is still customizing; not yet submitted
    Draft,
    /// Submitted, awaiting staff review
    PendingApproval,
    /// Priced by staff, awaiting customer acceptance or payment
    Quoted,
    /// Accepted and scheduled for production
    Approved,
    /// On the press
    InProduction,
    /// Produced, awaiting pickup or courier
    ReadyForDelivery,
    /// Handed over
    Delivered,
    /// Closed out
    Completed,
    /// Abandoned or rejected at any pre-delivery point
    Cancelled,
}

/// One entry in the order's append-only status history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusHistoryEntry {
    pub status: OrderStatus,
    pub changed_by: Actor,
    pub note: Option<String>,
    pub changed_at: DateTime<Utc>,
}

/// An order for customized print products
///
/// Catalog lines, design references, and delivery details live outside this
/// subsystem; the settlement code needs the total, the status machine, and
/// the derived settlement view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Unique identifier
    pub id: OrderId,
    /// Human-readable order number
    pub order_number: String,
    /// Customer who placed the order
    pub customer_id: CustomerId,
    /// Status
    pub status: OrderStatus,
    /// Order total in the order's settlement currency
    pub total: Money,
    /// Derived payment summary, written only by the payment processor
    pub settlement: SettlementView,
    /// Append-only status history
    pub status_history: Vec<StatusHistoryEntry>,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Creates a new draft order
    pub fn new(customer_id: CustomerId, total: Money) -> Self {
        let now = Utc::now();

        Self {
            id: OrderId::new_v7(),
            order_number: generate_order_number(),
            customer_id,
            status: OrderStatus::Draft,
            total,
            settlement: SettlementView::empty(total),
            status_history: vec![StatusHistoryEntry {
                status: OrderStatus::Draft,
                changed_by: Actor::Customer(customer_id),
                note: None,
                changed_at: now,
            }],
            created_at: now,
            updated_at: now,
        }
    }

    /// Updates the status, enforcing the transition table
    pub fn update_status(
        &mut self,
        status: OrderStatus,
        actor: Actor,
        note: Option<String>,
    ) -> Result<(), OrderError> {
        if !self.can_transition_to(status) {
            return Err(OrderError::InvalidStatusTransition {
                from: format!("{:?}", self.status),
                to: format!("{:?}", status),
            });
        }
        self.status = status;
        self.updated_at = Utc::now();
        self.status_history.push(StatusHistoryEntry {
            status,
            changed_by: actor,
            note,
            changed_at: self.updated_at,
        });
        Ok(())
    }

    /// Replaces the settlement view wholesale
    ///
    /// The view is always rebuilt from the full payment set; individual
    /// fields are never patched in place.
    pub fn replace_settlement(&mut self, view: SettlementView) {
        self.settlement = view;
        self.updated_at = Utc::now();
    }

    /// Returns true while the order may accept new payment attempts
    ///
    /// Deliberately wider than "approved": customers may pay ahead of full
    /// confirmation, or upon late delivery readiness.
    pub fn accepts_payments(&self) -> bool {
        matches!(
            self.status,
            OrderStatus::PendingApproval
                | OrderStatus::Approved
                | OrderStatus::Quoted
                | OrderStatus::ReadyForDelivery
        )
    }

    /// Checks if transition is valid
    fn can_transition_to(&self, target: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self.status, target),
            (Draft, PendingApproval)
                | (PendingApproval, Quoted)
                | (PendingApproval, Approved)
                | (Quoted, Approved)
                | (Approved, InProduction)
                | (InProduction, ReadyForDelivery)
                | (ReadyForDelivery, Delivered)
                | (Delivered, Completed)
                | (Draft, Cancelled)
                | (PendingApproval, Cancelled)
                | (Quoted, Cancelled)
                | (Approved, Cancelled)
                | (InProduction, Cancelled)
        )
    }
}

fn generate_order_number() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let duration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    format!("ORD-{}", duration.as_millis() % 10_000_000_000)
}
