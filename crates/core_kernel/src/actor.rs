//! Actor attribution for domain operations
//!
//! Every mutation records who initiated it: a customer (checkout, proof
//! upload), a staff member (cash receipt, transfer verification), or the
//! system itself (webhook-driven confirmation).

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::identifiers::{CustomerId, StaffId};

/// The party responsible for an operation
///
/// Modeled as a tagged union rather than an id + collection-name pair so
/// that an actor reference can never point at the wrong collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Actor {
    /// An authenticated customer
    Customer(CustomerId),
    /// A staff member acting through the admin surface
    Staff(StaffId),
    /// The platform itself (webhooks, scheduled reconciliation)
    System,
}

impl Actor {
    /// Returns true for staff actors
    pub fn is_staff(&self) -> bool {
        matches!(self, Actor::Staff(_))
    }

    /// Returns true for system-initiated operations
    pub fn is_system(&self) -> bool {
        matches!(self, Actor::System)
    }

    /// Returns the customer id if this actor is a customer
    pub fn customer_id(&self) -> Option<CustomerId> {
        match self {
            Actor::Customer(id) => Some(*id),
            _ => None,
        }
    }

    /// Returns true if this actor may act on behalf of the given customer
    ///
    /// Staff and system actors always may; a customer only for themselves.
    pub fn can_act_for(&self, customer: CustomerId) -> bool {
        match self {
            Actor::Customer(id) => *id == customer,
            Actor::Staff(_) | Actor::System => true,
        }
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Actor::Customer(id) => write!(f, "customer:{}", id),
            Actor::Staff(id) => write!(f, "staff:{}", id),
            Actor::System => write!(f, "system"),
        }
    }
}
