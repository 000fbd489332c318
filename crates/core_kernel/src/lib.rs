//! Core Kernel - Foundational types and utilities for the commerce platform
//!
//! This crate provides the fundamental building blocks used across all domain modules:
//! - Money types with precise decimal arithmetic
//! - Strongly-typed entity identifiers
//! - Actor attribution for customer/staff/system-initiated operations
//! - Port abstractions shared by store and adapter implementations

pub mod money;
pub mod identifiers;
pub mod actor;
pub mod error;
pub mod ports;

pub use money::{Money, Currency, MoneyError, Rate};
pub use identifiers::{
    OrderId, PaymentId, CustomerId, StaffId, DocumentId,
    ProductId, DesignId, NotificationId,
};
pub use actor::Actor;
pub use error::CoreError;
pub use ports::{DomainPort, PortError};
