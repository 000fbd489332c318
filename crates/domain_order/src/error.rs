//! Order domain errors

use thiserror::Error;

/// Errors that can occur in the order domain
#[derive(Debug, Error)]
pub enum OrderError {
    /// Order not found
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    /// Illegal status transition
    #[error("Invalid order status transition from {from} to {to}")]
    InvalidStatusTransition { from: String, to: String },

    /// Invalid operation
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}
