//! Payment domain errors
//!
//! Expected business outcomes (declined card, rejected transfer) become
//! payment state transitions, not errors. This taxonomy covers the cases
//! that are surfaced to the caller or signal infrastructure failure.

use thiserror::Error;

use core_kernel::{Money, PortError};
use domain_order::OrderError;

/// Errors that can occur in the payment domain
#[derive(Debug, Error)]
pub enum PaymentError {
    /// Bad input; surfaced to the caller verbatim, no retry
    #[error("Validation error: {0}")]
    Validation(String),

    /// State-machine violation; the attempted mutation is not applied
    #[error("Invalid payment transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    /// The payment is not in a state that allows the requested operation
    #[error("Invalid payment state: {0}")]
    InvalidState(String),

    /// No provider registered for the requested method; fails before any
    /// payment record is created
    #[error("Unsupported payment method: {0}")]
    UnsupportedMethod(String),

    /// Cash under-payment; the payment is left untouched
    #[error("Insufficient amount received: {required} required, {received} received")]
    InsufficientAmount { required: Money, received: Money },

    /// Cash overpayment beyond plausibility, treated as a data-entry error
    #[error("Implausible amount received: {received} against an expected {expected}")]
    ImplausibleAmount { expected: Money, received: Money },

    /// External gateway unreachable; callers never see this for checkout,
    /// the gateway provider degrades to its simulated path instead
    #[error("Payment provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Actor is not allowed to perform this operation
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The order is not in a status that accepts payments
    #[error("Order is not payable: {0}")]
    OrderNotPayable(String),

    /// A concurrent mutation won the per-payment version race
    #[error("Concurrent payment update: {0}")]
    Conflict(String),

    /// Webhook rejected before any confirm attempt
    #[error("Webhook rejected: {0}")]
    WebhookRejected(String),

    /// Order-side failure during settlement sync
    #[error(transparent)]
    Order(#[from] OrderError),

    /// Store or adapter failure; fatal, no silent fallback
    #[error("Persistence error: {0}")]
    Persistence(PortError),
}

impl From<PortError> for PaymentError {
    fn from(err: PortError) -> Self {
        if err.is_conflict() {
            PaymentError::Conflict(err.to_string())
        } else {
            PaymentError::Persistence(err)
        }
    }
}

impl PaymentError {
    /// Returns true for state-machine violations
    pub fn is_state_violation(&self) -> bool {
        matches!(
            self,
            PaymentError::InvalidTransition { .. } | PaymentError::InvalidState(_)
        )
    }
}
