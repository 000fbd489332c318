//! Cash provider
//!
//! In-person settlement, paid now or on delivery. `process` only records the
//! expected amount and collection context; there is no external call and no
//! intermediate processing state. `confirm` validates the counted amount,
//! computes change, and settles in one step.

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use core_kernel::{Actor, Money};
use domain_order::{Order, PaymentMethod};

use crate::error::PaymentError;
use crate::payment::{CashDetails, MethodDetails, Payment, PaymentStatus};
use crate::provider::{
    ensure_open, generate_reference, CancelOutcome, ChannelResponse, Confirmation,
    ConfirmOutcome, ProcessOutcome, ProcessRequest, ProviderStrategy,
};

/// Overpayment beyond this multiple of the expected amount is treated as a
/// data-entry error rather than real money on the counter
const MAX_OVERPAYMENT_FACTOR: Decimal = dec!(5);

/// Cash provider
#[derive(Debug, Default)]
pub struct CashProvider;

impl CashProvider {
    pub fn new() -> Self {
        Self
    }

    fn cash_details(payment: &Payment) -> Result<&CashDetails, PaymentError> {
        match &payment.details {
            MethodDetails::Cash(details) => Ok(details),
            _ => Err(PaymentError::Validation(format!(
                "payment {} is not a cash payment",
                payment.id
            ))),
        }
    }
}

#[async_trait]
impl ProviderStrategy for CashProvider {
    fn method(&self) -> PaymentMethod {
        PaymentMethod::Cash
    }

    async fn process(
        &self,
        payment: &Payment,
        _order: &Order,
        request: &ProcessRequest,
    ) -> Result<ProcessOutcome, PaymentError> {
        let mut details = CashDetails::new(payment.amount);
        details.collection_location = request.collection_location.clone();

        Ok(ProcessOutcome {
            status: PaymentStatus::Pending,
            details: MethodDetails::Cash(details),
            provider_data: serde_json::Map::new(),
            response: ChannelResponse::Cash {
                expected_amount: payment.amount,
                timing: payment.timing,
            },
        })
    }

    async fn confirm(
        &self,
        payment: &Payment,
        confirmation: &Confirmation,
        _actor: &Actor,
    ) -> Result<ConfirmOutcome, PaymentError> {
        ensure_open(payment)?;

        let Confirmation::Cash(confirmation) = confirmation else {
            return Err(PaymentError::Validation(
                "cash payment requires a cash confirmation".to_string(),
            ));
        };

        let expected = payment.amount;
        let received = Money::new(confirmation.received_amount, expected.currency());

        if received < expected {
            return Err(PaymentError::InsufficientAmount {
                required: expected,
                received,
            });
        }
        if received > expected.multiply(MAX_OVERPAYMENT_FACTOR) {
            return Err(PaymentError::ImplausibleAmount { expected, received });
        }

        let change_given = (received - expected).clamp_non_negative();

        let mut details = Self::cash_details(payment)?.clone();
        details.received_amount = Some(received);
        details.change_given = Some(change_given);
        details.receipt_number = Some(generate_reference("RCP"));
        if confirmation.collected_by.is_some() {
            details.collected_by = confirmation.collected_by.clone();
        }
        if confirmation.collection_location.is_some() {
            details.collection_location = confirmation.collection_location.clone();
        }

        // Cash settles in one step; there is no processing state
        Ok(ConfirmOutcome {
            status: PaymentStatus::Completed,
            details: MethodDetails::Cash(details),
            provider_data: serde_json::Map::new(),
            failure_reason: None,
        })
    }

    async fn cancel(
        &self,
        payment: &Payment,
        reason: &str,
        _actor: &Actor,
    ) -> Result<CancelOutcome, PaymentError> {
        ensure_open(payment)?;

        tracing::info!(payment_id = %payment.id, reason, "cash payment cancelled");
        Ok(CancelOutcome {
            cancelled_at: Utc::now(),
        })
    }
}
