//! Payment DTOs

use rust_decimal::Decimal;
use serde::Deserialize;

use domain_order::PaymentMethod;
use domain_payment::{PaymentKind, PaymentRequest, PaymentTiming, ProcessRequest};

/// Checkout/admin request to start a payment
#[derive(Debug, Deserialize)]
pub struct ProcessPaymentBody {
    pub method: PaymentMethod,
    pub amount: Option<Decimal>,
    pub percentage: Option<Decimal>,
    #[serde(default = "default_kind")]
    pub kind: PaymentKind,
    #[serde(default = "default_timing")]
    pub timing: PaymentTiming,
    pub return_url: Option<String>,
    pub collection_location: Option<String>,
    pub note: Option<String>,
}

fn default_kind() -> PaymentKind {
    PaymentKind::Full
}

fn default_timing() -> PaymentTiming {
    PaymentTiming::Advance
}

impl From<ProcessPaymentBody> for PaymentRequest {
    fn from(body: ProcessPaymentBody) -> Self {
        PaymentRequest {
            method: body.method,
            amount: body.amount,
            percentage: body.percentage,
            kind: body.kind,
            timing: body.timing,
            channel: ProcessRequest {
                return_url: body.return_url,
                collection_location: body.collection_location,
                note: body.note,
            },
        }
    }
}

/// Cancel/refund request body
#[derive(Debug, Deserialize)]
pub struct ReasonBody {
    pub reason: String,
}

/// Proof-of-transfer upload
#[derive(Debug, Deserialize)]
pub struct ProofUploadBody {
    pub filename: String,
    pub content_type: String,
    /// File content, base64-encoded
    pub data_base64: String,
}
