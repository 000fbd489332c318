//! Provider strategies
//!
//! Each settlement channel implements one `ProviderStrategy`: how to prepare
//! a payment (`process`), how to finalize it (`confirm`), and how to abort
//! it (`cancel`). The processor resolves the right strategy through a static
//! registry built once at startup.
//!
//! Providers never throw for expected business conditions; a declined card
//! or rejected transfer comes back as a status in the outcome. Only
//! infrastructure failures and state-machine violations raise.

pub mod gateway;
pub mod cash;
pub mod bank_transfer;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{Actor, Money};
use domain_order::{Order, PaymentMethod};

use crate::error::PaymentError;
use crate::payment::{MethodDetails, Payment, PaymentStatus, PaymentTiming, TargetAccount};

/// Channel-specific inputs supplied at checkout time
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProcessRequest {
    /// Where the gateway should send the customer after payment
    pub return_url: Option<String>,
    /// Where cash will be collected (store, meetup, delivery address)
    pub collection_location: Option<String>,
    /// Free-form note from the payer
    pub note: Option<String>,
}

/// Result of preparing a payment on a channel
#[derive(Debug, Clone)]
pub struct ProcessOutcome {
    /// Status the payment should move to (`Pending` keeps the initial state)
    pub status: PaymentStatus,
    /// Fully populated channel sub-record
    pub details: MethodDetails,
    /// Free-form metadata to merge into the payment's provider blob
    pub provider_data: serde_json::Map<String, serde_json::Value>,
    /// Channel-specific payload for the caller
    pub response: ChannelResponse,
}

/// Channel-specific payload returned to the caller after `process`
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "channel", rename_all = "snake_case")]
pub enum ChannelResponse {
    Gateway {
        redirect_url: String,
        link_expires_at: DateTime<Utc>,
        is_simulated: bool,
    },
    Cash {
        expected_amount: Money,
        timing: PaymentTiming,
    },
    BankTransfer {
        reference: String,
        target_accounts: Vec<TargetAccount>,
        instructions: String,
    },
}

/// Confirmation input, one variant per channel
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "channel", rename_all = "snake_case")]
pub enum Confirmation {
    Gateway(GatewayConfirmation),
    Cash(CashConfirmation),
    BankTransfer(TransferVerdict),
}

/// Gateway confirmation: webhook-delivered or admin-initiated
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfirmation {
    /// External status vocabulary (`APPROVED`, `DECLINED`, `ERROR`,
    /// `VOIDED`, `PENDING`); `None` asks the provider to poll the gateway
    pub external_status: Option<String>,
    pub transaction_id: Option<String>,
    pub card_summary: Option<String>,
    pub processing_fee: Option<Decimal>,
    /// True when this confirmation arrived through the webhook surface
    #[serde(default)]
    pub via_webhook: bool,
}

/// Cash receipt data entered by staff
#[derive(Debug, Clone, Deserialize)]
pub struct CashConfirmation {
    pub received_amount: Decimal,
    pub collected_by: Option<String>,
    pub collection_location: Option<String>,
}

/// Staff verdict on a bank-transfer proof
#[derive(Debug, Clone, Deserialize)]
pub struct TransferVerdict {
    pub approved: bool,
    pub rejection_reason: Option<String>,
}

/// Result of finalizing a payment on a channel
#[derive(Debug, Clone)]
pub struct ConfirmOutcome {
    /// Status the payment moves to
    pub status: PaymentStatus,
    /// Updated channel sub-record
    pub details: MethodDetails,
    /// Metadata to merge into the provider blob
    pub provider_data: serde_json::Map<String, serde_json::Value>,
    /// Recorded in the payment error log when the status is `Failed`
    pub failure_reason: Option<String>,
}

/// Result of aborting a payment on a channel
#[derive(Debug, Clone)]
pub struct CancelOutcome {
    pub cancelled_at: DateTime<Utc>,
}

/// One settlement channel's behavior
#[async_trait]
pub trait ProviderStrategy: Send + Sync {
    /// The method this strategy settles
    fn method(&self) -> PaymentMethod;

    /// Prepares a payment attempt
    ///
    /// Must not raise for expected business conditions (e.g., gateway
    /// unreachable); those come back as a `Pending`/`Processing` outcome on
    /// a deferred or simulated path.
    async fn process(
        &self,
        payment: &Payment,
        order: &Order,
        request: &ProcessRequest,
    ) -> Result<ProcessOutcome, PaymentError>;

    /// Finalizes a payment attempt
    ///
    /// Idempotent in the rejecting sense: confirming an attempt that is
    /// already terminal fails with a state error and applies nothing.
    async fn confirm(
        &self,
        payment: &Payment,
        confirmation: &Confirmation,
        actor: &Actor,
    ) -> Result<ConfirmOutcome, PaymentError>;

    /// Aborts a payment attempt; only legal from `Pending`/`Processing`
    async fn cancel(
        &self,
        payment: &Payment,
        reason: &str,
        actor: &Actor,
    ) -> Result<CancelOutcome, PaymentError>;
}

/// Guard shared by every provider's confirm/cancel entry points
pub(crate) fn ensure_open(payment: &Payment) -> Result<(), PaymentError> {
    if payment.status.is_terminal() {
        return Err(PaymentError::InvalidState(format!(
            "payment {} is already {}",
            payment.id, payment.status
        )));
    }
    Ok(())
}

/// Static lookup from method to provider, built once at startup
#[derive(Clone)]
pub struct ProviderRegistry {
    providers: HashMap<PaymentMethod, Arc<dyn ProviderStrategy>>,
}

impl ProviderRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self {
            providers: HashMap::new(),
        }
    }

    /// Registers a provider under its own method
    pub fn register(mut self, provider: Arc<dyn ProviderStrategy>) -> Self {
        self.providers.insert(provider.method(), provider);
        self
    }

    /// Resolves the provider for a method
    ///
    /// Fails fast with `UnsupportedMethod` before any payment record is
    /// created.
    pub fn resolve(
        &self,
        method: PaymentMethod,
    ) -> Result<Arc<dyn ProviderStrategy>, PaymentError> {
        self.providers
            .get(&method)
            .cloned()
            .ok_or_else(|| PaymentError::UnsupportedMethod(method.to_string()))
    }

    /// Methods with a registered provider
    pub fn supported_methods(&self) -> Vec<PaymentMethod> {
        self.providers.keys().copied().collect()
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared reference-string generator for the channels
pub(crate) fn generate_reference(prefix: &str) -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let duration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    let entropy = uuid::Uuid::new_v4().simple().to_string();
    format!(
        "{}-{}-{}",
        prefix,
        duration.as_millis() % 10_000_000_000,
        &entropy[..8].to_uppercase()
    )
}
