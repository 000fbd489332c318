//! Payment record
//!
//! One `Payment` is one settlement attempt against one order. The record
//! owns its status machine: every transition is validated here, transition
//! timestamps are written exactly once, and failed attempts keep their
//! history in an append-only error log. Attempts are never deleted.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{Actor, Money, OrderId, PaymentId, StaffId};
use domain_order::{PaymentMethod, PaymentProgress, PaymentSummary};

use crate::error::PaymentError;

/// Payment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Created, nothing confirmed yet
    Pending,
    /// In flight: gateway link issued, or transfer proof awaiting review
    Processing,
    /// Settled; counts toward the order total
    Completed,
    /// Declined, rejected, or abandoned by the channel
    Failed,
    /// Aborted by the payer or staff before settlement
    Cancelled,
    /// Settled then reversed by staff
    Refunded,
}

impl PaymentStatus {
    /// Transition table for the payment lifecycle
    ///
    /// `Pending -> Processing -> Completed | Failed | Cancelled`, with
    /// `Pending` also allowed to settle or close directly (cash has no
    /// intermediate state), and `Completed -> Refunded` one-way. No state
    /// re-enters `Pending` once left.
    pub fn can_transition_to(self, target: PaymentStatus) -> bool {
        use PaymentStatus::*;
        matches!(
            (self, target),
            (Pending, Processing)
                | (Pending, Completed)
                | (Pending, Failed)
                | (Pending, Cancelled)
                | (Processing, Completed)
                | (Processing, Failed)
                | (Processing, Cancelled)
                | (Completed, Refunded)
        )
    }

    /// Returns true once no confirm/cancel may apply anymore
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PaymentStatus::Completed
                | PaymentStatus::Failed
                | PaymentStatus::Cancelled
                | PaymentStatus::Refunded
        )
    }

    /// Returns the wire name of the status
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Processing => "processing",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Cancelled => "cancelled",
            PaymentStatus::Refunded => "refunded",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether the payment is expected before or at fulfillment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentTiming {
    Advance,
    OnDelivery,
}

/// How much of the order total this attempt is meant to cover
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentKind {
    Full,
    Partial,
    AdvanceDeposit,
}

/// Target account descriptor shown in bank-transfer instructions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetAccount {
    pub bank_name: String,
    pub account_number: String,
    pub account_holder: String,
}

/// Cash channel sub-record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashDetails {
    pub expected_amount: Money,
    pub received_amount: Option<Money>,
    pub change_given: Option<Money>,
    pub collected_by: Option<String>,
    pub collection_location: Option<String>,
    pub receipt_number: Option<String>,
}

impl CashDetails {
    pub fn new(expected_amount: Money) -> Self {
        Self {
            expected_amount,
            received_amount: None,
            change_given: None,
            collected_by: None,
            collection_location: None,
            receipt_number: None,
        }
    }
}

/// Bank-transfer channel sub-record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferDetails {
    /// Reference the customer must quote on the transfer
    pub reference: String,
    pub target_accounts: Vec<TargetAccount>,
    pub proof_url: Option<String>,
    pub proof_submitted_at: Option<DateTime<Utc>>,
    pub verified_by: Option<StaffId>,
    pub rejection_reason: Option<String>,
}

impl TransferDetails {
    pub fn new(reference: String, target_accounts: Vec<TargetAccount>) -> Self {
        Self {
            reference,
            target_accounts,
            proof_url: None,
            proof_submitted_at: None,
            verified_by: None,
            rejection_reason: None,
        }
    }
}

/// Gateway channel sub-record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayDetails {
    /// Internal reference sent to the gateway
    pub reference: String,
    pub redirect_url: Option<String>,
    pub link_expires_at: Option<DateTime<Utc>>,
    pub transaction_id: Option<String>,
    pub card_summary: Option<String>,
    pub processing_fee: Option<Money>,
    pub webhook_received: bool,
    /// True when settlement ran through the local simulated path; such a
    /// record must never be mistaken for a real settlement
    pub is_simulated: bool,
}

impl GatewayDetails {
    pub fn new(reference: String, is_simulated: bool) -> Self {
        Self {
            reference,
            redirect_url: None,
            link_expires_at: None,
            transaction_id: None,
            card_summary: None,
            processing_fee: None,
            webhook_received: false,
            is_simulated,
        }
    }
}

/// Channel-specific sub-record
///
/// Exactly one variant is populated per payment, and it always matches the
/// payment's method: the method is derived from this union at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "channel", rename_all = "snake_case")]
pub enum MethodDetails {
    Gateway(GatewayDetails),
    Cash(CashDetails),
    BankTransfer(TransferDetails),
}

impl MethodDetails {
    /// The settlement method this sub-record belongs to
    pub fn method(&self) -> PaymentMethod {
        match self {
            MethodDetails::Gateway(_) => PaymentMethod::Gateway,
            MethodDetails::Cash(_) => PaymentMethod::Cash,
            MethodDetails::BankTransfer(_) => PaymentMethod::BankTransfer,
        }
    }
}

/// One entry in the append-only error log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorLogEntry {
    pub message: String,
    pub context: Option<String>,
    pub logged_at: DateTime<Utc>,
}

/// One entry in the transition audit trail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionEntry {
    pub status: PaymentStatus,
    pub actor: Actor,
    pub at: DateTime<Utc>,
}

/// A payment attempt against an order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    /// Unique identifier
    pub id: PaymentId,
    /// Order being settled
    pub order_id: OrderId,
    /// Amount of this attempt; immutable after creation, adjustments
    /// require a new payment
    pub amount: Money,
    /// Settlement channel
    pub method: PaymentMethod,
    /// Status
    pub status: PaymentStatus,
    /// Expected before or at fulfillment
    pub timing: PaymentTiming,
    /// Full, partial, or deposit
    pub kind: PaymentKind,
    /// Percentage of the order total, recorded for partial payments
    pub percentage: Option<Decimal>,
    /// Channel sub-record, always matching `method`
    pub details: MethodDetails,
    /// Free-form channel metadata
    pub provider_data: serde_json::Map<String, serde_json::Value>,
    /// Who created this attempt
    pub created_by: Actor,
    /// Set once, when `Processing` is first entered
    pub processed_at: Option<DateTime<Utc>>,
    /// Set once, when `Completed` is first entered
    pub completed_at: Option<DateTime<Utc>>,
    /// Set once, when `Failed` is first entered
    pub failed_at: Option<DateTime<Utc>>,
    /// Set once, when `Cancelled` is first entered
    pub cancelled_at: Option<DateTime<Utc>>,
    /// Set once, when `Refunded` is first entered
    pub refunded_at: Option<DateTime<Utc>>,
    /// Append-only; used for postmortem, never for control flow
    pub error_log: Vec<ErrorLogEntry>,
    /// Transition audit trail
    pub transition_log: Vec<TransitionEntry>,
    /// Optimistic concurrency counter, bumped by the store on update
    pub version: u64,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl Payment {
    /// Creates a new pending payment
    ///
    /// The method is taken from the details union so the two can never
    /// disagree.
    pub fn new(
        order_id: OrderId,
        amount: Money,
        details: MethodDetails,
        timing: PaymentTiming,
        kind: PaymentKind,
        percentage: Option<Decimal>,
        created_by: Actor,
    ) -> Self {
        let now = Utc::now();
        let method = details.method();

        Self {
            id: PaymentId::new_v7(),
            order_id,
            amount,
            method,
            status: PaymentStatus::Pending,
            timing,
            kind,
            percentage,
            details,
            provider_data: serde_json::Map::new(),
            created_by,
            processed_at: None,
            completed_at: None,
            failed_at: None,
            cancelled_at: None,
            refunded_at: None,
            error_log: Vec::new(),
            transition_log: Vec::new(),
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies a status transition, enforcing the transition table
    ///
    /// On an illegal transition nothing is applied and no timestamp field
    /// is touched. On success the matching timestamp is stamped on first
    /// entry and the actor is recorded in the transition trail.
    pub fn transition_to(
        &mut self,
        target: PaymentStatus,
        actor: Actor,
    ) -> Result<(), PaymentError> {
        if !self.status.can_transition_to(target) {
            return Err(PaymentError::InvalidTransition {
                from: self.status.to_string(),
                to: target.to_string(),
            });
        }

        let now = Utc::now();
        let stamp = match target {
            PaymentStatus::Processing => &mut self.processed_at,
            PaymentStatus::Completed => &mut self.completed_at,
            PaymentStatus::Failed => &mut self.failed_at,
            PaymentStatus::Cancelled => &mut self.cancelled_at,
            PaymentStatus::Refunded => &mut self.refunded_at,
            PaymentStatus::Pending => unreachable!("no transition re-enters pending"),
        };
        if stamp.is_none() {
            *stamp = Some(now);
        }

        self.status = target;
        self.updated_at = now;
        self.transition_log.push(TransitionEntry {
            status: target,
            actor,
            at: now,
        });
        Ok(())
    }

    /// Appends to the error log; previous entries are never overwritten
    pub fn log_error(&mut self, message: impl Into<String>, context: Option<String>) {
        self.error_log.push(ErrorLogEntry {
            message: message.into(),
            context,
            logged_at: Utc::now(),
        });
        self.updated_at = Utc::now();
    }

    /// Merges channel metadata into the free-form provider blob
    pub fn merge_provider_data(
        &mut self,
        data: serde_json::Map<String, serde_json::Value>,
    ) {
        for (key, value) in data {
            self.provider_data.insert(key, value);
        }
    }

    /// The slice of this payment the order settlement view needs
    pub fn summary(&self) -> PaymentSummary {
        let progress = match self.status {
            PaymentStatus::Pending | PaymentStatus::Processing => PaymentProgress::Open,
            PaymentStatus::Completed => PaymentProgress::Settled,
            PaymentStatus::Failed | PaymentStatus::Cancelled | PaymentStatus::Refunded => {
                PaymentProgress::Closed
            }
        };
        PaymentSummary {
            method: self.method,
            amount: self.amount,
            progress,
            created_at: self.created_at,
        }
    }
}
