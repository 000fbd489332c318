//! Bank-transfer provider
//!
//! Manual, document-evidenced settlement. `process` hands the customer a
//! unique reference and the target accounts and leaves the payment pending.
//! The payer attaches a proof-of-transfer document exactly once, which moves
//! the payment into processing ("awaiting staff verification"). Staff then
//! approve or reject on `confirm`. A rejected transfer terminates the
//! attempt; paying again requires a new payment record.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;

use core_kernel::Actor;
use domain_order::{Order, PaymentMethod};

use crate::error::PaymentError;
use crate::payment::{MethodDetails, Payment, PaymentStatus, TargetAccount, TransferDetails};
use crate::ports::{BlobStore, FileUpload, Notifier, NotificationEvent};
use crate::provider::{
    ensure_open, generate_reference, CancelOutcome, ChannelResponse, Confirmation,
    ConfirmOutcome, ProcessOutcome, ProcessRequest, ProviderStrategy,
};

/// Folder in the blob store for proof documents
const PROOF_FOLDER: &str = "transfer-proofs";

/// Bank-transfer provider configuration
#[derive(Debug, Clone)]
pub struct BankTransferConfig {
    /// Accounts the customer may transfer into
    pub target_accounts: Vec<TargetAccount>,
}

impl BankTransferConfig {
    pub fn new(target_accounts: Vec<TargetAccount>) -> Self {
        Self { target_accounts }
    }
}

/// Bank-transfer provider
pub struct BankTransferProvider {
    config: BankTransferConfig,
    blobs: Arc<dyn BlobStore>,
    notifier: Arc<dyn Notifier>,
}

impl BankTransferProvider {
    pub fn new(
        config: BankTransferConfig,
        blobs: Arc<dyn BlobStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            config,
            blobs,
            notifier,
        }
    }

    fn transfer_details(payment: &Payment) -> Result<&TransferDetails, PaymentError> {
        match &payment.details {
            MethodDetails::BankTransfer(details) => Ok(details),
            _ => Err(PaymentError::Validation(format!(
                "payment {} is not a bank-transfer payment",
                payment.id
            ))),
        }
    }

    /// Attaches the payer's proof document
    ///
    /// Legal only while the payment is pending and no proof has been
    /// supplied in this confirm cycle. Returns the updated sub-record; the
    /// processor owns the `Pending -> Processing` transition and persist.
    pub async fn attach_proof(
        &self,
        payment: &Payment,
        upload: &FileUpload,
    ) -> Result<TransferDetails, PaymentError> {
        let details = Self::transfer_details(payment)?;

        if payment.status != PaymentStatus::Pending {
            return Err(PaymentError::InvalidState(format!(
                "proof can only be submitted while the payment is pending, not {}",
                payment.status
            )));
        }
        if details.proof_url.is_some() {
            return Err(PaymentError::InvalidState(
                "a proof document was already submitted for this payment".to_string(),
            ));
        }

        let url = self.blobs.upload(upload, PROOF_FOLDER).await.map_err(
            // Storage being down is an infrastructure failure, not a
            // business outcome; it propagates
            PaymentError::from,
        )?;

        let mut updated = details.clone();
        updated.proof_url = Some(url);
        updated.proof_submitted_at = Some(Utc::now());
        Ok(updated)
    }

    async fn notify(&self, event: NotificationEvent) {
        // Fire-and-forget: notification failure never blocks settlement
        if let Err(err) = self.notifier.send(event).await {
            tracing::warn!(error = %err, "transfer notification failed");
        }
    }

    fn instructions(&self, reference: &str) -> String {
        format!(
            "Transfer the exact amount quoting reference {} and upload the receipt to finish your payment.",
            reference
        )
    }
}

#[async_trait]
impl ProviderStrategy for BankTransferProvider {
    fn method(&self) -> PaymentMethod {
        PaymentMethod::BankTransfer
    }

    async fn process(
        &self,
        payment: &Payment,
        order: &Order,
        _request: &ProcessRequest,
    ) -> Result<ProcessOutcome, PaymentError> {
        let reference = generate_reference("TRF");
        let details = TransferDetails::new(reference.clone(), self.config.target_accounts.clone());

        self.notify(
            NotificationEvent::new("payment.instructions", order.id)
                .for_payment(payment.id)
                .with_payload(json!({
                    "reference": reference,
                    "amount": payment.amount,
                    "accounts": self.config.target_accounts,
                })),
        )
        .await;

        Ok(ProcessOutcome {
            status: PaymentStatus::Pending,
            details: MethodDetails::BankTransfer(details),
            provider_data: serde_json::Map::new(),
            response: ChannelResponse::BankTransfer {
                reference: reference.clone(),
                target_accounts: self.config.target_accounts.clone(),
                instructions: self.instructions(&reference),
            },
        })
    }

    async fn confirm(
        &self,
        payment: &Payment,
        confirmation: &Confirmation,
        actor: &Actor,
    ) -> Result<ConfirmOutcome, PaymentError> {
        ensure_open(payment)?;

        let Confirmation::BankTransfer(verdict) = confirmation else {
            return Err(PaymentError::Validation(
                "bank-transfer payment requires a transfer verdict".to_string(),
            ));
        };

        let Actor::Staff(staff_id) = actor else {
            return Err(PaymentError::Forbidden(
                "only staff may verify bank transfers".to_string(),
            ));
        };

        // Verification applies to a submitted proof, not a bare reference
        if payment.status != PaymentStatus::Processing {
            return Err(PaymentError::InvalidState(format!(
                "transfer verification requires a submitted proof; payment is {}",
                payment.status
            )));
        }

        let mut details = Self::transfer_details(payment)?.clone();
        details.verified_by = Some(*staff_id);

        if verdict.approved {
            Ok(ConfirmOutcome {
                status: PaymentStatus::Completed,
                details: MethodDetails::BankTransfer(details),
                provider_data: serde_json::Map::new(),
                failure_reason: None,
            })
        } else {
            let reason = verdict
                .rejection_reason
                .clone()
                .unwrap_or_else(|| "transfer proof rejected".to_string());
            details.rejection_reason = Some(reason.clone());

            Ok(ConfirmOutcome {
                status: PaymentStatus::Failed,
                details: MethodDetails::BankTransfer(details),
                provider_data: serde_json::Map::new(),
                failure_reason: Some(reason),
            })
        }
    }

    async fn cancel(
        &self,
        payment: &Payment,
        reason: &str,
        _actor: &Actor,
    ) -> Result<CancelOutcome, PaymentError> {
        ensure_open(payment)?;

        tracing::info!(payment_id = %payment.id, reason, "bank-transfer payment cancelled");
        Ok(CancelOutcome {
            cancelled_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::{Currency, CustomerId, Money, StaffId};
    use rust_decimal_macros::dec;

    use crate::payment::{PaymentKind, PaymentTiming};
    use crate::ports::mock::{MockBlobStore, RecordingNotifier};
    use crate::provider::TransferVerdict;

    fn accounts() -> Vec<TargetAccount> {
        vec![TargetAccount {
            bank_name: "First Print Bank".to_string(),
            account_number: "000123456".to_string(),
            account_holder: "PrintForge SAS".to_string(),
        }]
    }

    fn provider() -> (BankTransferProvider, Arc<RecordingNotifier>) {
        let notifier = Arc::new(RecordingNotifier::new());
        (
            BankTransferProvider::new(
                BankTransferConfig::new(accounts()),
                Arc::new(MockBlobStore::new()),
                notifier.clone(),
            ),
            notifier,
        )
    }

    fn transfer_payment() -> (Payment, Order) {
        let order = Order::new(CustomerId::new(), Money::new(dec!(100), Currency::USD));
        let payment = Payment::new(
            order.id,
            Money::new(dec!(100), Currency::USD),
            MethodDetails::BankTransfer(TransferDetails::new("TRF-SEED".to_string(), accounts())),
            PaymentTiming::Advance,
            PaymentKind::Full,
            None,
            Actor::Customer(order.customer_id),
        );
        (payment, order)
    }

    fn proof() -> FileUpload {
        FileUpload {
            filename: "receipt.pdf".to_string(),
            content_type: "application/pdf".to_string(),
            bytes: vec![1, 2, 3],
        }
    }

    #[tokio::test]
    async fn test_process_returns_pending_with_instructions() {
        let (provider, notifier) = provider();
        let (payment, order) = transfer_payment();

        let outcome = provider
            .process(&payment, &order, &ProcessRequest::default())
            .await
            .unwrap();

        assert_eq!(outcome.status, PaymentStatus::Pending);
        match &outcome.response {
            ChannelResponse::BankTransfer { reference, target_accounts, .. } => {
                assert!(reference.starts_with("TRF-"));
                assert_eq!(target_accounts.len(), 1);
            }
            _ => panic!("wrong response variant"),
        }
        assert_eq!(notifier.event_names().await, vec!["payment.instructions"]);
    }

    #[tokio::test]
    async fn test_attach_proof_once() {
        let (provider, _) = provider();
        let (mut payment, _order) = transfer_payment();

        let details = provider.attach_proof(&payment, &proof()).await.unwrap();
        assert!(details.proof_url.is_some());
        assert!(details.proof_submitted_at.is_some());

        // Second submission in the same cycle is refused
        payment.details = MethodDetails::BankTransfer(details);
        let second = provider.attach_proof(&payment, &proof()).await;
        assert!(matches!(second, Err(PaymentError::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_attach_proof_requires_pending() {
        let (provider, _) = provider();
        let (mut payment, _order) = transfer_payment();
        payment.transition_to(PaymentStatus::Processing, Actor::System).unwrap();

        let result = provider.attach_proof(&payment, &proof()).await;
        assert!(matches!(result, Err(PaymentError::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_staff_approval_completes() {
        let (provider, _) = provider();
        let (mut payment, _order) = transfer_payment();
        payment.transition_to(PaymentStatus::Processing, Actor::System).unwrap();

        let staff = StaffId::new();
        let outcome = provider
            .confirm(
                &payment,
                &Confirmation::BankTransfer(TransferVerdict {
                    approved: true,
                    rejection_reason: None,
                }),
                &Actor::Staff(staff),
            )
            .await
            .unwrap();

        assert_eq!(outcome.status, PaymentStatus::Completed);
        match outcome.details {
            MethodDetails::BankTransfer(d) => assert_eq!(d.verified_by, Some(staff)),
            _ => panic!("wrong details variant"),
        }
    }

    #[tokio::test]
    async fn test_staff_rejection_fails_with_reason() {
        let (provider, _) = provider();
        let (mut payment, _order) = transfer_payment();
        payment.transition_to(PaymentStatus::Processing, Actor::System).unwrap();

        let outcome = provider
            .confirm(
                &payment,
                &Confirmation::BankTransfer(TransferVerdict {
                    approved: false,
                    rejection_reason: Some("amount does not match".to_string()),
                }),
                &Actor::Staff(StaffId::new()),
            )
            .await
            .unwrap();

        assert_eq!(outcome.status, PaymentStatus::Failed);
        assert_eq!(outcome.failure_reason.as_deref(), Some("amount does not match"));
        match outcome.details {
            MethodDetails::BankTransfer(d) => {
                assert_eq!(d.rejection_reason.as_deref(), Some("amount does not match"));
            }
            _ => panic!("wrong details variant"),
        }
    }

    #[tokio::test]
    async fn test_non_staff_cannot_verify() {
        let (provider, _) = provider();
        let (mut payment, _order) = transfer_payment();
        payment.transition_to(PaymentStatus::Processing, Actor::System).unwrap();

        let result = provider
            .confirm(
                &payment,
                &Confirmation::BankTransfer(TransferVerdict {
                    approved: true,
                    rejection_reason: None,
                }),
                &Actor::Customer(CustomerId::new()),
            )
            .await;

        assert!(matches!(result, Err(PaymentError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_confirm_without_proof_rejected() {
        let (provider, _) = provider();
        let (payment, _order) = transfer_payment();

        // Still pending: no proof submitted yet
        let result = provider
            .confirm(
                &payment,
                &Confirmation::BankTransfer(TransferVerdict {
                    approved: true,
                    rejection_reason: None,
                }),
                &Actor::Staff(StaffId::new()),
            )
            .await;

        assert!(matches!(result, Err(PaymentError::InvalidState(_))));
    }
}
