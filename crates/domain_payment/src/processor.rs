//! Payment processor
//!
//! The orchestrator behind every settlement operation: resolves the provider
//! for a method, creates and mutates payment records, keeps the parent
//! order's settlement view consistent, and promotes the order when full
//! payment lands.
//!
//! Concurrency model: every external trigger (checkout call, webhook
//! delivery, staff click) is an independent short-lived invocation. The
//! payment record is the unit of mutual exclusion: confirm/cancel run a
//! read-modify-write guarded by the store's version check, so of two racing
//! confirmations exactly one wins. The settlement view is rebuilt from a
//! fresh payment query inside each mutation, never from a list read earlier
//! in the same operation.

use std::sync::Arc;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use serde_json::json;

use core_kernel::{Actor, Money, OrderId, PaymentId, Rate};
use domain_order::{Order, OrderStatus, OrderStore, PaymentMethod, SettlementView};

use crate::error::PaymentError;
use crate::payment::{
    CashDetails, GatewayDetails, MethodDetails, Payment, PaymentKind, PaymentStatus,
    PaymentTiming, TransferDetails,
};
use crate::ports::{FileUpload, Notifier, NotificationEvent, PaymentStore};
use crate::provider::{
    bank_transfer::BankTransferProvider, cash::CashProvider, gateway::GatewayProvider,
    ChannelResponse, Confirmation, GatewayConfirmation, ProcessRequest, ProviderRegistry,
};
use crate::webhook::{self, WebhookEvent};

/// A payment intent from checkout or the admin surface
#[derive(Debug, Clone)]
pub struct PaymentRequest {
    pub method: PaymentMethod,
    /// Explicit amount; mutually exclusive with `percentage`
    pub amount: Option<Decimal>,
    /// Percentage of the order total (1-100), for partial payments
    pub percentage: Option<Decimal>,
    pub kind: PaymentKind,
    pub timing: PaymentTiming,
    /// Channel-specific inputs
    pub channel: ProcessRequest,
}

/// JSON-serializable result of a processor operation
#[derive(Debug, Clone, Serialize)]
pub struct PaymentReceipt {
    pub success: bool,
    pub payment_id: PaymentId,
    pub order_id: OrderId,
    pub status: PaymentStatus,
    pub amount: Money,
    /// Channel-specific payload (redirect URL, instructions, receipt code)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<ChannelResponse>,
}

impl PaymentReceipt {
    fn from_payment(payment: &Payment, response: Option<ChannelResponse>) -> Self {
        Self {
            success: true,
            payment_id: payment.id,
            order_id: payment.order_id,
            status: payment.status,
            amount: payment.amount,
            response,
        }
    }
}

/// Read-only view of an order's payment history and derived settlement
#[derive(Debug, Clone, Serialize)]
pub struct OrderPaymentStatus {
    pub order_id: OrderId,
    pub order_status: OrderStatus,
    pub settlement: SettlementView,
    pub payments: Vec<Payment>,
}

/// Orchestrates payment settlement across the provider strategies
pub struct PaymentProcessor {
    orders: Arc<dyn OrderStore>,
    payments: Arc<dyn PaymentStore>,
    providers: ProviderRegistry,
    gateway: Arc<GatewayProvider>,
    bank_transfer: Arc<BankTransferProvider>,
    notifier: Arc<dyn Notifier>,
}

impl PaymentProcessor {
    /// Builds the processor and its provider registry once at startup
    pub fn new(
        orders: Arc<dyn OrderStore>,
        payments: Arc<dyn PaymentStore>,
        gateway: Arc<GatewayProvider>,
        cash: Arc<CashProvider>,
        bank_transfer: Arc<BankTransferProvider>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let providers = ProviderRegistry::new()
            .register(gateway.clone())
            .register(cash)
            .register(bank_transfer.clone());

        Self {
            orders,
            payments,
            providers,
            gateway,
            bank_transfer,
            notifier,
        }
    }

    /// Accepts a payment intent for an order
    ///
    /// Validates order eligibility, computes the amount, creates the payment
    /// record, delegates to the provider, persists the provider result, and
    /// recomputes the order's settlement view.
    pub async fn process_payment(
        &self,
        order_id: OrderId,
        request: PaymentRequest,
        actor: Actor,
    ) -> Result<PaymentReceipt, PaymentError> {
        // Unknown method fails before any record exists
        let provider = self.providers.resolve(request.method)?;

        let order = self.orders.get_order(order_id).await?;

        if !actor.can_act_for(order.customer_id) {
            return Err(PaymentError::Forbidden(
                "cannot pay another customer's order".to_string(),
            ));
        }
        if !order.accepts_payments() {
            return Err(PaymentError::OrderNotPayable(format!(
                "order {} is {:?}",
                order.order_number, order.status
            )));
        }

        let (amount, percentage) = compute_amount(&order, &request)?;

        let mut payment = Payment::new(
            order_id,
            amount,
            initial_details(request.method, amount),
            request.timing,
            request.kind,
            percentage,
            actor,
        );

        let outcome = provider
            .process(&payment, &order, &request.channel)
            .await?;

        payment.details = outcome.details;
        payment.merge_provider_data(outcome.provider_data);
        if outcome.status != PaymentStatus::Pending {
            payment.transition_to(outcome.status, actor)?;
        }

        self.payments.create_payment(&payment).await?;
        self.sync_settlement(order_id).await?;

        tracing::info!(
            payment_id = %payment.id,
            order_id = %order_id,
            method = %payment.method,
            amount = %payment.amount,
            status = %payment.status,
            "payment created"
        );

        Ok(PaymentReceipt::from_payment(&payment, Some(outcome.response)))
    }

    /// Finalizes a payment after an independent confirmation event
    ///
    /// Webhook, cash receipt, and transfer verification all land here. The
    /// state machine rejects a second confirmation; the versioned write
    /// serializes two racing first confirmations so exactly one wins.
    pub async fn confirm_payment(
        &self,
        payment_id: PaymentId,
        confirmation: Confirmation,
        actor: Actor,
    ) -> Result<PaymentReceipt, PaymentError> {
        let mut payment = self.payments.get_payment(payment_id).await?;
        let loaded_version = payment.version;

        if payment.status.is_terminal() {
            return Err(PaymentError::InvalidState(format!(
                "payment {} is already {}",
                payment.id, payment.status
            )));
        }

        let provider = self.providers.resolve(payment.method)?;
        let outcome = provider.confirm(&payment, &confirmation, &actor).await;

        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(err) => {
                self.record_failure(&payment, loaded_version, &err).await;
                return Err(err);
            }
        };

        payment.transition_to(outcome.status, actor)?;
        payment.details = outcome.details;
        payment.merge_provider_data(outcome.provider_data);
        if let Some(reason) = &outcome.failure_reason {
            payment.log_error(reason.clone(), Some("confirm".to_string()));
        }

        self.payments
            .update_payment(&payment, loaded_version)
            .await?;

        let order = self.sync_settlement(payment.order_id).await?;

        match payment.status {
            PaymentStatus::Completed => {
                self.promote_if_fully_paid(order).await?;
                self.notify(
                    NotificationEvent::new("payment.completed", payment.order_id)
                        .for_payment(payment.id)
                        .with_payload(json!({ "amount": payment.amount })),
                )
                .await;
            }
            PaymentStatus::Failed => {
                self.notify(
                    NotificationEvent::new("payment.failed", payment.order_id)
                        .for_payment(payment.id),
                )
                .await;
            }
            _ => {}
        }

        tracing::info!(
            payment_id = %payment.id,
            order_id = %payment.order_id,
            status = %payment.status,
            "payment confirmed"
        );

        Ok(PaymentReceipt::from_payment(&payment, None))
    }

    /// Aborts a pending or processing payment
    pub async fn cancel_payment(
        &self,
        payment_id: PaymentId,
        reason: &str,
        actor: Actor,
    ) -> Result<PaymentReceipt, PaymentError> {
        let mut payment = self.payments.get_payment(payment_id).await?;
        let loaded_version = payment.version;

        let provider = self.providers.resolve(payment.method)?;
        provider.cancel(&payment, reason, &actor).await?;

        payment.transition_to(PaymentStatus::Cancelled, actor)?;
        payment.log_error(format!("cancelled: {}", reason), Some("cancel".to_string()));

        self.payments
            .update_payment(&payment, loaded_version)
            .await?;
        self.sync_settlement(payment.order_id).await?;

        Ok(PaymentReceipt::from_payment(&payment, None))
    }

    /// Reverses a completed payment (staff only)
    pub async fn refund_payment(
        &self,
        payment_id: PaymentId,
        reason: &str,
        actor: Actor,
    ) -> Result<PaymentReceipt, PaymentError> {
        if !actor.is_staff() {
            return Err(PaymentError::Forbidden(
                "only staff may refund payments".to_string(),
            ));
        }

        let mut payment = self.payments.get_payment(payment_id).await?;
        let loaded_version = payment.version;

        payment.transition_to(PaymentStatus::Refunded, actor)?;
        payment.log_error(format!("refunded: {}", reason), Some("refund".to_string()));

        self.payments
            .update_payment(&payment, loaded_version)
            .await?;
        self.sync_settlement(payment.order_id).await?;

        self.notify(
            NotificationEvent::new("payment.refunded", payment.order_id)
                .for_payment(payment.id),
        )
        .await;

        Ok(PaymentReceipt::from_payment(&payment, None))
    }

    /// Attaches the payer's proof-of-transfer document
    ///
    /// Callable only by the payer; moves the payment from pending to
    /// processing, signaling "awaiting staff verification".
    pub async fn submit_transfer_proof(
        &self,
        payment_id: PaymentId,
        upload: FileUpload,
        actor: Actor,
    ) -> Result<PaymentReceipt, PaymentError> {
        let mut payment = self.payments.get_payment(payment_id).await?;
        let loaded_version = payment.version;

        let order = self.orders.get_order(payment.order_id).await?;
        if actor.customer_id() != Some(order.customer_id) {
            return Err(PaymentError::Forbidden(
                "only the payer may submit a transfer proof".to_string(),
            ));
        }

        let details = self.bank_transfer.attach_proof(&payment, &upload).await?;

        payment.details = MethodDetails::BankTransfer(details);
        payment.transition_to(PaymentStatus::Processing, actor)?;

        self.payments
            .update_payment(&payment, loaded_version)
            .await?;
        self.sync_settlement(payment.order_id).await?;

        self.notify(
            NotificationEvent::new("proof.submitted", payment.order_id)
                .for_payment(payment.id),
        )
        .await;

        Ok(PaymentReceipt::from_payment(&payment, None))
    }

    /// Read-only payment history plus the derived settlement view
    ///
    /// A non-staff actor may only query their own order.
    pub async fn order_payment_status(
        &self,
        order_id: OrderId,
        actor: Actor,
    ) -> Result<OrderPaymentStatus, PaymentError> {
        let order = self.orders.get_order(order_id).await?;

        if !actor.can_act_for(order.customer_id) {
            return Err(PaymentError::Forbidden(
                "cannot view another customer's order".to_string(),
            ));
        }

        let payments = self.payments.find_by_order(order_id).await?;
        let summaries: Vec<_> = payments.iter().map(Payment::summary).collect();

        Ok(OrderPaymentStatus {
            order_id,
            order_status: order.status,
            settlement: SettlementView::recompute(order.total, &summaries),
            payments,
        })
    }

    /// Handles an inbound gateway webhook
    ///
    /// The signature is verified before any payment is loaded; a mismatch or
    /// a missing secret outside development rejects the event outright. On a
    /// valid event this is just a system-actor confirmation.
    pub async fn handle_gateway_webhook(
        &self,
        event: WebhookEvent,
    ) -> Result<PaymentReceipt, PaymentError> {
        match self.gateway.config().webhook_secret.as_deref() {
            Some(secret) => {
                if let Err(err) = webhook::verify_signature(secret, &event) {
                    // No human is waiting on a webhook; log enough context
                    // to replay and debug the event
                    tracing::warn!(
                        signature = %event.signature,
                        timestamp = event.timestamp,
                        payment_id = ?event.data.get("payment_id"),
                        error = %err,
                        "gateway webhook rejected"
                    );
                    return Err(err);
                }
            }
            None if self.gateway.config().simulate => {
                tracing::warn!("accepting unsigned webhook in simulated mode");
            }
            None => {
                return Err(PaymentError::WebhookRejected(
                    "webhook secret not configured".to_string(),
                ));
            }
        }

        let payment_id: PaymentId = event
            .data
            .get("payment_id")
            .and_then(|v| v.as_str())
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| {
                PaymentError::WebhookRejected("payload carries no payment_id".to_string())
            })?;

        let external_status = event
            .data
            .get("status")
            .and_then(|v| v.as_str())
            .ok_or_else(|| PaymentError::WebhookRejected("payload carries no status".to_string()))?
            .to_string();

        let confirmation = Confirmation::Gateway(GatewayConfirmation {
            external_status: Some(external_status),
            transaction_id: event
                .data
                .get("transaction_id")
                .and_then(|v| v.as_str())
                .map(String::from),
            card_summary: event
                .data
                .get("card_summary")
                .and_then(|v| v.as_str())
                .map(String::from),
            processing_fee: event
                .data
                .get("processing_fee")
                .and_then(|v| v.as_str())
                .and_then(|s| s.parse().ok()),
            via_webhook: true,
        });

        self.confirm_payment(payment_id, confirmation, Actor::System)
            .await
    }

    /// Rebuilds the order's settlement view from the full payment set
    ///
    /// The payment set is re-queried here, at write time; a list read
    /// earlier in the operation is never reused, so a concurrently created
    /// payment cannot be dropped from the sum.
    async fn sync_settlement(&self, order_id: OrderId) -> Result<Order, PaymentError> {
        let mut order = self.orders.get_order(order_id).await?;
        let payments = self.payments.find_by_order(order_id).await?;
        let summaries: Vec<_> = payments.iter().map(Payment::summary).collect();

        order.replace_settlement(SettlementView::recompute(order.total, &summaries));
        self.orders.save_order(&order).await?;
        Ok(order)
    }

    /// Auto-advances a quoted order once it is fully paid
    async fn promote_if_fully_paid(&self, mut order: Order) -> Result<(), PaymentError> {
        if order.settlement.is_fully_paid() && order.status == OrderStatus::Quoted {
            order.update_status(
                OrderStatus::Approved,
                Actor::System,
                Some("automatically approved after full payment".to_string()),
            )?;
            self.orders.save_order(&order).await?;

            tracing::info!(
                order_id = %order.id,
                "order auto-approved after full payment"
            );
        }
        Ok(())
    }

    /// Best-effort append to the payment's error log after a failed confirm
    async fn record_failure(&self, payment: &Payment, version: u64, err: &PaymentError) {
        let mut annotated = payment.clone();
        annotated.log_error(err.to_string(), Some("confirm".to_string()));
        if let Err(store_err) = self.payments.update_payment(&annotated, version).await {
            tracing::warn!(
                payment_id = %payment.id,
                error = %store_err,
                "could not append to payment error log"
            );
        }
    }

    async fn notify(&self, event: NotificationEvent) {
        // Fire-and-forget: notification failure never blocks settlement
        if let Err(err) = self.notifier.send(event).await {
            tracing::warn!(error = %err, "notification dispatch failed");
        }
    }
}

/// Computes the payment amount from an explicit amount or a percentage of
/// the order total
fn compute_amount(
    order: &Order,
    request: &PaymentRequest,
) -> Result<(Money, Option<Decimal>), PaymentError> {
    match (request.amount, request.percentage) {
        (Some(_), Some(_)) => Err(PaymentError::Validation(
            "provide either an amount or a percentage, not both".to_string(),
        )),
        (Some(amount), None) => {
            if amount <= dec!(0) {
                return Err(PaymentError::Validation(
                    "amount must be positive".to_string(),
                ));
            }
            Ok((
                Money::new(amount, order.total.currency()).round_to_currency(),
                None,
            ))
        }
        (None, Some(percentage)) => {
            if percentage < dec!(1) || percentage > dec!(100) {
                return Err(PaymentError::Validation(
                    "percentage must be between 1 and 100".to_string(),
                ));
            }
            let amount = Rate::from_percentage(percentage)
                .apply(&order.total)
                .round_to_currency();
            Ok((amount, Some(percentage)))
        }
        (None, None) => Err(PaymentError::Validation(
            "an amount or a percentage is required".to_string(),
        )),
    }
}

/// Placeholder sub-record replaced by the provider's `process` outcome
fn initial_details(method: PaymentMethod, amount: Money) -> MethodDetails {
    match method {
        PaymentMethod::Gateway => MethodDetails::Gateway(GatewayDetails::new(String::new(), false)),
        PaymentMethod::Cash => MethodDetails::Cash(CashDetails::new(amount)),
        PaymentMethod::BankTransfer => {
            MethodDetails::BankTransfer(TransferDetails::new(String::new(), Vec::new()))
        }
    }
}
