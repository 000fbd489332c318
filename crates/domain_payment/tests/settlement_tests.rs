//! End-to-end settlement scenarios
//!
//! These tests drive the processor across all three channels against
//! in-memory stores: partial gateway payment plus cash remainder, transfer
//! proof verification, webhook idempotency, and access control.

use std::sync::Arc;

use rust_decimal_macros::dec;
use serde_json::json;

use core_kernel::{Actor, Currency, CustomerId, Money, StaffId};
use domain_order::ports::mock::MockOrderStore;
use domain_order::{Order, OrderStatus, OrderStore, PaymentMethod, SettlementStatus};
use domain_payment::ports::mock::{MockBlobStore, MockPaymentStore, RecordingNotifier};
use domain_payment::webhook::compute_signature;
use domain_payment::{
    BankTransferConfig, BankTransferProvider, CashConfirmation, CashProvider, Confirmation,
    FileUpload, GatewayConfig, GatewayProvider, HttpGatewayClient, PaymentError, PaymentKind,
    PaymentProcessor, PaymentRequest, PaymentStatus, PaymentTiming, ProcessRequest,
    TargetAccount, TransferVerdict, WebhookEvent,
};

const WEBHOOK_SECRET: &str = "whsec_settlement_tests";

struct Harness {
    processor: PaymentProcessor,
    orders: Arc<MockOrderStore>,
    notifier: Arc<RecordingNotifier>,
    customer: CustomerId,
    order_id: core_kernel::OrderId,
}

/// Builds a processor over mock ports with a quoted order of the given total
async fn harness(total: rust_decimal::Decimal) -> Harness {
    let customer = CustomerId::new();
    let mut order = Order::new(customer, Money::new(total, Currency::USD));
    order
        .update_status(OrderStatus::PendingApproval, Actor::Customer(customer), None)
        .unwrap();
    order
        .update_status(OrderStatus::Quoted, Actor::System, None)
        .unwrap();
    let order_id = order.id;

    let orders = Arc::new(MockOrderStore::with_orders(vec![order]).await);
    let payments = Arc::new(MockPaymentStore::new());
    let notifier = Arc::new(RecordingNotifier::new());

    // Simulated gateway: no network, webhook secret still enforced
    let gateway_config = GatewayConfig {
        webhook_secret: Some(WEBHOOK_SECRET.to_string()),
        simulate: true,
        ..Default::default()
    };
    let client = Arc::new(HttpGatewayClient::new(&gateway_config).unwrap());
    let gateway = Arc::new(GatewayProvider::new(gateway_config, client));

    let bank = Arc::new(BankTransferProvider::new(
        BankTransferConfig::new(vec![TargetAccount {
            bank_name: "First Print Bank".to_string(),
            account_number: "000123456".to_string(),
            account_holder: "PrintForge SAS".to_string(),
        }]),
        Arc::new(MockBlobStore::new()),
        notifier.clone(),
    ));

    let processor = PaymentProcessor::new(
        orders.clone(),
        payments,
        gateway,
        Arc::new(CashProvider::new()),
        bank,
        notifier.clone(),
    );

    Harness {
        processor,
        orders,
        notifier,
        customer,
        order_id,
    }
}

fn gateway_request(percentage: rust_decimal::Decimal) -> PaymentRequest {
    PaymentRequest {
        method: PaymentMethod::Gateway,
        amount: None,
        percentage: Some(percentage),
        kind: PaymentKind::Partial,
        timing: PaymentTiming::Advance,
        channel: ProcessRequest::default(),
    }
}

fn cash_request(amount: rust_decimal::Decimal) -> PaymentRequest {
    PaymentRequest {
        method: PaymentMethod::Cash,
        amount: Some(amount),
        percentage: None,
        kind: PaymentKind::Partial,
        timing: PaymentTiming::OnDelivery,
        channel: ProcessRequest::default(),
    }
}

fn transfer_request(amount: rust_decimal::Decimal) -> PaymentRequest {
    PaymentRequest {
        method: PaymentMethod::BankTransfer,
        amount: Some(amount),
        percentage: None,
        kind: PaymentKind::Full,
        timing: PaymentTiming::Advance,
        channel: ProcessRequest::default(),
    }
}

fn signed_webhook(payment_id: core_kernel::PaymentId, status: &str) -> WebhookEvent {
    let data = json!({
        "payment_id": payment_id.to_string(),
        "status": status,
        "transaction_id": "txn-001",
        "card_summary": "VISA **** 4242",
    });
    let timestamp = chrono::Utc::now().timestamp();
    WebhookEvent {
        signature: compute_signature(WEBHOOK_SECRET, timestamp, &data),
        timestamp,
        data,
    }
}

#[tokio::test]
async fn scenario_a_partial_gateway_payment() {
    let h = harness(dec!(100)).await;

    // 30% partial gateway payment computes 30.00 and stays processing
    let receipt = h
        .processor
        .process_payment(h.order_id, gateway_request(dec!(30)), Actor::Customer(h.customer))
        .await
        .unwrap();

    assert_eq!(receipt.amount.amount(), dec!(30.00));
    assert_eq!(receipt.status, PaymentStatus::Processing);

    // Webhook approval settles the payment
    h.processor
        .handle_gateway_webhook(signed_webhook(receipt.payment_id, "APPROVED"))
        .await
        .unwrap();

    let order = h.orders.get_order(h.order_id).await.unwrap();
    assert_eq!(order.settlement.total_paid.amount(), dec!(30));
    assert_eq!(order.settlement.balance.amount(), dec!(70));
    // Not yet fully paid
    assert_eq!(order.settlement.status, SettlementStatus::Processing);
    assert_eq!(order.status, OrderStatus::Quoted);
}

#[tokio::test]
async fn scenario_b_cash_remainder_completes_and_promotes() {
    let h = harness(dec!(100)).await;

    let gateway = h
        .processor
        .process_payment(h.order_id, gateway_request(dec!(30)), Actor::Customer(h.customer))
        .await
        .unwrap();
    h.processor
        .handle_gateway_webhook(signed_webhook(gateway.payment_id, "APPROVED"))
        .await
        .unwrap();

    // Remaining 70 in cash; customer hands over a 100 bill
    let cash = h
        .processor
        .process_payment(h.order_id, cash_request(dec!(70)), Actor::Customer(h.customer))
        .await
        .unwrap();

    let staff = Actor::Staff(StaffId::new());
    let confirmed = h
        .processor
        .confirm_payment(
            cash.payment_id,
            Confirmation::Cash(CashConfirmation {
                received_amount: dec!(100),
                collected_by: Some("courier-7".to_string()),
                collection_location: None,
            }),
            staff,
        )
        .await
        .unwrap();
    assert_eq!(confirmed.status, PaymentStatus::Completed);

    let status = h
        .processor
        .order_payment_status(h.order_id, staff)
        .await
        .unwrap();
    let cash_payment = status
        .payments
        .iter()
        .find(|p| p.id == cash.payment_id)
        .unwrap();
    match &cash_payment.details {
        domain_payment::MethodDetails::Cash(d) => {
            assert_eq!(d.change_given.unwrap().amount(), dec!(30));
        }
        _ => panic!("wrong details variant"),
    }

    let order = h.orders.get_order(h.order_id).await.unwrap();
    assert_eq!(order.settlement.total_paid.amount(), dec!(100));
    assert!(order.settlement.balance.is_zero());
    assert_eq!(order.settlement.status, SettlementStatus::Completed);

    // Quoted order auto-promotes with a history entry
    assert_eq!(order.status, OrderStatus::Approved);
    let last = order.status_history.last().unwrap();
    assert_eq!(last.changed_by, Actor::System);
    assert!(last.note.as_deref().unwrap().contains("automatically"));

    assert!(h
        .notifier
        .event_names()
        .await
        .contains(&"payment.completed".to_string()));
}

#[tokio::test]
async fn scenario_c_rejected_transfer_fails_without_credit() {
    let h = harness(dec!(100)).await;

    let receipt = h
        .processor
        .process_payment(h.order_id, transfer_request(dec!(100)), Actor::Customer(h.customer))
        .await
        .unwrap();
    assert_eq!(receipt.status, PaymentStatus::Pending);

    // Customer submits proof, payment moves to processing
    let proof = h
        .processor
        .submit_transfer_proof(
            receipt.payment_id,
            FileUpload {
                filename: "receipt.jpg".to_string(),
                content_type: "image/jpeg".to_string(),
                bytes: vec![0xff, 0xd8],
            },
            Actor::Customer(h.customer),
        )
        .await
        .unwrap();
    assert_eq!(proof.status, PaymentStatus::Processing);

    // Staff rejects
    let staff = Actor::Staff(StaffId::new());
    let rejected = h
        .processor
        .confirm_payment(
            receipt.payment_id,
            Confirmation::BankTransfer(TransferVerdict {
                approved: false,
                rejection_reason: Some("amount does not match".to_string()),
            }),
            staff,
        )
        .await
        .unwrap();
    assert_eq!(rejected.status, PaymentStatus::Failed);

    let status = h
        .processor
        .order_payment_status(h.order_id, staff)
        .await
        .unwrap();
    let payment = &status.payments[0];
    match &payment.details {
        domain_payment::MethodDetails::BankTransfer(d) => {
            assert_eq!(d.rejection_reason.as_deref(), Some("amount does not match"));
        }
        _ => panic!("wrong details variant"),
    }
    assert!(!payment.error_log.is_empty());

    let order = h.orders.get_order(h.order_id).await.unwrap();
    assert!(order.settlement.total_paid.is_zero());
}

#[tokio::test]
async fn double_webhook_is_rejected_not_reapplied() {
    let h = harness(dec!(100)).await;

    let receipt = h
        .processor
        .process_payment(h.order_id, gateway_request(dec!(30)), Actor::Customer(h.customer))
        .await
        .unwrap();

    let event = signed_webhook(receipt.payment_id, "APPROVED");
    h.processor
        .handle_gateway_webhook(event.clone())
        .await
        .unwrap();

    // Same payload again: one effective transition, no double credit
    let second = h.processor.handle_gateway_webhook(event).await;
    assert!(matches!(second, Err(PaymentError::InvalidState(_))));

    let order = h.orders.get_order(h.order_id).await.unwrap();
    assert_eq!(order.settlement.total_paid.amount(), dec!(30));
}

#[tokio::test]
async fn tampered_webhook_changes_nothing() {
    let h = harness(dec!(100)).await;

    let receipt = h
        .processor
        .process_payment(h.order_id, gateway_request(dec!(30)), Actor::Customer(h.customer))
        .await
        .unwrap();

    // Signature computed over a DECLINED payload, then flipped to APPROVED
    let mut event = signed_webhook(receipt.payment_id, "DECLINED");
    event.data["status"] = json!("APPROVED");

    let result = h.processor.handle_gateway_webhook(event).await;
    assert!(matches!(result, Err(PaymentError::WebhookRejected(_))));

    let staff = Actor::Staff(StaffId::new());
    let status = h
        .processor
        .order_payment_status(h.order_id, staff)
        .await
        .unwrap();
    assert_eq!(status.payments[0].status, PaymentStatus::Processing);
    assert!(status.settlement.total_paid.is_zero());
}

#[tokio::test]
async fn declined_webhook_fails_the_payment() {
    let h = harness(dec!(100)).await;

    let receipt = h
        .processor
        .process_payment(h.order_id, gateway_request(dec!(50)), Actor::Customer(h.customer))
        .await
        .unwrap();

    h.processor
        .handle_gateway_webhook(signed_webhook(receipt.payment_id, "DECLINED"))
        .await
        .unwrap();

    let staff = Actor::Staff(StaffId::new());
    let status = h
        .processor
        .order_payment_status(h.order_id, staff)
        .await
        .unwrap();
    let payment = &status.payments[0];
    assert_eq!(payment.status, PaymentStatus::Failed);
    assert!(!payment.error_log.is_empty());
    assert!(status.settlement.total_paid.is_zero());
}

#[tokio::test]
async fn order_must_be_in_a_payable_status() {
    let customer = CustomerId::new();
    let order = Order::new(customer, Money::new(dec!(50), Currency::USD));
    let order_id = order.id;

    let h = harness(dec!(100)).await;
    h.orders.save_order(&order).await.unwrap();

    // Draft order rejects payment intents
    let result = h
        .processor
        .process_payment(order_id, cash_request(dec!(50)), Actor::Customer(customer))
        .await;
    assert!(matches!(result, Err(PaymentError::OrderNotPayable(_))));
}

#[tokio::test]
async fn customers_cannot_touch_each_others_orders() {
    let h = harness(dec!(100)).await;
    let stranger = Actor::Customer(CustomerId::new());

    let pay = h
        .processor
        .process_payment(h.order_id, cash_request(dec!(100)), stranger)
        .await;
    assert!(matches!(pay, Err(PaymentError::Forbidden(_))));

    let view = h.processor.order_payment_status(h.order_id, stranger).await;
    assert!(matches!(view, Err(PaymentError::Forbidden(_))));

    // The owner and staff both may read
    assert!(h
        .processor
        .order_payment_status(h.order_id, Actor::Customer(h.customer))
        .await
        .is_ok());
    assert!(h
        .processor
        .order_payment_status(h.order_id, Actor::Staff(StaffId::new()))
        .await
        .is_ok());
}

#[tokio::test]
async fn cancelled_payment_rejects_confirmation() {
    let h = harness(dec!(100)).await;

    let receipt = h
        .processor
        .process_payment(h.order_id, transfer_request(dec!(100)), Actor::Customer(h.customer))
        .await
        .unwrap();

    let cancelled = h
        .processor
        .cancel_payment(receipt.payment_id, "customer changed their mind", Actor::Customer(h.customer))
        .await
        .unwrap();
    assert_eq!(cancelled.status, PaymentStatus::Cancelled);

    let result = h
        .processor
        .confirm_payment(
            receipt.payment_id,
            Confirmation::BankTransfer(TransferVerdict {
                approved: true,
                rejection_reason: None,
            }),
            Actor::Staff(StaffId::new()),
        )
        .await;
    assert!(matches!(result, Err(PaymentError::InvalidState(_))));
}

#[tokio::test]
async fn refund_reverses_credit_and_is_staff_only() {
    let h = harness(dec!(100)).await;

    let receipt = h
        .processor
        .process_payment(h.order_id, cash_request(dec!(100)), Actor::Customer(h.customer))
        .await
        .unwrap();
    h.processor
        .confirm_payment(
            receipt.payment_id,
            Confirmation::Cash(CashConfirmation {
                received_amount: dec!(100),
                collected_by: None,
                collection_location: None,
            }),
            Actor::Staff(StaffId::new()),
        )
        .await
        .unwrap();

    let order = h.orders.get_order(h.order_id).await.unwrap();
    assert_eq!(order.settlement.total_paid.amount(), dec!(100));

    // Customers cannot refund
    let denied = h
        .processor
        .refund_payment(receipt.payment_id, "nope", Actor::Customer(h.customer))
        .await;
    assert!(matches!(denied, Err(PaymentError::Forbidden(_))));

    let refunded = h
        .processor
        .refund_payment(receipt.payment_id, "defective print", Actor::Staff(StaffId::new()))
        .await
        .unwrap();
    assert_eq!(refunded.status, PaymentStatus::Refunded);

    let order = h.orders.get_order(h.order_id).await.unwrap();
    assert!(order.settlement.total_paid.is_zero());
    assert_eq!(order.settlement.balance.amount(), dec!(100));
}

#[tokio::test]
async fn amount_and_percentage_are_mutually_exclusive() {
    let h = harness(dec!(100)).await;

    let both = PaymentRequest {
        amount: Some(dec!(50)),
        percentage: Some(dec!(50)),
        ..cash_request(dec!(50))
    };
    let result = h
        .processor
        .process_payment(h.order_id, both, Actor::Customer(h.customer))
        .await;
    assert!(matches!(result, Err(PaymentError::Validation(_))));

    let neither = PaymentRequest {
        amount: None,
        percentage: None,
        ..cash_request(dec!(50))
    };
    let result = h
        .processor
        .process_payment(h.order_id, neither, Actor::Customer(h.customer))
        .await;
    assert!(matches!(result, Err(PaymentError::Validation(_))));

    let out_of_range = PaymentRequest {
        amount: None,
        percentage: Some(dec!(101)),
        ..cash_request(dec!(50))
    };
    let result = h
        .processor
        .process_payment(h.order_id, out_of_range, Actor::Customer(h.customer))
        .await;
    assert!(matches!(result, Err(PaymentError::Validation(_))));
}

#[tokio::test]
async fn only_the_payer_may_submit_proof() {
    let h = harness(dec!(100)).await;

    let receipt = h
        .processor
        .process_payment(h.order_id, transfer_request(dec!(100)), Actor::Customer(h.customer))
        .await
        .unwrap();

    let upload = FileUpload {
        filename: "receipt.jpg".to_string(),
        content_type: "image/jpeg".to_string(),
        bytes: vec![1],
    };

    // Staff are not the payer
    let staff_attempt = h
        .processor
        .submit_transfer_proof(receipt.payment_id, upload.clone(), Actor::Staff(StaffId::new()))
        .await;
    assert!(matches!(staff_attempt, Err(PaymentError::Forbidden(_))));

    let stranger = h
        .processor
        .submit_transfer_proof(receipt.payment_id, upload.clone(), Actor::Customer(CustomerId::new()))
        .await;
    assert!(matches!(stranger, Err(PaymentError::Forbidden(_))));

    assert!(h
        .processor
        .submit_transfer_proof(receipt.payment_id, upload, Actor::Customer(h.customer))
        .await
        .is_ok());
}

#[tokio::test]
async fn settlement_view_tracks_every_mutation() {
    let h = harness(dec!(100)).await;
    let staff = Actor::Staff(StaffId::new());

    // Open attempt: processing, nothing credited
    let first = h
        .processor
        .process_payment(h.order_id, transfer_request(dec!(100)), Actor::Customer(h.customer))
        .await
        .unwrap();
    let order = h.orders.get_order(h.order_id).await.unwrap();
    assert_eq!(order.settlement.status, SettlementStatus::Processing);
    assert_eq!(order.settlement.method, Some(PaymentMethod::BankTransfer));

    // Cancelled attempt: back to pending, still nothing credited
    h.processor
        .cancel_payment(first.payment_id, "retrying with cash", Actor::Customer(h.customer))
        .await
        .unwrap();
    let order = h.orders.get_order(h.order_id).await.unwrap();
    assert_eq!(order.settlement.status, SettlementStatus::Pending);

    // Cash settles the whole total
    let second = h
        .processor
        .process_payment(h.order_id, cash_request(dec!(100)), Actor::Customer(h.customer))
        .await
        .unwrap();
    h.processor
        .confirm_payment(
            second.payment_id,
            Confirmation::Cash(CashConfirmation {
                received_amount: dec!(100),
                collected_by: None,
                collection_location: None,
            }),
            staff,
        )
        .await
        .unwrap();

    let status = h.processor.order_payment_status(h.order_id, staff).await.unwrap();
    assert_eq!(status.settlement.status, SettlementStatus::Completed);
    assert_eq!(status.settlement.method, Some(PaymentMethod::Cash));
    assert_eq!(status.payments.len(), 2);
}
