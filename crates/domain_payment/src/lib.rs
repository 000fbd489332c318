//! Payment Settlement Domain
//!
//! This crate is the core of the settlement subsystem. It accepts a payment
//! intent for an order, dispatches it to the correct provider strategy,
//! tracks the payment through its status lifecycle, reconciles partial and
//! advance payments against the order's outstanding balance, and promotes
//! the order when settlement completes.
//!
//! # Settlement channels
//!
//! Three incompatible protocols sit behind one [`provider::ProviderStrategy`]
//! contract:
//!
//! - **Gateway**: online card flow: redirect link out, webhook (or manual
//!   check) back. Degrades to a clearly-flagged simulated path when the
//!   external service is unreachable, favoring checkout availability.
//! - **Cash**: in-person receipt: no external call, a single confirm step
//!   with under/over-payment guards and change computation.
//! - **Bank transfer**: document-evidenced: instructions out, customer
//!   proof upload, staff verification in.
//!
//! # Correctness
//!
//! The [`payment::Payment`] record enforces its own transition table, so no
//! caller can double-apply a confirmation. Confirm and cancel go through a
//! per-record optimistic version check, serializing racing webhook and admin
//! actions. The order's settlement view is rebuilt from the full payment set
//! after every mutation, never patched.

pub mod payment;
pub mod error;
pub mod ports;
pub mod provider;
pub mod webhook;
pub mod processor;

pub use payment::{
    CashDetails, ErrorLogEntry, GatewayDetails, MethodDetails, Payment, PaymentKind,
    PaymentStatus, PaymentTiming, TargetAccount, TransferDetails, TransitionEntry,
};
pub use error::PaymentError;
pub use ports::{BlobStore, FileUpload, LoggingNotifier, Notifier, NotificationEvent, PaymentStore};
pub use provider::{
    CashConfirmation, ChannelResponse, Confirmation, ConfirmOutcome, GatewayConfirmation,
    ProcessOutcome, ProcessRequest, ProviderRegistry, ProviderStrategy, TransferVerdict,
};
pub use provider::gateway::{GatewayClient, GatewayConfig, GatewayProvider, HttpGatewayClient};
pub use provider::cash::CashProvider;
pub use provider::bank_transfer::{BankTransferConfig, BankTransferProvider};
pub use webhook::WebhookEvent;
pub use processor::{OrderPaymentStatus, PaymentProcessor, PaymentReceipt, PaymentRequest};
