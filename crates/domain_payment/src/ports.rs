//! Payment Domain Ports
//!
//! The settlement subsystem consumes four collaborators through traits: the
//! payment store, the order store (defined in `domain_order`), an opaque
//! blob store for proof documents, and a fire-and-forget notifier. Database
//! and external adapters live elsewhere; in-memory mocks live here behind
//! the `mock` feature.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use core_kernel::{DomainPort, OrderId, PaymentId, PortError};

use crate::payment::Payment;

/// Port for payment persistence
///
/// The payment record is the unit of mutual exclusion: `update_payment`
/// applies only when the caller saw the latest version, so two racing
/// confirmations cannot both win a read-modify-write.
#[async_trait]
pub trait PaymentStore: DomainPort {
    /// Persists a newly created payment
    async fn create_payment(&self, payment: &Payment) -> Result<(), PortError>;

    /// Retrieves a payment by ID
    async fn get_payment(&self, id: PaymentId) -> Result<Payment, PortError>;

    /// Updates a payment if its stored version still equals `expected_version`
    ///
    /// The store bumps the version on success. A mismatch returns
    /// `PortError::Conflict` and leaves the stored record untouched.
    async fn update_payment(
        &self,
        payment: &Payment,
        expected_version: u64,
    ) -> Result<(), PortError>;

    /// All payments ever made against an order, oldest first
    ///
    /// Settlement recompute calls this at write time; results are never
    /// cached across a mutation.
    async fn find_by_order(&self, order_id: OrderId) -> Result<Vec<Payment>, PortError>;
}

/// An uploaded file handed to the blob store
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Port for opaque blob storage (proof-of-transfer documents)
#[async_trait]
pub trait BlobStore: DomainPort {
    /// Stores a file and returns its URL
    async fn upload(&self, file: &FileUpload, folder: &str) -> Result<String, PortError>;

    /// Deletes a previously uploaded file
    async fn delete(&self, url: &str) -> Result<(), PortError>;
}

/// An outbound notification event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationEvent {
    /// Event name, e.g. `payment.instructions`, `payment.completed`
    pub name: String,
    pub order_id: OrderId,
    pub payment_id: Option<PaymentId>,
    pub payload: serde_json::Value,
}

impl NotificationEvent {
    pub fn new(name: impl Into<String>, order_id: OrderId) -> Self {
        Self {
            name: name.into(),
            order_id,
            payment_id: None,
            payload: serde_json::Value::Null,
        }
    }

    pub fn for_payment(mut self, payment_id: PaymentId) -> Self {
        self.payment_id = Some(payment_id);
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

/// Port for outbound notifications (email/SMS/WhatsApp behind the scenes)
///
/// Delivery is fire-and-forget: failures are logged by callers and never
/// block settlement.
#[async_trait]
pub trait Notifier: DomainPort {
    async fn send(&self, event: NotificationEvent) -> Result<(), PortError>;
}

/// Notifier that just traces events; the default when no delivery pipeline
/// is wired up
#[derive(Debug, Default, Clone)]
pub struct LoggingNotifier;

impl DomainPort for LoggingNotifier {}

#[async_trait]
impl Notifier for LoggingNotifier {
    async fn send(&self, event: NotificationEvent) -> Result<(), PortError> {
        tracing::info!(
            event = %event.name,
            order_id = %event.order_id,
            payment_id = ?event.payment_id,
            "notification dispatched"
        );
        Ok(())
    }
}

/// In-memory mock implementations for testing
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::RwLock;

    /// In-memory mock implementation of PaymentStore
    #[derive(Debug, Default)]
    pub struct MockPaymentStore {
        payments: Arc<RwLock<HashMap<PaymentId, Payment>>>,
    }

    impl MockPaymentStore {
        /// Creates a new mock store
        pub fn new() -> Self {
            Self::default()
        }
    }

    impl DomainPort for MockPaymentStore {}

    #[async_trait]
    impl PaymentStore for MockPaymentStore {
        async fn create_payment(&self, payment: &Payment) -> Result<(), PortError> {
            let mut payments = self.payments.write().await;
            if payments.contains_key(&payment.id) {
                return Err(PortError::conflict(format!(
                    "Payment {} already exists",
                    payment.id
                )));
            }
            payments.insert(payment.id, payment.clone());
            Ok(())
        }

        async fn get_payment(&self, id: PaymentId) -> Result<Payment, PortError> {
            self.payments
                .read()
                .await
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Payment", id))
        }

        async fn update_payment(
            &self,
            payment: &Payment,
            expected_version: u64,
        ) -> Result<(), PortError> {
            let mut payments = self.payments.write().await;
            let stored = payments
                .get_mut(&payment.id)
                .ok_or_else(|| PortError::not_found("Payment", payment.id))?;

            if stored.version != expected_version {
                return Err(PortError::conflict(format!(
                    "Payment {} version is {}, caller expected {}",
                    payment.id, stored.version, expected_version
                )));
            }

            let mut updated = payment.clone();
            updated.version = expected_version + 1;
            *stored = updated;
            Ok(())
        }

        async fn find_by_order(&self, order_id: OrderId) -> Result<Vec<Payment>, PortError> {
            let payments = self.payments.read().await;
            let mut result: Vec<Payment> = payments
                .values()
                .filter(|p| p.order_id == order_id)
                .cloned()
                .collect();
            result.sort_by_key(|p| p.created_at);
            Ok(result)
        }
    }

    /// In-memory mock implementation of BlobStore
    #[derive(Debug, Default)]
    pub struct MockBlobStore {
        uploads: Arc<RwLock<Vec<(String, usize)>>>,
    }

    impl MockBlobStore {
        pub fn new() -> Self {
            Self::default()
        }

        /// URLs of everything uploaded so far
        pub async fn uploaded_urls(&self) -> Vec<String> {
            self.uploads.read().await.iter().map(|(url, _)| url.clone()).collect()
        }
    }

    impl DomainPort for MockBlobStore {}

    #[async_trait]
    impl BlobStore for MockBlobStore {
        async fn upload(&self, file: &FileUpload, folder: &str) -> Result<String, PortError> {
            let url = format!("memory://{}/{}", folder, file.filename);
            self.uploads.write().await.push((url.clone(), file.bytes.len()));
            Ok(url)
        }

        async fn delete(&self, url: &str) -> Result<(), PortError> {
            self.uploads.write().await.retain(|(u, _)| u != url);
            Ok(())
        }
    }

    /// Notifier that records every event for assertions
    #[derive(Debug, Default)]
    pub struct RecordingNotifier {
        events: Arc<RwLock<Vec<NotificationEvent>>>,
    }

    impl RecordingNotifier {
        pub fn new() -> Self {
            Self::default()
        }

        pub async fn events(&self) -> Vec<NotificationEvent> {
            self.events.read().await.clone()
        }

        pub async fn event_names(&self) -> Vec<String> {
            self.events.read().await.iter().map(|e| e.name.clone()).collect()
        }
    }

    impl DomainPort for RecordingNotifier {}

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send(&self, event: NotificationEvent) -> Result<(), PortError> {
            self.events.write().await.push(event);
            Ok(())
        }
    }
}
