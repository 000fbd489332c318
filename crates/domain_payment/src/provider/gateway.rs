//! Card gateway provider
//!
//! The gateway flow is redirect-out, webhook-back: `process` creates an
//! external payment link and returns its URL, real settlement status is
//! unknown until a webhook or a manual poll arrives. When the external
//! service is unreachable or unconfigured the provider degrades to a
//! self-contained simulated success path instead of blocking checkout; every
//! response produced on that path carries `is_simulated: true` so it can
//! never be mistaken for a real settlement.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{Actor, Money, PortError};
use domain_order::{Order, PaymentMethod};

use crate::error::PaymentError;
use crate::payment::{GatewayDetails, MethodDetails, Payment, PaymentStatus};
use crate::provider::{
    ensure_open, generate_reference, CancelOutcome, ChannelResponse, Confirmation,
    ConfirmOutcome, ProcessOutcome, ProcessRequest, ProviderStrategy,
};

/// Gateway provider configuration
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Base URL of the gateway API; empty means unconfigured
    pub base_url: String,
    /// API key; empty means unconfigured
    pub api_key: String,
    /// Shared secret for webhook signatures
    pub webhook_secret: Option<String>,
    /// Outbound call timeout
    pub timeout_secs: u64,
    /// Payment-link lifetime
    pub link_ttl_minutes: i64,
    /// Force the simulated path regardless of connectivity (development)
    pub simulate: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_key: String::new(),
            webhook_secret: None,
            timeout_secs: 15,
            link_ttl_minutes: 60,
            simulate: false,
        }
    }
}

impl GatewayConfig {
    /// True when the real gateway can be called at all
    pub fn is_configured(&self) -> bool {
        !self.base_url.is_empty() && !self.api_key.is_empty()
    }

    /// True when requests should take the simulated path up front
    pub fn force_simulated(&self) -> bool {
        self.simulate || !self.is_configured()
    }
}

/// Request to create an external payment link
#[derive(Debug, Clone, Serialize)]
pub struct PaymentLinkRequest {
    pub reference: String,
    pub amount: Money,
    pub description: String,
    pub return_url: Option<String>,
    pub expires_at: DateTime<Utc>,
}

/// External payment-link descriptor
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentLinkResponse {
    pub redirect_url: String,
    pub external_id: String,
}

/// Outbound calls to the card gateway, abstracted for testing
#[async_trait]
pub trait GatewayClient: Send + Sync {
    /// Creates a payment link; the customer is redirected to its URL
    async fn create_payment_link(
        &self,
        request: &PaymentLinkRequest,
    ) -> Result<PaymentLinkResponse, PortError>;

    /// Polls the external status of a payment by reference
    async fn fetch_payment_status(&self, reference: &str) -> Result<String, PortError>;
}

/// HTTP implementation of `GatewayClient` using reqwest
pub struct HttpGatewayClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    timeout_secs: u64,
}

impl HttpGatewayClient {
    /// Builds a client with the configured timeout
    pub fn new(config: &GatewayConfig) -> Result<Self, PortError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PortError::Internal {
                message: "failed to build gateway HTTP client".to_string(),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            timeout_secs: config.timeout_secs,
        })
    }

    fn map_error(err: reqwest::Error, operation: &str, timeout_secs: u64) -> PortError {
        if err.is_timeout() {
            return PortError::Timeout {
                operation: operation.to_string(),
                duration_ms: timeout_secs * 1000,
            };
        }
        if let Some(status) = err.status() {
            if status.is_server_error() {
                return PortError::ServiceUnavailable {
                    service: "gateway".to_string(),
                };
            }
            if status == reqwest::StatusCode::UNAUTHORIZED
                || status == reqwest::StatusCode::FORBIDDEN
            {
                return PortError::Unauthorized {
                    message: format!("gateway rejected credentials ({})", status),
                };
            }
        }
        PortError::Connection {
            message: format!("gateway {} failed", operation),
            source: Some(Box::new(err)),
        }
    }
}

#[async_trait]
impl GatewayClient for HttpGatewayClient {
    async fn create_payment_link(
        &self,
        request: &PaymentLinkRequest,
    ) -> Result<PaymentLinkResponse, PortError> {
        let url = format!("{}/v1/payment-links", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| Self::map_error(e, "create_payment_link", self.timeout_secs))?;

        response
            .json::<PaymentLinkResponse>()
            .await
            .map_err(|e| PortError::Internal {
                message: "gateway returned an unreadable payment link".to_string(),
                source: Some(Box::new(e)),
            })
    }

    async fn fetch_payment_status(&self, reference: &str) -> Result<String, PortError> {
        let url = format!("{}/v1/payments/{}/status", self.base_url, reference);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| Self::map_error(e, "fetch_payment_status", self.timeout_secs))?;

        #[derive(Deserialize)]
        struct StatusResponse {
            status: String,
        }

        response
            .json::<StatusResponse>()
            .await
            .map(|r| r.status)
            .map_err(|e| PortError::Internal {
                message: "gateway returned an unreadable status".to_string(),
                source: Some(Box::new(e)),
            })
    }
}

/// Card gateway provider
pub struct GatewayProvider {
    config: GatewayConfig,
    client: Arc<dyn GatewayClient>,
}

impl GatewayProvider {
    pub fn new(config: GatewayConfig, client: Arc<dyn GatewayClient>) -> Self {
        Self { config, client }
    }

    /// The provider's configuration (webhook handling reads the secret)
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Builds the simulated outcome used when the real gateway cannot be
    /// reached; flagged in details, metadata, and the caller response
    fn simulated_outcome(&self, reference: String, expires_at: DateTime<Utc>) -> ProcessOutcome {
        let redirect_url = format!(
            "https://checkout.simulated.local/pay/{}",
            reference
        );

        let mut details = GatewayDetails::new(reference, true);
        details.redirect_url = Some(redirect_url.clone());
        details.link_expires_at = Some(expires_at);

        let mut provider_data = serde_json::Map::new();
        provider_data.insert("is_simulated".to_string(), serde_json::Value::Bool(true));

        ProcessOutcome {
            status: PaymentStatus::Processing,
            details: MethodDetails::Gateway(details),
            provider_data,
            response: ChannelResponse::Gateway {
                redirect_url,
                link_expires_at: expires_at,
                is_simulated: true,
            },
        }
    }

    /// Maps the gateway's status vocabulary onto the payment lifecycle
    fn map_external_status(external: &str) -> Result<PaymentStatus, PaymentError> {
        match external {
            "APPROVED" => Ok(PaymentStatus::Completed),
            "DECLINED" | "ERROR" => Ok(PaymentStatus::Failed),
            "VOIDED" => Ok(PaymentStatus::Cancelled),
            "PENDING" => Ok(PaymentStatus::Processing),
            other => Err(PaymentError::Validation(format!(
                "unknown gateway status: {}",
                other
            ))),
        }
    }

    fn gateway_details(payment: &Payment) -> Result<&GatewayDetails, PaymentError> {
        match &payment.details {
            MethodDetails::Gateway(details) => Ok(details),
            _ => Err(PaymentError::Validation(format!(
                "payment {} is not a gateway payment",
                payment.id
            ))),
        }
    }
}

#[async_trait]
impl ProviderStrategy for GatewayProvider {
    fn method(&self) -> PaymentMethod {
        PaymentMethod::Gateway
    }

    async fn process(
        &self,
        payment: &Payment,
        order: &Order,
        request: &ProcessRequest,
    ) -> Result<ProcessOutcome, PaymentError> {
        let reference = generate_reference("GW");
        let expires_at = Utc::now() + chrono::Duration::minutes(self.config.link_ttl_minutes);

        if self.config.force_simulated() {
            tracing::warn!(
                payment_id = %payment.id,
                order_id = %order.id,
                configured = self.config.is_configured(),
                "gateway in simulated mode, issuing local payment link"
            );
            return Ok(self.simulated_outcome(reference, expires_at));
        }

        let link_request = PaymentLinkRequest {
            reference: reference.clone(),
            amount: payment.amount,
            description: format!("Order {}", order.order_number),
            return_url: request.return_url.clone(),
            expires_at,
        };

        match self.client.create_payment_link(&link_request).await {
            Ok(link) => {
                let mut details = GatewayDetails::new(reference, false);
                details.redirect_url = Some(link.redirect_url.clone());
                details.link_expires_at = Some(expires_at);

                let mut provider_data = serde_json::Map::new();
                provider_data.insert(
                    "external_id".to_string(),
                    serde_json::Value::String(link.external_id),
                );
                provider_data.insert("is_simulated".to_string(), serde_json::Value::Bool(false));

                // Real status is unknown until the webhook or a poll arrives
                Ok(ProcessOutcome {
                    status: PaymentStatus::Processing,
                    details: MethodDetails::Gateway(details),
                    provider_data,
                    response: ChannelResponse::Gateway {
                        redirect_url: link.redirect_url,
                        link_expires_at: expires_at,
                        is_simulated: false,
                    },
                })
            }
            Err(err) => {
                // Availability over strict settlement accuracy: checkout
                // falls over to the simulated path rather than failing
                tracing::error!(
                    payment_id = %payment.id,
                    order_id = %order.id,
                    error = %err,
                    transient = err.is_transient(),
                    "gateway call failed, falling back to simulated settlement"
                );
                Ok(self.simulated_outcome(reference, expires_at))
            }
        }
    }

    async fn confirm(
        &self,
        payment: &Payment,
        confirmation: &Confirmation,
        _actor: &Actor,
    ) -> Result<ConfirmOutcome, PaymentError> {
        ensure_open(payment)?;

        let Confirmation::Gateway(confirmation) = confirmation else {
            return Err(PaymentError::Validation(
                "gateway payment requires a gateway confirmation".to_string(),
            ));
        };

        let details = Self::gateway_details(payment)?.clone();

        let external_status = match &confirmation.external_status {
            Some(status) => status.clone(),
            // Manual admin check without a status in hand: poll the gateway;
            // a simulated payment settles as approved
            None if details.is_simulated => "APPROVED".to_string(),
            None => self
                .client
                .fetch_payment_status(&details.reference)
                .await
                .map_err(|e| PaymentError::ProviderUnavailable(e.to_string()))?,
        };

        let status = Self::map_external_status(&external_status)?;

        let mut updated = details;
        if let Some(transaction_id) = &confirmation.transaction_id {
            updated.transaction_id = Some(transaction_id.clone());
        }
        if let Some(card_summary) = &confirmation.card_summary {
            updated.card_summary = Some(card_summary.clone());
        }
        if let Some(fee) = confirmation.processing_fee {
            updated.processing_fee = Some(Money::new(fee, payment.amount.currency()));
        }
        updated.webhook_received |= confirmation.via_webhook;

        let mut provider_data = serde_json::Map::new();
        provider_data.insert(
            "external_status".to_string(),
            serde_json::Value::String(external_status.clone()),
        );

        let failure_reason = (status == PaymentStatus::Failed)
            .then(|| format!("gateway returned {}", external_status));

        Ok(ConfirmOutcome {
            status,
            details: MethodDetails::Gateway(updated),
            provider_data,
            failure_reason,
        })
    }

    async fn cancel(
        &self,
        payment: &Payment,
        reason: &str,
        _actor: &Actor,
    ) -> Result<CancelOutcome, PaymentError> {
        ensure_open(payment)?;

        let details = Self::gateway_details(payment)?;
        tracing::info!(
            payment_id = %payment.id,
            reference = %details.reference,
            reason,
            "gateway payment cancelled; link left to expire"
        );

        Ok(CancelOutcome {
            cancelled_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::{Currency, CustomerId};
    use rust_decimal_macros::dec;

    use crate::payment::{PaymentKind, PaymentTiming};
    use crate::provider::GatewayConfirmation;

    /// Client stub whose responses are scripted per test
    struct StubClient {
        link: Result<PaymentLinkResponse, fn() -> PortError>,
        status: &'static str,
    }

    impl StubClient {
        fn healthy() -> Self {
            Self {
                link: Ok(PaymentLinkResponse {
                    redirect_url: "https://gateway.example/pay/x".to_string(),
                    external_id: "ext-1".to_string(),
                }),
                status: "PENDING",
            }
        }

        fn unavailable() -> Self {
            Self {
                link: Err(|| PortError::ServiceUnavailable {
                    service: "gateway".to_string(),
                }),
                status: "PENDING",
            }
        }
    }

    #[async_trait]
    impl GatewayClient for StubClient {
        async fn create_payment_link(
            &self,
            _request: &PaymentLinkRequest,
        ) -> Result<PaymentLinkResponse, PortError> {
            match &self.link {
                Ok(link) => Ok(link.clone()),
                Err(make) => Err(make()),
            }
        }

        async fn fetch_payment_status(&self, _reference: &str) -> Result<String, PortError> {
            Ok(self.status.to_string())
        }
    }

    fn configured() -> GatewayConfig {
        GatewayConfig {
            base_url: "https://gateway.example".to_string(),
            api_key: "key".to_string(),
            webhook_secret: Some("whsec".to_string()),
            ..Default::default()
        }
    }

    fn gateway_payment() -> (Payment, Order) {
        let order = Order::new(CustomerId::new(), Money::new(dec!(100), Currency::USD));
        let payment = Payment::new(
            order.id,
            Money::new(dec!(100), Currency::USD),
            MethodDetails::Gateway(GatewayDetails::new(String::new(), false)),
            PaymentTiming::Advance,
            PaymentKind::Full,
            None,
            Actor::Customer(order.customer_id),
        );
        (payment, order)
    }

    #[tokio::test]
    async fn test_process_returns_processing_never_completed() {
        let provider = GatewayProvider::new(configured(), Arc::new(StubClient::healthy()));
        let (payment, order) = gateway_payment();

        let outcome = provider
            .process(&payment, &order, &ProcessRequest::default())
            .await
            .unwrap();

        assert_eq!(outcome.status, PaymentStatus::Processing);
        match &outcome.details {
            MethodDetails::Gateway(d) => {
                assert!(!d.is_simulated);
                assert!(d.redirect_url.is_some());
            }
            _ => panic!("wrong details variant"),
        }
    }

    #[tokio::test]
    async fn test_unreachable_gateway_falls_back_to_simulated() {
        let provider = GatewayProvider::new(configured(), Arc::new(StubClient::unavailable()));
        let (payment, order) = gateway_payment();

        let outcome = provider
            .process(&payment, &order, &ProcessRequest::default())
            .await
            .unwrap();

        assert_eq!(outcome.status, PaymentStatus::Processing);
        match (&outcome.details, &outcome.response) {
            (
                MethodDetails::Gateway(d),
                ChannelResponse::Gateway { is_simulated, .. },
            ) => {
                assert!(d.is_simulated);
                assert!(*is_simulated);
                assert_eq!(
                    outcome.provider_data.get("is_simulated"),
                    Some(&serde_json::Value::Bool(true))
                );
            }
            _ => panic!("wrong variants"),
        }
    }

    #[tokio::test]
    async fn test_unconfigured_gateway_is_simulated_up_front() {
        let provider = GatewayProvider::new(
            GatewayConfig::default(),
            Arc::new(StubClient::unavailable()),
        );
        let (payment, order) = gateway_payment();

        let outcome = provider
            .process(&payment, &order, &ProcessRequest::default())
            .await
            .unwrap();

        match &outcome.details {
            MethodDetails::Gateway(d) => assert!(d.is_simulated),
            _ => panic!("wrong details variant"),
        }
    }

    #[tokio::test]
    async fn test_confirm_maps_external_vocabulary() {
        let provider = GatewayProvider::new(configured(), Arc::new(StubClient::healthy()));
        let (mut payment, _order) = gateway_payment();
        payment.transition_to(PaymentStatus::Processing, Actor::System).unwrap();

        for (external, expected) in [
            ("APPROVED", PaymentStatus::Completed),
            ("DECLINED", PaymentStatus::Failed),
            ("ERROR", PaymentStatus::Failed),
            ("VOIDED", PaymentStatus::Cancelled),
            ("PENDING", PaymentStatus::Processing),
        ] {
            let outcome = provider
                .confirm(
                    &payment,
                    &Confirmation::Gateway(GatewayConfirmation {
                        external_status: Some(external.to_string()),
                        transaction_id: None,
                        card_summary: None,
                        processing_fee: None,
                        via_webhook: true,
                    }),
                    &Actor::System,
                )
                .await
                .unwrap();
            assert_eq!(outcome.status, expected, "status {}", external);
        }
    }

    #[tokio::test]
    async fn test_confirm_rejects_terminal_payment() {
        let provider = GatewayProvider::new(configured(), Arc::new(StubClient::healthy()));
        let (mut payment, _order) = gateway_payment();
        payment.transition_to(PaymentStatus::Processing, Actor::System).unwrap();
        payment.transition_to(PaymentStatus::Completed, Actor::System).unwrap();

        let result = provider
            .confirm(
                &payment,
                &Confirmation::Gateway(GatewayConfirmation {
                    external_status: Some("APPROVED".to_string()),
                    transaction_id: None,
                    card_summary: None,
                    processing_fee: None,
                    via_webhook: true,
                }),
                &Actor::System,
            )
            .await;

        assert!(matches!(result, Err(PaymentError::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_confirm_unknown_status_is_a_validation_error() {
        let provider = GatewayProvider::new(configured(), Arc::new(StubClient::healthy()));
        let (mut payment, _order) = gateway_payment();
        payment.transition_to(PaymentStatus::Processing, Actor::System).unwrap();

        let result = provider
            .confirm(
                &payment,
                &Confirmation::Gateway(GatewayConfirmation {
                    external_status: Some("MYSTERY".to_string()),
                    transaction_id: None,
                    card_summary: None,
                    processing_fee: None,
                    via_webhook: false,
                }),
                &Actor::System,
            )
            .await;

        assert!(matches!(result, Err(PaymentError::Validation(_))));
    }

    #[tokio::test]
    async fn test_manual_check_on_simulated_payment_settles() {
        let provider = GatewayProvider::new(
            GatewayConfig {
                simulate: true,
                ..configured()
            },
            Arc::new(StubClient::unavailable()),
        );
        let (payment, order) = gateway_payment();

        let outcome = provider
            .process(&payment, &order, &ProcessRequest::default())
            .await
            .unwrap();

        let mut payment = payment;
        payment.details = outcome.details;
        payment.transition_to(PaymentStatus::Processing, Actor::System).unwrap();

        let confirm = provider
            .confirm(
                &payment,
                &Confirmation::Gateway(GatewayConfirmation {
                    external_status: None,
                    transaction_id: None,
                    card_summary: None,
                    processing_fee: None,
                    via_webhook: false,
                }),
                &Actor::System,
            )
            .await
            .unwrap();

        assert_eq!(confirm.status, PaymentStatus::Completed);
    }
}
