//! HTTP API Layer
//!
//! This crate provides the REST API for the settlement subsystem using Axum.
//!
//! # Architecture
//!
//! - **Handlers**: payment operations and health checks
//! - **Middleware**: JWT authentication and audit logging
//! - **DTOs**: request/response data transfer objects
//! - **Error Handling**: consistent error responses
//!
//! The gateway webhook route is public by design: its HMAC signature check
//! is the authentication.
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::{build_processor, create_router};
//!
//! let processor = build_processor(pool.clone(), &config);
//! let app = create_router(pool, processor, config);
//! axum::serve(listener, app).await?;
//! ```

pub mod config;
pub mod error;
pub mod auth;
pub mod middleware;
pub mod handlers;
pub mod dto;
pub mod blob;

use std::sync::Arc;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use domain_payment::{
    BankTransferConfig, BankTransferProvider, CashProvider, GatewayProvider, HttpGatewayClient,
    LoggingNotifier, PaymentProcessor, TargetAccount,
};
use infra_db::{OrderRepository, PaymentRepository};

use crate::blob::LocalBlobStore;
use crate::config::ApiConfig;
use crate::handlers::{health, payments};
use crate::middleware::{audit_middleware, auth_middleware};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub processor: Arc<PaymentProcessor>,
    pub config: ApiConfig,
}

/// Wires the payment processor from configuration: database-backed stores,
/// the three providers, and the logging notifier
pub fn build_processor(pool: PgPool, config: &ApiConfig) -> Arc<PaymentProcessor> {
    let orders = Arc::new(OrderRepository::new(pool.clone()));
    let payments = Arc::new(PaymentRepository::new(pool));
    let notifier = Arc::new(LoggingNotifier);

    let gateway_config = config.gateway_config();
    let client = Arc::new(
        HttpGatewayClient::new(&gateway_config).expect("failed to build gateway HTTP client"),
    );
    let gateway = Arc::new(GatewayProvider::new(gateway_config, client));

    let blobs = Arc::new(LocalBlobStore::new(
        config.blob_dir.clone(),
        config.blob_base_url.clone(),
    ));
    let bank_transfer = Arc::new(BankTransferProvider::new(
        BankTransferConfig::new(vec![TargetAccount {
            bank_name: config.bank_name.clone(),
            account_number: config.bank_account_number.clone(),
            account_holder: config.bank_account_holder.clone(),
        }]),
        blobs,
        notifier.clone(),
    ));

    Arc::new(PaymentProcessor::new(
        orders,
        payments,
        gateway,
        Arc::new(CashProvider::new()),
        bank_transfer,
        notifier,
    ))
}

/// Creates the main API router
pub fn create_router(pool: PgPool, processor: Arc<PaymentProcessor>, config: ApiConfig) -> Router {
    let state = AppState {
        pool,
        processor,
        config,
    };

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
        .route("/webhooks/gateway", post(payments::gateway_webhook));

    // Payment routes
    let order_payment_routes = Router::new()
        .route("/:id/payments", post(payments::process_payment))
        .route("/:id/payments", get(payments::order_payment_status));

    let payment_routes = Router::new()
        .route("/:id/confirm", post(payments::confirm_payment))
        .route("/:id/cancel", post(payments::cancel_payment))
        .route("/:id/refund", post(payments::refund_payment))
        .route("/:id/proof", post(payments::submit_transfer_proof));

    // Protected API routes
    let api_routes = Router::new()
        .nest("/orders", order_payment_routes)
        .nest("/payments", payment_routes)
        .layer(axum_middleware::from_fn_with_state(state.clone(), audit_middleware))
        .layer(axum_middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
