//! Payment handlers
//!
//! The produced interface of the settlement subsystem: process, confirm,
//! cancel, refund, proof upload, status read, and the gateway webhook.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use base64::Engine;
use uuid::Uuid;

use core_kernel::{Actor, OrderId, PaymentId};
use domain_payment::{
    Confirmation, FileUpload, OrderPaymentStatus, PaymentReceipt, WebhookEvent,
};

use crate::auth::Claims;
use crate::dto::payments::{ProcessPaymentBody, ProofUploadBody, ReasonBody};
use crate::error::ApiError;
use crate::AppState;

fn actor_from(claims: &Claims) -> Result<Actor, ApiError> {
    claims.actor().map_err(|_| ApiError::Unauthorized)
}

/// Starts a payment against an order
pub async fn process_payment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(order_id): Path<Uuid>,
    Json(body): Json<ProcessPaymentBody>,
) -> Result<Json<PaymentReceipt>, ApiError> {
    let actor = actor_from(&claims)?;
    let receipt = state
        .processor
        .process_payment(OrderId::from_uuid(order_id), body.into(), actor)
        .await?;
    Ok(Json(receipt))
}

/// Payment history and derived settlement view for an order
pub async fn order_payment_status(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(order_id): Path<Uuid>,
) -> Result<Json<OrderPaymentStatus>, ApiError> {
    let actor = actor_from(&claims)?;
    let status = state
        .processor
        .order_payment_status(OrderId::from_uuid(order_id), actor)
        .await?;
    Ok(Json(status))
}

/// Finalizes a payment (cash receipt, transfer verdict, manual gateway check)
pub async fn confirm_payment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(payment_id): Path<Uuid>,
    Json(confirmation): Json<Confirmation>,
) -> Result<Json<PaymentReceipt>, ApiError> {
    let actor = actor_from(&claims)?;
    let receipt = state
        .processor
        .confirm_payment(PaymentId::from_uuid(payment_id), confirmation, actor)
        .await?;
    Ok(Json(receipt))
}

/// Aborts a pending or processing payment
pub async fn cancel_payment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(payment_id): Path<Uuid>,
    Json(body): Json<ReasonBody>,
) -> Result<Json<PaymentReceipt>, ApiError> {
    let actor = actor_from(&claims)?;
    let receipt = state
        .processor
        .cancel_payment(PaymentId::from_uuid(payment_id), &body.reason, actor)
        .await?;
    Ok(Json(receipt))
}

/// Reverses a completed payment (staff only)
pub async fn refund_payment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(payment_id): Path<Uuid>,
    Json(body): Json<ReasonBody>,
) -> Result<Json<PaymentReceipt>, ApiError> {
    let actor = actor_from(&claims)?;
    let receipt = state
        .processor
        .refund_payment(PaymentId::from_uuid(payment_id), &body.reason, actor)
        .await?;
    Ok(Json(receipt))
}

/// Attaches a proof-of-transfer document (payer only)
pub async fn submit_transfer_proof(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(payment_id): Path<Uuid>,
    Json(body): Json<ProofUploadBody>,
) -> Result<Json<PaymentReceipt>, ApiError> {
    let actor = actor_from(&claims)?;

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(&body.data_base64)
        .map_err(|_| ApiError::Validation("proof document is not valid base64".to_string()))?;

    let receipt = state
        .processor
        .submit_transfer_proof(
            PaymentId::from_uuid(payment_id),
            FileUpload {
                filename: body.filename,
                content_type: body.content_type,
                bytes,
            },
            actor,
        )
        .await?;
    Ok(Json(receipt))
}

/// Inbound gateway webhook
///
/// Public route: no auth middleware, the HMAC signature is the gate. A
/// rejected event produces no customer-visible output, only a logged error.
pub async fn gateway_webhook(
    State(state): State<AppState>,
    Json(event): Json<WebhookEvent>,
) -> Result<Json<PaymentReceipt>, ApiError> {
    let receipt = state.processor.handle_gateway_webhook(event).await?;
    Ok(Json(receipt))
}
