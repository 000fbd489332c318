//! Payment repository implementation
//!
//! The payments table carries a version column; `update_payment` applies
//! only when the stored version matches what the caller loaded, which is
//! the per-record exclusive write the settlement subsystem relies on to
//! serialize racing confirmations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use core_kernel::{DomainPort, Money, OrderId, PaymentId, PortError};
use domain_payment::{Payment, PaymentStore};

use crate::error::DatabaseError;
use crate::repositories::{decode_json, encode_json};

/// Repository for payment persistence
#[derive(Debug, Clone)]
pub struct PaymentRepository {
    pool: PgPool,
}

impl PaymentRepository {
    /// Creates a new PaymentRepository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn insert(&self, payment: &Payment) -> Result<(), DatabaseError> {
        let encoded = EncodedPayment::try_from(payment)?;

        sqlx::query(
            r#"
            INSERT INTO payments (
                payment_id, order_id, amount, currency, method, status,
                timing, kind, percentage, details, provider_data, created_by,
                processed_at, completed_at, failed_at, cancelled_at, refunded_at,
                error_log, transition_log, version, created_at, updated_at
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12,
                $13, $14, $15, $16, $17, $18, $19, $20, $21, $22
            )
            "#,
        )
        .bind(payment.id.as_uuid())
        .bind(payment.order_id.as_uuid())
        .bind(payment.amount.amount())
        .bind(payment.amount.currency().code())
        .bind(&encoded.method)
        .bind(&encoded.status)
        .bind(&encoded.timing)
        .bind(&encoded.kind)
        .bind(payment.percentage)
        .bind(&encoded.details)
        .bind(&encoded.provider_data)
        .bind(&encoded.created_by)
        .bind(payment.processed_at)
        .bind(payment.completed_at)
        .bind(payment.failed_at)
        .bind(payment.cancelled_at)
        .bind(payment.refunded_at)
        .bind(&encoded.error_log)
        .bind(&encoded.transition_log)
        .bind(payment.version as i64)
        .bind(payment.created_at)
        .bind(payment.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Versioned update; zero affected rows means the caller lost the race
    /// (or the payment vanished, which the follow-up probe distinguishes)
    async fn update_versioned(
        &self,
        payment: &Payment,
        expected_version: u64,
    ) -> Result<(), DatabaseError> {
        let encoded = EncodedPayment::try_from(payment)?;

        let result = sqlx::query(
            r#"
            UPDATE payments SET
                status = $3,
                details = $4,
                provider_data = $5,
                processed_at = $6,
                completed_at = $7,
                failed_at = $8,
                cancelled_at = $9,
                refunded_at = $10,
                error_log = $11,
                transition_log = $12,
                version = $2 + 1,
                updated_at = $13
            WHERE payment_id = $1 AND version = $2
            "#,
        )
        .bind(payment.id.as_uuid())
        .bind(expected_version as i64)
        .bind(&encoded.status)
        .bind(&encoded.details)
        .bind(&encoded.provider_data)
        .bind(payment.processed_at)
        .bind(payment.completed_at)
        .bind(payment.failed_at)
        .bind(payment.cancelled_at)
        .bind(payment.refunded_at)
        .bind(&encoded.error_log)
        .bind(&encoded.transition_log)
        .bind(payment.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            let exists = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM payments WHERE payment_id = $1)",
            )
            .bind(payment.id.as_uuid())
            .fetch_one(&self.pool)
            .await?;

            return if exists {
                Err(DatabaseError::VersionConflict(format!(
                    "payment {} changed since version {}",
                    payment.id, expected_version
                )))
            } else {
                Err(DatabaseError::not_found("Payment", payment.id))
            };
        }

        Ok(())
    }

    async fn fetch(&self, id: PaymentId) -> Result<Option<Payment>, DatabaseError> {
        let row = sqlx::query_as::<_, PaymentRow>(
            r#"
            SELECT
                payment_id, order_id, amount, currency, method, status,
                timing, kind, percentage, details, provider_data, created_by,
                processed_at, completed_at, failed_at, cancelled_at, refunded_at,
                error_log, transition_log, version, created_at, updated_at
            FROM payments
            WHERE payment_id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(PaymentRow::into_domain).transpose()
    }

    async fn fetch_by_order(&self, order_id: OrderId) -> Result<Vec<Payment>, DatabaseError> {
        let rows = sqlx::query_as::<_, PaymentRow>(
            r#"
            SELECT
                payment_id, order_id, amount, currency, method, status,
                timing, kind, percentage, details, provider_data, created_by,
                processed_at, completed_at, failed_at, cancelled_at, refunded_at,
                error_log, transition_log, version, created_at, updated_at
            FROM payments
            WHERE order_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(order_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(PaymentRow::into_domain).collect()
    }
}

impl DomainPort for PaymentRepository {}

#[async_trait]
impl PaymentStore for PaymentRepository {
    async fn create_payment(&self, payment: &Payment) -> Result<(), PortError> {
        self.insert(payment).await.map_err(PortError::from)
    }

    async fn get_payment(&self, id: PaymentId) -> Result<Payment, PortError> {
        self.fetch(id)
            .await
            .map_err(PortError::from)?
            .ok_or_else(|| PortError::not_found("Payment", id))
    }

    async fn update_payment(
        &self,
        payment: &Payment,
        expected_version: u64,
    ) -> Result<(), PortError> {
        self.update_versioned(payment, expected_version)
            .await
            .map_err(PortError::from)
    }

    async fn find_by_order(&self, order_id: OrderId) -> Result<Vec<Payment>, PortError> {
        self.fetch_by_order(order_id).await.map_err(PortError::from)
    }
}

/// JSONB/text encodings of a payment's non-scalar fields
struct EncodedPayment {
    method: String,
    status: String,
    timing: String,
    kind: String,
    details: serde_json::Value,
    provider_data: serde_json::Value,
    created_by: serde_json::Value,
    error_log: serde_json::Value,
    transition_log: serde_json::Value,
}

impl TryFrom<&Payment> for EncodedPayment {
    type Error = DatabaseError;

    fn try_from(payment: &Payment) -> Result<Self, DatabaseError> {
        let as_text = |column: &str, value: serde_json::Value| -> Result<String, DatabaseError> {
            value
                .as_str()
                .map(String::from)
                .ok_or_else(|| {
                    DatabaseError::SerializationError(format!(
                        "column {} did not encode to a string",
                        column
                    ))
                })
        };

        Ok(Self {
            method: as_text("method", encode_json("method", &payment.method)?)?,
            status: as_text("status", encode_json("status", &payment.status)?)?,
            timing: as_text("timing", encode_json("timing", &payment.timing)?)?,
            kind: as_text("kind", encode_json("kind", &payment.kind)?)?,
            details: encode_json("details", &payment.details)?,
            provider_data: encode_json("provider_data", &payment.provider_data)?,
            created_by: encode_json("created_by", &payment.created_by)?,
            error_log: encode_json("error_log", &payment.error_log)?,
            transition_log: encode_json("transition_log", &payment.transition_log)?,
        })
    }
}

/// Database row for a payment
#[derive(Debug, FromRow)]
struct PaymentRow {
    payment_id: Uuid,
    order_id: Uuid,
    amount: Decimal,
    currency: String,
    method: String,
    status: String,
    timing: String,
    kind: String,
    percentage: Option<Decimal>,
    details: serde_json::Value,
    provider_data: serde_json::Value,
    created_by: serde_json::Value,
    processed_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    failed_at: Option<DateTime<Utc>>,
    cancelled_at: Option<DateTime<Utc>>,
    refunded_at: Option<DateTime<Utc>>,
    error_log: serde_json::Value,
    transition_log: serde_json::Value,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PaymentRow {
    fn into_domain(self) -> Result<Payment, DatabaseError> {
        let currency = decode_json("currency", serde_json::Value::String(self.currency))?;

        Ok(Payment {
            id: PaymentId::from_uuid(self.payment_id),
            order_id: OrderId::from_uuid(self.order_id),
            amount: Money::new(self.amount, currency),
            method: decode_json("method", serde_json::Value::String(self.method))?,
            status: decode_json("status", serde_json::Value::String(self.status))?,
            timing: decode_json("timing", serde_json::Value::String(self.timing))?,
            kind: decode_json("kind", serde_json::Value::String(self.kind))?,
            percentage: self.percentage,
            details: decode_json("details", self.details)?,
            provider_data: decode_json("provider_data", self.provider_data)?,
            created_by: decode_json("created_by", self.created_by)?,
            processed_at: self.processed_at,
            completed_at: self.completed_at,
            failed_at: self.failed_at,
            cancelled_at: self.cancelled_at,
            refunded_at: self.refunded_at,
            error_log: decode_json("error_log", self.error_log)?,
            transition_log: decode_json("transition_log", self.transition_log)?,
            version: self.version as u64,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
