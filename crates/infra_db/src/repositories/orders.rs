//! Order repository implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use core_kernel::{CustomerId, DomainPort, Money, OrderId, PortError};
use domain_order::{Order, OrderStore};

use crate::error::DatabaseError;
use crate::repositories::{decode_json, encode_json};

/// Repository for order persistence
///
/// Scalar fields are typed columns; the settlement view and status history
/// are JSONB documents written back wholesale with the aggregate.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: PgPool,
}

impl OrderRepository {
    /// Creates a new OrderRepository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch(&self, id: OrderId) -> Result<Option<Order>, DatabaseError> {
        let row = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT
                order_id, order_number, customer_id, status,
                total, currency, settlement, status_history,
                created_at, updated_at
            FROM orders
            WHERE order_id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(OrderRow::into_domain).transpose()
    }

    async fn upsert(&self, order: &Order) -> Result<(), DatabaseError> {
        let status = encode_json("status", &order.status)?;
        let settlement = encode_json("settlement", &order.settlement)?;
        let status_history = encode_json("status_history", &order.status_history)?;

        sqlx::query(
            r#"
            INSERT INTO orders (
                order_id, order_number, customer_id, status,
                total, currency, settlement, status_history,
                created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (order_id) DO UPDATE SET
                status = EXCLUDED.status,
                total = EXCLUDED.total,
                currency = EXCLUDED.currency,
                settlement = EXCLUDED.settlement,
                status_history = EXCLUDED.status_history,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(&order.order_number)
        .bind(order.customer_id.as_uuid())
        .bind(status.as_str().unwrap_or_default())
        .bind(order.total.amount())
        .bind(order.total.currency().code())
        .bind(settlement)
        .bind(status_history)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

impl DomainPort for OrderRepository {}

#[async_trait]
impl OrderStore for OrderRepository {
    async fn get_order(&self, id: OrderId) -> Result<Order, PortError> {
        self.fetch(id)
            .await
            .map_err(PortError::from)?
            .ok_or_else(|| PortError::not_found("Order", id))
    }

    async fn save_order(&self, order: &Order) -> Result<(), PortError> {
        self.upsert(order).await.map_err(PortError::from)
    }
}

/// Database row for an order
#[derive(Debug, FromRow)]
struct OrderRow {
    order_id: Uuid,
    order_number: String,
    customer_id: Uuid,
    status: String,
    total: Decimal,
    currency: String,
    settlement: serde_json::Value,
    status_history: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_domain(self) -> Result<Order, DatabaseError> {
        let currency = decode_json("currency", serde_json::Value::String(self.currency))?;
        let status = decode_json("status", serde_json::Value::String(self.status))?;

        Ok(Order {
            id: OrderId::from_uuid(self.order_id),
            order_number: self.order_number,
            customer_id: CustomerId::from_uuid(self.customer_id),
            status,
            total: Money::new(self.total, currency),
            settlement: decode_json("settlement", self.settlement)?,
            status_history: decode_json("status_history", self.status_history)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
