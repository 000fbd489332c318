//! Repository implementations
//!
//! Database-backed adapters for the domain store ports.

pub mod orders;
pub mod payments;

pub use orders::OrderRepository;
pub use payments::PaymentRepository;

use crate::error::DatabaseError;

/// Decodes a JSONB column into a domain type
pub(crate) fn decode_json<T: serde::de::DeserializeOwned>(
    column: &str,
    value: serde_json::Value,
) -> Result<T, DatabaseError> {
    serde_json::from_value(value)
        .map_err(|e| DatabaseError::SerializationError(format!("column {}: {}", column, e)))
}

/// Encodes a domain type into a JSONB column value
pub(crate) fn encode_json<T: serde::Serialize>(
    column: &str,
    value: &T,
) -> Result<serde_json::Value, DatabaseError> {
    serde_json::to_value(value)
        .map_err(|e| DatabaseError::SerializationError(format!("column {}: {}", column, e)))
}
