//! Infrastructure Database Layer
//!
//! This crate provides PostgreSQL persistence for the settlement subsystem,
//! implementing the order and payment store ports on SQLx.
//!
//! # Architecture
//!
//! The crate follows the repository pattern: the domain crates define the
//! port traits, this crate supplies the database-backed adapters. Scalar
//! fields live in typed columns; nested structures (channel sub-records,
//! error logs, status history) are stored as JSONB documents.
//!
//! The payment table carries a version column used for the per-record
//! optimistic write: `UPDATE ... WHERE payment_id = $1 AND version = $2`.
//! A missed update surfaces as a conflict, which is how two racing
//! confirmations are serialized.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, PaymentRepository};
//!
//! let pool = create_pool("postgres://localhost/printforge").await?;
//! let payments = PaymentRepository::new(pool);
//! ```

pub mod pool;
pub mod error;
pub mod repositories;

pub use pool::{create_pool, DatabaseConfig};
pub use error::DatabaseError;
pub use repositories::{OrderRepository, PaymentRepository};
