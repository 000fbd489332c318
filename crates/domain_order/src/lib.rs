//! Order Domain - Order lifecycle and settlement view
//!
//! This crate owns the `Order` aggregate for the print-on-demand platform:
//! its status machine, the append-only status history, and the derived
//! settlement view that summarizes what has been paid against the order.
//!
//! The settlement view is intentionally a pure function of the order's
//! payment set. It is recomputed in full after every payment mutation and
//! never patched field-by-field, so a concurrently created payment can never
//! leave the summary out of sync for longer than the next recompute.

pub mod order;
pub mod settlement;
pub mod error;
pub mod ports;

pub use order::{Order, OrderStatus, StatusHistoryEntry};
pub use settlement::{
    PaymentMethod, PaymentProgress, PaymentSummary, SettlementStatus, SettlementView,
};
pub use error::OrderError;
pub use ports::OrderStore;
