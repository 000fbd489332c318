//! Order Domain Ports
//!
//! The `OrderStore` trait defines everything the settlement subsystem needs
//! from order persistence. The database adapter in `infra_db` and the
//! in-memory mock below both implement it.

use async_trait::async_trait;

use core_kernel::{DomainPort, OrderId, PortError};

use crate::order::Order;

/// Port for order persistence
#[async_trait]
pub trait OrderStore: DomainPort {
    /// Retrieves an order by ID
    ///
    /// # Returns
    ///
    /// The order if found, or `PortError::NotFound`
    async fn get_order(&self, id: OrderId) -> Result<Order, PortError>;

    /// Persists the current state of an order
    ///
    /// Used both for status changes and for settlement-view replacement;
    /// the full aggregate (including status history) is written back.
    async fn save_order(&self, order: &Order) -> Result<(), PortError>;
}

/// In-memory mock implementation of OrderStore for testing
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::RwLock;

    /// In-memory mock implementation of OrderStore
    #[derive(Debug, Default)]
    pub struct MockOrderStore {
        orders: Arc<RwLock<HashMap<OrderId, Order>>>,
    }

    impl MockOrderStore {
        /// Creates a new mock store
        pub fn new() -> Self {
            Self::default()
        }

        /// Pre-populates with orders for testing
        pub async fn with_orders(orders: Vec<Order>) -> Self {
            let store = Self::new();
            for order in orders {
                store.orders.write().await.insert(order.id, order);
            }
            store
        }
    }

    impl DomainPort for MockOrderStore {}

    #[async_trait]
    impl OrderStore for MockOrderStore {
        async fn get_order(&self, id: OrderId) -> Result<Order, PortError> {
            self.orders
                .read()
                .await
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Order", id))
        }

        async fn save_order(&self, order: &Order) -> Result<(), PortError> {
            self.orders.write().await.insert(order.id, order.clone());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::MockOrderStore;
    use super::*;
    use core_kernel::{Currency, CustomerId, Money};
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_mock_store_round_trip() {
        let store = MockOrderStore::new();
        let order = Order::new(CustomerId::new(), Money::new(dec!(100), Currency::USD));
        let id = order.id;

        store.save_order(&order).await.unwrap();
        let loaded = store.get_order(id).await.unwrap();
        assert_eq!(loaded.id, id);
        assert_eq!(loaded.total, order.total);
    }

    #[tokio::test]
    async fn test_mock_store_not_found() {
        let store = MockOrderStore::new();
        let result = store.get_order(OrderId::new()).await;
        assert!(result.unwrap_err().is_not_found());
    }
}
