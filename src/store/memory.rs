use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{CatalogStore, IdentityProvider, OrderStore, StoreError};
use crate::domain::order::Order;
use crate::models::{Product, User};

// ============================================================================
// In-Memory Store
// ============================================================================
//
// Backs the demo binary and the test suite. All three tables live behind a
// single RwLock, which is what makes `insert_reserving_product` a real
// transactional boundary here: the availability check, the order insert and
// the flag flip happen under one write guard.
//
// ============================================================================

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    products: HashMap<Uuid, Product>,
    orders: HashMap<Uuid, Order>,
}

#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IdentityProvider for InMemoryStore {
    async fn user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn add_user(&self, user: User) -> Result<(), StoreError> {
        self.tables.write().await.users.insert(user.id, user);
        Ok(())
    }
}

#[async_trait]
impl CatalogStore for InMemoryStore {
    async fn product(&self, id: Uuid) -> Result<Option<Product>, StoreError> {
        Ok(self.tables.read().await.products.get(&id).cloned())
    }

    async fn add_product(&self, product: Product) -> Result<(), StoreError> {
        self.tables.write().await.products.insert(product.id, product);
        Ok(())
    }
}

#[async_trait]
impl OrderStore for InMemoryStore {
    async fn insert_reserving_product(&self, order: &Order) -> Result<(), StoreError> {
        let mut guard = self.tables.write().await;
        let tables = &mut *guard;

        let product = tables
            .products
            .get_mut(&order.product)
            .ok_or(StoreError::ProductNotFound(order.product))?;
        if !product.is_available {
            return Err(StoreError::ProductUnavailable(order.product));
        }

        product.is_available = false;
        tables.orders.insert(order.id, order.clone());

        tracing::debug!(
            order_id = %order.id,
            product_id = %order.product,
            "Persisted order and reserved product"
        );
        Ok(())
    }

    async fn order(&self, id: Uuid) -> Result<Option<Order>, StoreError> {
        Ok(self.tables.read().await.orders.get(&id).cloned())
    }

    async fn update(&self, order: &Order, expected_version: u64) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;

        let stored = tables
            .orders
            .get_mut(&order.id)
            .ok_or(StoreError::OrderNotFound(order.id))?;
        if stored.version != expected_version {
            return Err(StoreError::VersionConflict {
                order_id: order.id,
                expected: expected_version,
                found: stored.version,
            });
        }

        *stored = order.clone();
        Ok(())
    }

    async fn list_for_buyer(&self, buyer: Uuid) -> Result<Vec<Order>, StoreError> {
        let tables = self.tables.read().await;
        let mut orders: Vec<Order> = tables
            .orders
            .values()
            .filter(|o| o.buyer == buyer)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn list_for_seller(&self, seller: Uuid) -> Result<Vec<Order>, StoreError> {
        let tables = self.tables.read().await;
        let mut orders: Vec<Order> = tables
            .orders
            .values()
            .filter(|o| o.seller == seller)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::{OrderStatus, PaymentMethod};
    use crate::models::{Caller, Role};
    use rust_decimal_macros::dec;

    fn test_order(product: &Product) -> Order {
        Order::create(
            Caller {
                id: Uuid::new_v4(),
                role: Role::User,
            },
            product,
            PaymentMethod::Cod,
            "12 Elm St".into(),
            None,
        )
    }

    #[tokio::test]
    async fn test_insert_reserves_the_product() {
        let store = InMemoryStore::new();
        let product = Product::new("Turntable", dec!(80.00), Uuid::new_v4());
        store.add_product(product.clone()).await.unwrap();

        let order = test_order(&product);
        store.insert_reserving_product(&order).await.unwrap();

        let stored = store.product(product.id).await.unwrap().unwrap();
        assert!(!stored.is_available);
        assert!(store.order(order.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_second_insert_for_same_product_fails_without_order() {
        let store = InMemoryStore::new();
        let product = Product::new("Turntable", dec!(80.00), Uuid::new_v4());
        store.add_product(product.clone()).await.unwrap();

        let first = test_order(&product);
        let second = test_order(&product);

        store.insert_reserving_product(&first).await.unwrap();
        let err = store.insert_reserving_product(&second).await.unwrap_err();

        assert!(matches!(err, StoreError::ProductUnavailable(_)));
        assert!(store.order(second.id).await.unwrap().is_none());
        assert!(store.order(first.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_insert_against_missing_product_fails() {
        let store = InMemoryStore::new();
        let product = Product::new("Ghost item", dec!(1.00), Uuid::new_v4());
        let order = test_order(&product);

        let err = store.insert_reserving_product(&order).await.unwrap_err();
        assert!(matches!(err, StoreError::ProductNotFound(_)));
        assert!(store.order(order.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_is_compare_and_swap() {
        let store = InMemoryStore::new();
        let product = Product::new("Turntable", dec!(80.00), Uuid::new_v4());
        store.add_product(product.clone()).await.unwrap();

        let mut order = test_order(&product);
        store.insert_reserving_product(&order).await.unwrap();

        order.transition(OrderStatus::Shipped).unwrap();
        store.update(&order, 0).await.unwrap();

        // replay with the stale expected version
        let err = store.update(&order, 0).await.unwrap_err();
        assert!(matches!(err, StoreError::VersionConflict { found: 1, .. }));

        // stored record untouched by the failed CAS
        let stored = store.order(order.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Shipped);
        assert_eq!(stored.version, 1);
    }

    #[tokio::test]
    async fn test_listings_are_newest_first() {
        let store = InMemoryStore::new();
        let seller = Uuid::new_v4();
        let buyer = Caller {
            id: Uuid::new_v4(),
            role: Role::User,
        };

        let mut ids = Vec::new();
        for i in 0..3 {
            let product = Product::new(format!("Item {i}"), dec!(10.00), seller);
            store.add_product(product.clone()).await.unwrap();
            let order = Order::create(buyer, &product, PaymentMethod::Cod, "12 Elm St".into(), None);
            store.insert_reserving_product(&order).await.unwrap();
            ids.push(order.id);
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        }

        let for_buyer = store.list_for_buyer(buyer.id).await.unwrap();
        let listed: Vec<Uuid> = for_buyer.iter().map(|o| o.id).collect();
        let mut expected = ids.clone();
        expected.reverse();
        assert_eq!(listed, expected);

        let for_seller = store.list_for_seller(seller).await.unwrap();
        assert_eq!(for_seller.len(), 3);
        assert_eq!(for_seller[0].id, *ids.last().unwrap());
    }
}
