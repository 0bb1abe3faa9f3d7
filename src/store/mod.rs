use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::order::Order;
use crate::models::{Product, User};

mod memory;

pub use memory::InMemoryStore;

// ============================================================================
// Storage Boundary
// ============================================================================
//
// The engine talks to three collaborators through these traits: the
// identity provider (users/roles), the catalog store (products and their
// availability flag), and the order store. One backend may implement all
// three — the in-memory store does — but the engine never assumes so.
//
// Atomicity contracts live here, not in the engine: the reserving insert
// couples the order write to the availability flip, and `update` is a
// compare-and-swap on the order's version.
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Product not found: {0}")]
    ProductNotFound(Uuid),

    #[error("Product is not available: {0}")]
    ProductUnavailable(Uuid),

    #[error("Order not found: {0}")]
    OrderNotFound(Uuid),

    #[error("Version conflict on order {order_id}: expected {expected}, found {found}")]
    VersionConflict {
        order_id: Uuid,
        expected: u64,
        found: u64,
    },

    #[error("Storage backend failure: {0}")]
    Backend(String),
}

/// Resolves callers to user records. Registration, login and the rest of
/// the auth surface live outside this core.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn user(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    /// Provisioning hook; used by the seed-admin step and by demo wiring.
    async fn add_user(&self, user: User) -> Result<(), StoreError>;
}

/// Holds product records. Listing management lives outside this core; the
/// engine only reads price/seller/availability and reserves items through
/// the order store's transactional insert.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn product(&self, id: Uuid) -> Result<Option<Product>, StoreError>;

    async fn add_product(&self, product: Product) -> Result<(), StoreError>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persist the order and flip its product's availability to false, as
    /// one unit: either both writes land or neither does. Re-checks the
    /// availability flag inside the transactional boundary, so a lost race
    /// surfaces as `ProductUnavailable` with no order record behind it.
    async fn insert_reserving_product(&self, order: &Order) -> Result<(), StoreError>;

    async fn order(&self, id: Uuid) -> Result<Option<Order>, StoreError>;

    /// Compare-and-swap: replaces the stored order only if its version
    /// still equals `expected_version`; fails with `VersionConflict`
    /// otherwise.
    async fn update(&self, order: &Order, expected_version: u64) -> Result<(), StoreError>;

    /// Orders placed by the buyer, newest first.
    async fn list_for_buyer(&self, buyer: Uuid) -> Result<Vec<Order>, StoreError>;

    /// Orders addressed to the seller, newest first.
    async fn list_for_seller(&self, seller: Uuid) -> Result<Vec<Order>, StoreError>;
}
