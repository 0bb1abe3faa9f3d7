use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::order::Order;

// ============================================================================
// Shared Models
// ============================================================================
//
// Models that cross module boundaries: the identity collaborator's user
// record, the catalog collaborator's product record, and the summary/view
// types returned by enriched reads.
//
// Wire shape matters here: persisted field names are camelCase and enum
// values are snake_case, matching the stored data this engine must stay
// compatible with.
//
// ============================================================================

/// Role assigned by the identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Buyer,
    Seller,
    Admin,
}

impl Role {
    pub fn is_admin(self) -> bool {
        self == Role::Admin
    }
}

/// User record as resolved by the identity provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(name: impl Into<String>, email: impl Into<String>, role: Role) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            email: email.into(),
            role,
            created_at: Utc::now(),
        }
    }

    pub fn caller(&self) -> Caller {
        Caller {
            id: self.id,
            role: self.role,
        }
    }
}

/// The authenticated actor behind a request, as handed over by the
/// identity provider. Operations never look at anything beyond id + role.
#[derive(Debug, Clone, Copy)]
pub struct Caller {
    pub id: Uuid,
    pub role: Role,
}

/// Product record held by the catalog store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub title: String,
    pub price: Decimal,
    pub seller: Uuid,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
}

impl Product {
    pub fn new(title: impl Into<String>, price: Decimal, seller: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            price,
            seller,
            is_available: true,
            created_at: Utc::now(),
        }
    }
}

// ============================================================================
// Summaries & Views
// ============================================================================

/// Slim user projection embedded in enriched order reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
        }
    }
}

/// Slim product projection embedded in enriched order reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
    pub id: Uuid,
    pub title: String,
    pub price: Decimal,
}

impl From<&Product> for ProductSummary {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            title: product.title.clone(),
            price: product.price,
        }
    }
}

/// Order enriched with collaborator summaries, returned by GetOrder.
///
/// Summaries are optional: an unresolvable referent renders as absent
/// rather than failing the whole read.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    pub order: Order,
    pub product: Option<ProductSummary>,
    pub buyer: Option<UserSummary>,
    pub seller: Option<UserSummary>,
}
