use uuid::Uuid;

use super::value_objects::{OrderStatus, PaymentMethod};
use crate::models::Caller;

// ============================================================================
// Order Commands - Represent caller intent
// ============================================================================

/// Place an order for a product. The caller is the buyer.
#[derive(Debug, Clone)]
pub struct CreateOrder {
    pub buyer: Caller,
    pub product_id: Uuid,
    pub payment_method: PaymentMethod,
    pub shipping_address: String,
    /// Free-form method-specific input from the client, e.g. the raw card
    /// number for a credit-card order. Never stored as-is.
    pub payment_details: Option<serde_json::Value>,
}

/// Move an order along its delivery lifecycle. Seller or admin only.
#[derive(Debug, Clone)]
pub struct UpdateStatus {
    pub caller: Caller,
    pub order_id: Uuid,
    pub new_status: OrderStatus,
}

/// Mark a bank-transfer or cash order as paid. Seller or admin only.
#[derive(Debug, Clone)]
pub struct ConfirmPayment {
    pub caller: Caller,
    pub order_id: Uuid,
}
