use uuid::Uuid;

use super::value_objects::{OrderStatus, PaymentMethod};
use crate::store::StoreError;

// ============================================================================
// Order Business Rule Errors
// ============================================================================
//
// Every failure carries a human-readable message and classifies into one of
// five kinds the HTTP layer maps onto status codes. Nothing is swallowed
// and nothing is retried here; version conflicts are the one transient
// storage error the engine retries before surfacing.
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("Product not found: {0}")]
    ProductNotFound(Uuid),

    #[error("Order not found: {0}")]
    OrderNotFound(Uuid),

    #[error("User not found: {0}")]
    UserNotFound(Uuid),

    #[error("Product is no longer available: {0}")]
    ProductUnavailable(Uuid),

    #[error("Shipping address is required")]
    EmptyShippingAddress,

    #[error("Unknown payment method: {0}")]
    UnknownPaymentMethod(String),

    #[error("Unknown order status: {0}")]
    UnknownStatus(String),

    #[error("Illegal status transition: {from} -> {to}")]
    IllegalTransition { from: OrderStatus, to: OrderStatus },

    #[error("Payment for {0} orders cannot be confirmed manually")]
    ManualConfirmNotAllowed(PaymentMethod),

    #[error("Not authorized to act on this order")]
    NotAuthorized,

    #[error("Storage failure: {0}")]
    Storage(#[from] StoreError),
}

/// Coarse classification consumed by the HTTP layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Forbidden,
    InvalidState,
    Internal,
}

impl OrderError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            OrderError::ProductNotFound(_)
            | OrderError::OrderNotFound(_)
            | OrderError::UserNotFound(_) => ErrorKind::NotFound,

            OrderError::EmptyShippingAddress
            | OrderError::UnknownPaymentMethod(_)
            | OrderError::UnknownStatus(_)
            | OrderError::ManualConfirmNotAllowed(_) => ErrorKind::Validation,

            OrderError::ProductUnavailable(_) | OrderError::IllegalTransition { .. } => {
                ErrorKind::InvalidState
            }

            OrderError::NotAuthorized => ErrorKind::Forbidden,

            OrderError::Storage(_) => ErrorKind::Internal,
        }
    }

    /// Status code the out-of-scope HTTP layer surfaces this error as.
    pub fn status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::Validation | ErrorKind::InvalidState => 400,
            ErrorKind::Forbidden => 403,
            ErrorKind::NotFound => 404,
            ErrorKind::Internal => 500,
        }
    }

    pub fn kind_label(&self) -> &'static str {
        match self.kind() {
            ErrorKind::Validation => "validation",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::InvalidState => "invalid_state",
            ErrorKind::Internal => "internal",
        }
    }
}
