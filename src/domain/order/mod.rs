// ============================================================================
// Order Domain - Business Logic for the Order Lifecycle
// ============================================================================
//
// This module contains ALL order-specific code:
// - Value objects (OrderStatus, PaymentMethod, PaymentStatus, PaymentDetails)
// - Derived pricing (frozen tax/shipping/total quote)
// - Commands (CreateOrder, UpdateStatus, ConfirmPayment)
// - Errors (OrderError enum with HTTP-facing kinds)
// - Entity (Order with the transition table)
// - Engine (orchestrates commands against the stores)
//
// ============================================================================

pub mod commands;
pub mod engine;
pub mod entity;
pub mod errors;
pub mod pricing;
pub mod value_objects;

// Re-export for convenience
pub use commands::*;
pub use engine::*;
pub use entity::*;
pub use errors::*;
pub use pricing::*;
pub use value_objects::*;
