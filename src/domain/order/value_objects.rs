use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::errors::OrderError;

// ============================================================================
// Order Value Objects
// ============================================================================
//
// Wire values are snake_case strings; they must stay bit-for-bit compatible
// with stored order records.
//
// ============================================================================

/// Delivery lifecycle of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    PendingPayment,
    PendingDelivery,
    Shipped,
    Delivered,
    Cancelled,
    Returned,
}

impl OrderStatus {
    /// Transition table for the delivery lifecycle.
    ///
    /// The table tracks forward delivery progress with two terminal
    /// outcomes; anything not listed here is rejected.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (PendingPayment, PendingDelivery)
                | (PendingPayment, Cancelled)
                | (PendingDelivery, Shipped)
                | (PendingDelivery, Cancelled)
                | (Shipped, Delivered)
                | (Shipped, Returned)
                | (Delivered, Returned)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Cancelled | OrderStatus::Returned)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::PendingPayment => "pending_payment",
            OrderStatus::PendingDelivery => "pending_delivery",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Returned => "returned",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending_payment" => Ok(OrderStatus::PendingPayment),
            "pending_delivery" => Ok(OrderStatus::PendingDelivery),
            "shipped" => Ok(OrderStatus::Shipped),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" => Ok(OrderStatus::Cancelled),
            "returned" => Ok(OrderStatus::Returned),
            other => Err(OrderError::UnknownStatus(other.to_string())),
        }
    }
}

/// How the buyer pays. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    CreditCard,
    BankTransfer,
    Cod,
    Other,
}

impl PaymentMethod {
    /// Credit-card orders are settled by the (simulated) gateway at
    /// creation; only transfer and cash orders take a manual confirmation.
    pub fn is_manually_confirmable(self) -> bool {
        matches!(self, PaymentMethod::BankTransfer | PaymentMethod::Cod)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PaymentMethod::CreditCard => "credit_card",
            PaymentMethod::BankTransfer => "bank_transfer",
            PaymentMethod::Cod => "cod",
            PaymentMethod::Other => "other",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "credit_card" => Ok(PaymentMethod::CreditCard),
            "bank_transfer" => Ok(PaymentMethod::BankTransfer),
            "cod" => Ok(PaymentMethod::Cod),
            "other" => Ok(PaymentMethod::Other),
            unknown => Err(OrderError::UnknownPaymentMethod(unknown.to_string())),
        }
    }
}

/// Settlement state of the payment, mutable after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Refunded,
    Failed,
}

/// Method-specific payment metadata, set once at creation.
///
/// A closed variant per method prevents cross-method field leakage, but the
/// untagged serialization keeps the wire shape a plain string-keyed map as
/// stored records expect. Card numbers are always masked before they reach
/// this type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PaymentDetails {
    CreditCard {
        #[serde(rename = "transactionId")]
        transaction_id: String,
        #[serde(rename = "cardNumber")]
        card_number: String,
    },
    BankTransfer {
        reference: String,
    },
    CashOnDelivery {
        #[serde(rename = "deliveryAddress")]
        delivery_address: String,
    },
    None {},
}
