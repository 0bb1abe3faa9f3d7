use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::OrderError;
use super::pricing::Quote;
use super::value_objects::{OrderStatus, PaymentDetails, PaymentMethod, PaymentStatus};
use crate::models::{Caller, Product};

// ============================================================================
// Order Entity - Domain Logic
// ============================================================================
//
// An order is a frozen purchase record: product, buyer, seller and all
// money columns are fixed at creation. Only `status`, `payment_status`,
// `updated_at` and the concurrency token ever change, and only through the
// methods below.
//
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    // Identity & references (immutable after creation)
    pub id: Uuid,
    pub product: Uuid,
    pub buyer: Uuid,
    pub seller: Uuid,

    // Frozen price quote
    pub price: Decimal,
    pub tax: Decimal,
    pub shipping: Decimal,
    pub total: Decimal,

    // Lifecycle
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub payment_details: PaymentDetails,

    pub shipping_address: String,

    // Audit trail
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    // Optimistic concurrency token, a storage concern kept off the wire
    #[serde(skip)]
    pub version: u64,
}

impl Order {
    /// Build a new order against an available product.
    ///
    /// Snapshots price and seller from the product, derives the money
    /// columns, and branches on the payment method to settle the initial
    /// payment state. The address must already be validated by the caller.
    pub fn create(
        buyer: Caller,
        product: &Product,
        payment_method: PaymentMethod,
        shipping_address: String,
        payment_input: Option<&serde_json::Value>,
    ) -> Self {
        let quote = Quote::for_price(product.price);
        let now = Utc::now();

        let status = if payment_method == PaymentMethod::Cod {
            OrderStatus::PendingDelivery
        } else {
            OrderStatus::PendingPayment
        };

        let (payment_status, payment_details) =
            settle_initial_payment(payment_method, &shipping_address, payment_input);

        Self {
            id: Uuid::now_v7(),
            product: product.id,
            buyer: buyer.id,
            seller: product.seller,
            price: quote.price,
            tax: quote.tax,
            shipping: quote.shipping,
            total: quote.total,
            status,
            payment_method,
            payment_status,
            payment_details,
            shipping_address,
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }

    /// Move the order to `next` per the transition table.
    ///
    /// Cash orders auto-settle on delivery: the courier collected the money.
    pub fn transition(&mut self, next: OrderStatus) -> Result<(), OrderError> {
        if !self.status.can_transition_to(next) {
            return Err(OrderError::IllegalTransition {
                from: self.status,
                to: next,
            });
        }

        self.status = next;
        if next == OrderStatus::Delivered && self.payment_method == PaymentMethod::Cod {
            self.payment_status = PaymentStatus::Paid;
        }
        self.touch();
        Ok(())
    }

    /// Manually mark the payment as received.
    ///
    /// Only bank-transfer and cash orders qualify; credit-card orders were
    /// settled by the gateway at creation. Idempotent: confirming an
    /// already-paid order is a no-op success and returns `false`.
    pub fn confirm_payment(&mut self) -> Result<bool, OrderError> {
        if !self.payment_method.is_manually_confirmable() {
            return Err(OrderError::ManualConfirmNotAllowed(self.payment_method));
        }
        if self.payment_status == PaymentStatus::Paid {
            return Ok(false);
        }

        self.payment_status = PaymentStatus::Paid;
        self.touch();
        Ok(true)
    }

    pub fn can_be_managed_by(&self, caller: Caller) -> bool {
        caller.id == self.seller || caller.role.is_admin()
    }

    pub fn can_be_viewed_by(&self, caller: Caller) -> bool {
        caller.id == self.buyer || self.can_be_managed_by(caller)
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
        self.version += 1;
    }
}

/// Initial payment state per method.
///
/// The credit-card branch stands in for a payment gateway and must be
/// replaced by a real authorization call before anything ships; a real
/// gateway would never auto-mark the order paid here.
fn settle_initial_payment(
    method: PaymentMethod,
    shipping_address: &str,
    input: Option<&serde_json::Value>,
) -> (PaymentStatus, PaymentDetails) {
    match method {
        PaymentMethod::CreditCard => {
            let raw_card = input
                .and_then(|v| v.get("cardNumber"))
                .and_then(|v| v.as_str());
            (
                PaymentStatus::Paid,
                PaymentDetails::CreditCard {
                    transaction_id: format!("txn_{}", Uuid::new_v4().simple()),
                    card_number: mask_card_number(raw_card),
                },
            )
        }
        PaymentMethod::Cod => (
            PaymentStatus::Pending,
            PaymentDetails::CashOnDelivery {
                delivery_address: shipping_address.to_string(),
            },
        ),
        PaymentMethod::BankTransfer => (
            PaymentStatus::Pending,
            PaymentDetails::BankTransfer {
                reference: bank_reference(),
            },
        ),
        PaymentMethod::Other => (PaymentStatus::Pending, PaymentDetails::None {}),
    }
}

/// Keep at most the last 4 digits; everything else becomes asterisks.
/// Raw card numbers must never survive past this point.
fn mask_card_number(raw: Option<&str>) -> String {
    let digits: String = raw
        .unwrap_or_default()
        .chars()
        .filter(|c| c.is_ascii_digit())
        .collect();

    if digits.is_empty() {
        return "****".to_string();
    }

    let tail = &digits[digits.len().saturating_sub(4)..];
    format!("****{tail}")
}

/// Human-readable reference the buyer quotes on the wire transfer.
fn bank_reference() -> String {
    let token = Uuid::new_v4().simple().to_string();
    format!("BT-{}", token[..10].to_uppercase())
}
