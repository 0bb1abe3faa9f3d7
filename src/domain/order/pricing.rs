use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

// ============================================================================
// Derived Pricing
// ============================================================================
//
// Every order freezes a price quote at purchase time: the product price is
// snapshotted, tax and total are derived once, and none of the three are
// ever recomputed — a later tax-rate change must not touch existing orders.
//
// ============================================================================

/// Flat sales tax rate applied at order creation.
pub const TAX_RATE: Decimal = dec!(0.08);

/// Flat shipping fee charged on every order.
pub const SHIPPING_FLAT: Decimal = dec!(5.00);

/// The frozen money columns of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quote {
    pub price: Decimal,
    pub tax: Decimal,
    pub shipping: Decimal,
    pub total: Decimal,
}

impl Quote {
    /// Derive tax and total from a snapshotted product price.
    ///
    /// tax   = round(price * 0.08, 2)
    /// total = round(price + shipping + tax, 2)
    pub fn for_price(price: Decimal) -> Self {
        let tax = round_money(price * TAX_RATE);
        let total = round_money(price + SHIPPING_FLAT + tax);
        Self {
            price,
            tax,
            shipping: SHIPPING_FLAT,
            total,
        }
    }

    /// The creation-time invariant, checkable at any point in the record's
    /// life because the fields are never recomputed.
    pub fn is_consistent(&self) -> bool {
        self.total == round_money(self.price + self.shipping + self.tax)
    }
}

/// Round to cents, half away from zero.
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worked_example_from_the_books() {
        // price 100.00 -> tax 8.00, shipping 5.00, total 113.00
        let quote = Quote::for_price(dec!(100.00));
        assert_eq!(quote.tax, dec!(8.00));
        assert_eq!(quote.shipping, dec!(5.00));
        assert_eq!(quote.total, dec!(113.00));
        assert!(quote.is_consistent());
    }

    #[test]
    fn test_tax_rounds_to_cents() {
        // 19.99 * 0.08 = 1.5992 -> 1.60
        let quote = Quote::for_price(dec!(19.99));
        assert_eq!(quote.tax, dec!(1.60));
        assert_eq!(quote.total, dec!(26.59));
    }

    #[test]
    fn test_tiny_price_taxes_to_zero() {
        // 0.01 * 0.08 = 0.0008 -> 0.00
        let quote = Quote::for_price(dec!(0.01));
        assert_eq!(quote.tax, dec!(0.00));
        assert_eq!(quote.total, dec!(5.01));
    }

    #[test]
    fn test_midpoint_rounds_away_from_zero() {
        // exact half-cent, e.g. price 0.8125 -> tax 0.065 -> 0.07
        assert_eq!(round_money(dec!(0.065)), dec!(0.07));
        assert_eq!(round_money(dec!(0.064)), dec!(0.06));
    }

    #[test]
    fn test_quote_is_internally_consistent_across_prices() {
        for price in [dec!(0.99), dec!(12.49), dec!(250.00), dec!(999.95)] {
            let quote = Quote::for_price(price);
            assert!(quote.is_consistent(), "inconsistent quote for {price}");
        }
    }
}
