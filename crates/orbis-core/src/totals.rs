//! # Order Totals
//!
//! Computes line totals, subtotal, tax and total for a sales order.
//!
//! ```text
//! lines ──► line_total = qty × unit_price   (exact, integer cents)
//!              │
//!              ▼
//!          subtotal = Σ line_total          (exact)
//!              │
//!              ▼
//!          tax = subtotal × rate            (half-up, the only rounding)
//!              │
//!              ▼
//!          total = subtotal + tax           (exact)
//! ```
//!
//! Every step is checked; a result outside the `i64` cent range is a
//! [`ValidationError::TooLarge`] naming the step, never a wrapped amount.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::TaxRate;

/// Quantity and frozen unit price of one order line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderLineAmount {
    pub quantity: i64,
    pub unit_price: Money,
}

impl OrderLineAmount {
    pub const fn new(quantity: i64, unit_price: Money) -> Self {
        OrderLineAmount {
            quantity,
            unit_price,
        }
    }
}

/// Header totals of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderTotals {
    pub subtotal: Money,
    pub tax: Money,
    pub total: Money,
}

/// Stateless totals calculator with an injected tax rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TotalsCalculator {
    tax_rate: TaxRate,
}

impl TotalsCalculator {
    pub const fn new(tax_rate: TaxRate) -> Self {
        TotalsCalculator { tax_rate }
    }

    pub const fn tax_rate(&self) -> TaxRate {
        self.tax_rate
    }

    /// `quantity × unit_price`.
    #[inline]
    pub fn line_total(&self, quantity: i64, unit_price: Money) -> Result<Money, ValidationError> {
        unit_price.checked_mul(quantity).ok_or_else(|| too_large("lineTotal"))
    }

    /// Totals for an ordered sequence of lines. An empty slice yields zeros.
    pub fn order_totals(&self, lines: &[OrderLineAmount]) -> Result<OrderTotals, ValidationError> {
        let mut subtotal = Money::zero();
        for line in lines {
            let line_total = self.line_total(line.quantity, line.unit_price)?;
            subtotal = subtotal
                .checked_add(line_total)
                .ok_or_else(|| too_large("subtotal"))?;
        }

        let tax = subtotal
            .calculate_tax(self.tax_rate)
            .ok_or_else(|| too_large("tax"))?;
        let total = subtotal.checked_add(tax).ok_or_else(|| too_large("total"))?;

        Ok(OrderTotals {
            subtotal,
            tax,
            total,
        })
    }
}

fn too_large(field: &str) -> ValidationError {
    ValidationError::TooLarge {
        field: field.to_string(),
    }
}

impl Default for TotalsCalculator {
    fn default() -> Self {
        TotalsCalculator::new(TaxRate::default())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_line_order() {
        let calc = TotalsCalculator::default();

        assert_eq!(calc.line_total(2, Money::from_cents(149_999)).unwrap().cents(), 299_998);
        assert_eq!(calc.line_total(4, Money::from_cents(32_950)).unwrap().cents(), 131_800);

        let totals = calc.order_totals(&[
            OrderLineAmount::new(2, Money::from_cents(149_999)),
            OrderLineAmount::new(4, Money::from_cents(32_950)),
        ])
        .unwrap();
        assert_eq!(totals.subtotal.cents(), 431_798);
        assert_eq!(totals.tax.cents(), 90_678);
        assert_eq!(totals.total.cents(), 522_476);
    }

    #[test]
    fn test_empty_order_is_zero() {
        let totals = TotalsCalculator::default().order_totals(&[]).unwrap();
        assert_eq!(totals, OrderTotals::default());
    }

    #[test]
    fn test_injected_rate() {
        let calc = TotalsCalculator::new(TaxRate::from_bps(825));
        let totals = calc
            .order_totals(&[OrderLineAmount::new(1, Money::from_cents(1000))])
            .unwrap();
        // 10.00 × 8.25% = 0.825 → 0.83
        assert_eq!(totals.tax.cents(), 83);
        assert_eq!(totals.total.cents(), 1083);

        let untaxed = TotalsCalculator::new(TaxRate::zero())
            .order_totals(&[OrderLineAmount::new(3, Money::from_cents(333))])
            .unwrap();
        assert_eq!(untaxed.tax, Money::zero());
        assert_eq!(untaxed.total.cents(), 999);
    }

    #[test]
    fn test_totals_add_up_for_many_inputs() {
        let calc = TotalsCalculator::default();

        for qty in 1..=12 {
            for price in (0..2_000).step_by(37) {
                let lines = [
                    OrderLineAmount::new(qty, Money::from_cents(price)),
                    OrderLineAmount::new(1, Money::from_cents(price + 5)),
                ];
                let totals = calc.order_totals(&lines).unwrap();

                assert_eq!(totals.subtotal.checked_add(totals.tax), Some(totals.total));

                // tax == round_half_up(subtotal × 0.21)
                let exact_times_100 = totals.subtotal.cents() * 21;
                let expected = (exact_times_100 + 50) / 100;
                assert_eq!(totals.tax.cents(), expected);
            }
        }
    }

    #[test]
    fn test_overflow_is_reported_not_wrapped() {
        let calc = TotalsCalculator::default();

        let err = calc.line_total(3, Money::from_cents(i64::MAX / 2)).unwrap_err();
        assert_eq!(err.field(), "lineTotal");

        // each line fits, their sum does not
        let half = Money::from_cents(i64::MAX / 2 + 1);
        let err = calc
            .order_totals(&[OrderLineAmount::new(1, half), OrderLineAmount::new(1, half)])
            .unwrap_err();
        assert_eq!(err.field(), "subtotal");

        // subtotal fits, subtotal + 21% does not
        let err = calc
            .order_totals(&[OrderLineAmount::new(1, Money::from_cents(i64::MAX - 10))])
            .unwrap_err();
        assert_eq!(err.field(), "total");
    }
}
