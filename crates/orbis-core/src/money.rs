//! # Money
//!
//! Amounts are whole cents in an `i64`.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Where rounding happens                                                 │
//! │                                                                         │
//! │  "1499.99" ──parse_decimal──► 149_999 ¢     exact, >2 decimals rejected │
//! │  149_999 ¢ × 2              ► 299_998 ¢     exact                       │
//! │  Σ lines                    ► 431_798 ¢     exact                       │
//! │  431_798 ¢ × 21%            ►  90_678 ¢     half-up, the only rounding  │
//! │                                                                         │
//! │  With binary floats 1.005 × 100 = 100.4999…, so every step would need  │
//! │  an epsilon before round(). Cents never do.                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ```rust
//! use orbis_core::money::Money;
//!
//! let line = Money::from_cents(149_999).checked_mul(2).unwrap();
//! assert_eq!(line.to_string(), "2999.98");
//! assert_eq!(Money::parse_decimal("329,50").unwrap().cents(), 32_950);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::types::TaxRate;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (cents).
///
/// The currency itself lives on the order; `Money` is only the amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Parses a decimal amount typed by a user into cents.
    ///
    /// ## Rules
    /// - Accepts `.` or `,` as the decimal separator
    /// - At most two fractional digits (no silent rounding of input)
    /// - Leading `-` is accepted; range checks belong to validation
    ///
    /// ## Example
    /// ```rust
    /// use orbis_core::money::Money;
    ///
    /// assert_eq!(Money::parse_decimal("1499.99").unwrap().cents(), 149_999);
    /// assert_eq!(Money::parse_decimal("12").unwrap().cents(), 1_200);
    /// assert_eq!(Money::parse_decimal("0.5").unwrap().cents(), 50);
    /// assert!(Money::parse_decimal("1.999").is_err());
    /// assert!(Money::parse_decimal("abc").is_err());
    /// ```
    pub fn parse_decimal(input: &str) -> Result<Self, ValidationError> {
        let invalid = |reason: &str| ValidationError::InvalidFormat {
            field: "amount".to_string(),
            reason: reason.to_string(),
        };

        let normalized = input.trim().replace(',', ".");
        let (negative, digits) = match normalized.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, normalized.as_str()),
        };

        let (major_str, minor_str) = match digits.split_once('.') {
            Some((major, minor)) => (major, minor),
            None => (digits, ""),
        };

        if major_str.is_empty() && minor_str.is_empty() {
            return Err(invalid("must be a number"));
        }
        if !major_str.chars().all(|c| c.is_ascii_digit())
            || !minor_str.chars().all(|c| c.is_ascii_digit())
        {
            return Err(invalid("must be a number"));
        }
        if minor_str.len() > 2 {
            return Err(invalid("at most two decimal places"));
        }

        let major: i64 = if major_str.is_empty() {
            0
        } else {
            major_str.parse().map_err(|_| invalid("number too large"))?
        };
        let minor: i64 = match minor_str.len() {
            0 => 0,
            1 => minor_str.parse::<i64>().map_err(|_| invalid("must be a number"))? * 10,
            _ => minor_str.parse().map_err(|_| invalid("must be a number"))?,
        };

        let cents = major
            .checked_mul(100)
            .and_then(|c| c.checked_add(minor))
            .ok_or_else(|| invalid("number too large"))?;

        Ok(Money(if negative { -cents } else { cents }))
    }

    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion (truncated toward zero).
    #[inline]
    pub const fn major_units(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor_units(&self) -> i64 {
        (self.0 % 100).abs()
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// `self + other`, or `None` when the sum leaves the `i64` range.
    #[inline]
    pub const fn checked_add(self, other: Money) -> Option<Money> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// `self × qty`, or `None` on overflow.
    #[inline]
    pub const fn checked_mul(self, qty: i64) -> Option<Money> {
        match self.0.checked_mul(qty) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Calculates tax at the given rate, rounding half-up to the cent.
    ///
    /// ## Implementation
    /// Integer math: `(amount * bps + 5000) / 10000`.
    /// The +5000 provides rounding (5000/10000 = 0.5). Amounts here are
    /// never negative (subtotals of non-negative lines), so half-up and
    /// half-away-from-zero coincide.
    ///
    /// Returns `None` when the tax does not fit in an `i64`, which only a
    /// rate above 100% can cause.
    ///
    /// ## Example
    /// ```rust
    /// use orbis_core::money::Money;
    /// use orbis_core::types::TaxRate;
    ///
    /// let subtotal = Money::from_cents(431_798); // 4317.98
    /// let tax = subtotal.calculate_tax(TaxRate::from_bps(2100)).unwrap();
    /// // 4317.98 × 21% = 906.7758 → 906.78
    /// assert_eq!(tax.cents(), 90_678);
    /// ```
    pub fn calculate_tax(&self, rate: TaxRate) -> Option<Money> {
        // i128 prevents overflow on large amounts
        let tax_cents = (self.0 as i128 * rate.bps() as i128 + 5000) / 10000;
        i64::try_from(tax_cents).ok().map(Money::from_cents)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Plain `major.minor` rendering; currency symbols are a presentation concern.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}{}.{:02}",
            sign,
            self.major_units().abs(),
            self.minor_units()
        )
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
