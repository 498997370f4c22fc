//! # Money Module
//!
//! Provides the `Money` type for handling rupee amounts safely.
//!
//! ## Why Decimal, and Why Round Once?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE COMPOUNDING ROUNDING PROBLEM                                       │
//! │                                                                         │
//! │  Three lines of ₹3.33 at 5% GST:                                        │
//! │    round each line:  0.17 + 0.17 + 0.17 = ₹0.51   ❌ drifts             │
//! │    sum, then round:  0.1665 × 3 = 0.4995 → ₹0.50  ✅                    │
//! │                                                                         │
//! │  OUR SOLUTION: exact decimal arithmetic everywhere,                     │
//! │  2-digit rounding ONLY when a figure is shown to a human.               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use checkout_core::money::Money;
//!
//! let price = Money::from_major(1000);        // ₹1000
//! let line = price.checked_multiply_quantity(2).unwrap(); // ₹2000
//! assert_eq!(line, Money::from_paise(200_000));
//! assert_eq!(line.to_string(), "₹2000.00");
//! ```

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub, SubAssign};
use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::types::GstRate;

/// Number of fraction digits shown to customers.
pub const DISPLAY_FRACTION_DIGITS: u32 = 2;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in major units (rupees), backed by an exact decimal.
///
/// ## Design Decisions
/// - **Decimal, not f64**: `0.1 + 0.2` is exactly `0.3`
/// - **Unrounded arithmetic**: products and sums keep full precision
/// - **Serialized as a string**: `"1888.00"` survives JSON round-trips
///
/// ## Where Money Flows
/// ```text
/// ProductPricing.base_price ──► PricedLine.unit_price ──► line_subtotal
///                                                     └─► line_tax
///
/// Σ line_subtotal ──► OrderTotals.subtotal ──┐
/// Σ line_tax      ──► OrderTotals.tax_total ─┼──► grand_total ──► rounded()
/// shipping + COD  ───────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(#[ts(as = "String")] Decimal);

impl Money {
    /// Zero rupees.
    pub const ZERO: Money = Money(Decimal::ZERO);

    /// Wraps an exact decimal amount.
    #[inline]
    pub const fn new(amount: Decimal) -> Self {
        Money(amount)
    }

    /// Creates a value from whole rupees.
    ///
    /// ```rust
    /// use checkout_core::money::Money;
    ///
    /// assert_eq!(Money::from_major(50).to_string(), "₹50.00");
    /// ```
    #[inline]
    pub fn from_major(rupees: i64) -> Self {
        Money(Decimal::from(rupees))
    }

    /// Creates a value from paise (1/100 rupee).
    ///
    /// ```rust
    /// use checkout_core::money::Money;
    ///
    /// assert_eq!(Money::from_paise(1099).to_string(), "₹10.99");
    /// ```
    #[inline]
    pub fn from_paise(paise: i64) -> Self {
        Money(Decimal::new(paise, 2))
    }

    /// Returns the exact decimal amount.
    #[inline]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money::ZERO
    }

    /// Checks if the value is zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Checks if the value is greater than zero.
    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Checks if the value is below zero.
    #[inline]
    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// Multiplies a unit price by a quantity.
    ///
    /// `None` when the product does not fit in a `Decimal`.
    ///
    /// ```rust
    /// use checkout_core::money::Money;
    ///
    /// let unit = Money::from_paise(29_999);
    /// assert_eq!(unit.checked_multiply_quantity(3), Some(Money::from_paise(89_997)));
    /// ```
    #[inline]
    pub fn checked_multiply_quantity(&self, quantity: u32) -> Option<Money> {
        self.0.checked_mul(Decimal::from(quantity)).map(Money)
    }

    /// Applies a percentage rate without rounding.
    ///
    /// `₹1600 × 18%` is exactly `₹288`; `₹3.33 × 5%` stays `₹0.1665` until
    /// it is displayed. `None` on overflow.
    ///
    /// ```rust
    /// use checkout_core::money::Money;
    /// use checkout_core::types::GstRate;
    ///
    /// let tax = Money::from_major(1600).checked_percentage(GstRate::from_whole(18));
    /// assert_eq!(tax, Some(Money::from_major(288)));
    /// ```
    pub fn checked_percentage(&self, rate: GstRate) -> Option<Money> {
        self.0
            .checked_mul(rate.percent())
            .and_then(|scaled| scaled.checked_div(Decimal::ONE_HUNDRED))
            .map(Money)
    }

    /// Adds two amounts, `None` on overflow.
    #[inline]
    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    /// Sums amounts, `None` on overflow.
    pub fn checked_sum<I>(amounts: I) -> Option<Money>
    where
        I: IntoIterator<Item = Money>,
    {
        amounts.into_iter().try_fold(Money::ZERO, Money::checked_add)
    }

    /// Halves the amount exactly (used for the CGST/SGST split).
    pub fn half(&self) -> Money {
        Money(self.0 / Decimal::from(2))
    }

    /// Rounds to 2 fraction digits, half away from zero.
    ///
    /// Call this once on a final figure. Never feed the result back into
    /// further arithmetic.
    ///
    /// ```rust
    /// use checkout_core::money::Money;
    ///
    /// assert_eq!(Money::from_paise(4995).rounded(), Money::from_paise(4995));
    /// assert_eq!("0.4995".parse::<Money>().unwrap().rounded(), Money::from_paise(50));
    /// ```
    pub fn rounded(&self) -> Money {
        Money(
            self.0
                .round_dp_with_strategy(DISPLAY_FRACTION_DIGITS, RoundingStrategy::MidpointAwayFromZero),
        )
    }

    /// Formats the rounded amount with the given currency symbol.
    pub fn format_with(&self, symbol: &str) -> String {
        let rounded = self.rounded().0;
        let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
            "-"
        } else {
            ""
        };
        format!("{}{}{:.2}", sign, symbol, rounded.abs())
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Rupee display, rounded to 2 fraction digits.
///
/// ## Note
/// Shops with another currency symbol should go through
/// `PricingConfig::format`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_with("₹"))
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::ZERO
    }
}

impl FromStr for Money {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s.trim()).map(Money)
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Money(amount)
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.fold(Money::ZERO, |acc, m| acc + *m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
