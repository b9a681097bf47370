//! # Money Module
//!
//! Provides the `Money` type for prices, line totals and invoice totals.
//!
//! ## Why Exact Decimals?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    25.50 × 0.15 = 3.8249999999999997  ❌ WRONG!                         │
//! │                                                                         │
//! │  Invoice totals must add up exactly:                                    │
//! │    subtotal 25.50 + tax 3.825 = grand total 29.325                      │
//! │                                                                         │
//! │  OUR SOLUTION: base-10 decimals (rust_decimal)                          │
//! │    No binary rounding, no silently lost fractions                       │
//! │    Rounding happens only when a value is displayed                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use medora_core::money::Money;
//!
//! let price = Money::from_cents(550);         // 5.50
//! let doubled = price * 2;                    // 11.00
//! let total = price + Money::from_cents(1000); // 15.50
//! assert_eq!(total.to_string(), "SAR 15.50");
//! ```

use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

/// Currency shown by [`Money`]'s `Display` implementation.
pub const CURRENCY_CODE: &str = "SAR";

// =============================================================================
// Money Type
// =============================================================================

/// A monetary amount in the portal's currency.
///
/// ## Where Money is Used
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Product.price ──► LineItem.unit_price ──► LineItem.line_total          │
/// │                                                                         │
/// │  Σ line_total ──► subtotal ──► tax (15%) ──► grand_total                │
/// │                                                                         │
/// │  Pharmacy.balance / balance_limit, Statement amounts                   │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
///
/// Serializes as a decimal string so no precision is lost. Deserialization
/// accepts JSON numbers and numeric strings, as the API sends either.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Creates a Money value from minor units (halalas / cents).
    ///
    /// ```rust
    /// use medora_core::money::Money;
    ///
    /// let price = Money::from_cents(1099);
    /// assert_eq!(price.to_string(), "SAR 10.99");
    /// ```
    #[inline]
    pub fn from_cents(cents: i64) -> Self {
        Money(Decimal::new(cents, 2))
    }

    /// Parses a decimal string such as `"5.50"`.
    ///
    /// ```rust
    /// use medora_core::money::Money;
    ///
    /// assert_eq!(Money::parse("5.50").unwrap(), Money::from_cents(550));
    /// assert!(Money::parse("five").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self, rust_decimal::Error> {
        Decimal::from_str(s.trim()).map(Money)
    }

    /// Returns the exact underlying decimal.
    #[inline]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(Decimal::ZERO)
    }

    /// Checks if the value is zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Calculates tax at the given rate, exactly.
    ///
    /// No rounding is applied: `25.50` at 15% is `3.825`, and adding it to
    /// the subtotal gives `29.325`. Rounding is a display concern.
    ///
    /// ```rust
    /// use medora_core::money::{Money, TaxRate};
    ///
    /// let tax = Money::from_cents(2550).calculate_tax(TaxRate::from_bps(1500));
    /// assert_eq!(tax, Money::parse("3.825").unwrap());
    /// ```
    pub fn calculate_tax(&self, rate: TaxRate) -> Money {
        Money(self.0 * rate.as_fraction())
    }

    /// Multiplies a unit price by a quantity.
    ///
    /// ## User Workflow
    /// ```text
    /// Product: Panadol 500mg  10.00
    /// Quantity: 2
    ///      │
    ///      ▼
    /// multiply_quantity(2) ← THIS FUNCTION
    ///      │
    ///      ▼
    /// Line Total: 20.00
    /// ```
    #[inline]
    pub fn multiply_quantity(&self, qty: u32) -> Self {
        Money(self.0 * Decimal::from(qty))
    }

    /// Rounds to two decimal places (half away from zero) for display.
    pub fn rounded(&self) -> Money {
        let mut rounded = self
            .0
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        rounded.rescale(2);
        Money(rounded)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Shows the amount rounded to two places with the currency code.
///
/// The UI formats localized currency itself; this is for logs and tests.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", CURRENCY_CODE, self.rounded().0)
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
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

impl Mul<u32> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: u32) -> Self {
        self.multiply_quantity(qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + *m)
    }
}

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// 1 basis point = 0.01%, so 1500 bps = 15%.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Returns the rate as an exact fraction (1500 bps → 0.15).
    #[inline]
    pub fn as_fraction(&self) -> Decimal {
        Decimal::new(i64::from(self.0), 4)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
