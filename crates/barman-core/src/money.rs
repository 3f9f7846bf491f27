//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                         │
//! │                                                                     │
//! │  In floating point:                                                 │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                       │
//! │                                                                     │
//! │  A tab balance accumulated over hundreds of sales would drift.      │
//! │                                                                     │
//! │  OUR SOLUTION: Integer Kobo                                         │
//! │    Every amount is an i64 count of kobo (₦1 = 100 kobo).            │
//! │    The database, calculations, and API all use kobo.                │
//! │    Only the UI converts to naira for display.                       │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use barman_core::money::Money;
//!
//! // Create from kobo (preferred)
//! let price = Money::from_kobo(50_000); // ₦500.00
//!
//! // Arithmetic operations
//! let line_total = price.multiply_quantity(3);      // ₦1500.00
//! let total = line_total + Money::from_kobo(10_000); // ₦1600.00
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in kobo, the smallest Naira unit.
///
/// ## Design Decisions
/// - **i64 (signed)**: Allows negative values for corrections and deltas
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Derives**: Full serde support for JSON serialization
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from kobo (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use barman_core::money::Money;
    ///
    /// let price = Money::from_kobo(109_900); // Represents ₦1099.00
    /// assert_eq!(price.kobo(), 109_900);
    /// ```
    #[inline]
    pub const fn from_kobo(kobo: i64) -> Self {
        Money(kobo)
    }

    /// Returns the value in kobo (smallest currency unit).
    #[inline]
    pub const fn kobo(&self) -> i64 {
        self.0
    }

    /// Returns the major unit (naira) portion.
    #[inline]
    pub const fn naira(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit (kobo) portion (always 0-99).
    #[inline]
    pub const fn kobo_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies a unit price by a quantity to produce a line total.
    ///
    /// ## Example
    /// ```rust
    /// use barman_core::money::Money;
    ///
    /// let unit_cost = Money::from_kobo(29_900); // ₦299.00
    /// let line_total = unit_cost.multiply_quantity(3);
    /// assert_eq!(line_total.kobo(), 89_700); // ₦897.00
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Saturating addition, for aggregate sums that must not wrap.
    #[inline]
    pub const fn saturating_add(&self, other: Self) -> Self {
        Money(self.0.saturating_add(other.0))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows money in a human-readable format.
///
/// ## Note
/// This is for logs and debugging. The UI owns localized formatting.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}₦{}.{:02}", sign, self.naira().abs(), self.kobo_part())
    }
}

/// Default money is zero.
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

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_kobo() {
        let money = Money::from_kobo(109_999);
        assert_eq!(money.kobo(), 109_999);
        assert_eq!(money.naira(), 1099);
        assert_eq!(money.kobo_part(), 99);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_kobo(109_900)), "₦1099.00");
        assert_eq!(format!("{}", Money::from_kobo(550)), "₦5.50");
        assert_eq!(format!("{}", Money::from_kobo(-550)), "-₦5.50");
        assert_eq!(format!("{}", Money::from_kobo(0)), "₦0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_kobo(1000);
        let b = Money::from_kobo(500);

        assert_eq!((a + b).kobo(), 1500);
        assert_eq!((a - b).kobo(), 500);

        let mut c = a;
        c += b;
        assert_eq!(c.kobo(), 1500);
        c -= b;
        assert_eq!(c.kobo(), 1000);
    }

    #[test]
    fn test_multiply_quantity() {
        let unit_cost = Money::from_kobo(29_900);
        assert_eq!(unit_cost.multiply_quantity(3).kobo(), 89_700);
        assert_eq!(unit_cost.multiply_quantity(0).kobo(), 0);
    }

    #[test]
    fn test_zero_and_checks() {
        assert!(Money::zero().is_zero());
        assert!(!Money::from_kobo(100).is_zero());
        assert!(Money::from_kobo(-100).is_negative());
        assert!(!Money::from_kobo(100).is_negative());
        assert_eq!(Money::default(), Money::zero());
    }

    #[test]
    fn test_saturating_add() {
        let max = Money::from_kobo(i64::MAX);
        assert_eq!(max.saturating_add(Money::from_kobo(1)).kobo(), i64::MAX);
    }
}
