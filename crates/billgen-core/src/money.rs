//! # Money Module
//!
//! Provides the `Amount` type and the GST calculator.
//!
//! ## Precision Policy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  FULL PRECISION IN, TWO DECIMALS OUT                                    │
//! │                                                                         │
//! │  Stored and aggregated values keep full f64 precision:                 │
//! │    0.1 × 3 = 0.30000000000000004  (kept as-is in the bill)              │
//! │                                                                         │
//! │  Rounding to two decimals happens ONLY when an amount is displayed:     │
//! │    format!("{}", amount) → "0.30"                                       │
//! │                                                                         │
//! │  A persisted bill therefore carries exactly the numbers that were      │
//! │  computed at finalization, never a re-rounded copy.                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Calculator
//! ```text
//! line subtotal = price × quantity
//! line GST      = line subtotal × gst / 100
//! line total    = line subtotal + line GST
//!
//! subtotal      = Σ line subtotal
//! total GST     = Σ line GST
//! total amount  = subtotal + total GST
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub};
use ts_rs::TS;

use crate::types::{GstRate, Product};

// =============================================================================
// Amount Type
// =============================================================================

/// A monetary value in the major currency unit (rupees, dollars, ...).
///
/// ## Design Decisions
/// - **f64**: bills are computed in floating point; see the module docs
/// - **Single field tuple struct**: serializes as a bare JSON number, so the
///   persisted bill reads `"subtotal": 20` exactly like the browser format
/// - **Display rounds**: `Display` is the only place two-decimal rounding
///   happens
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Amount(f64);

impl Amount {
    /// Creates an amount from a value in the major unit.
    ///
    /// ## Example
    /// ```rust
    /// use billgen_core::money::Amount;
    ///
    /// let price = Amount::new(10.5);
    /// assert_eq!(price.value(), 10.5);
    /// ```
    #[inline]
    pub const fn new(value: f64) -> Self {
        Amount(value)
    }

    /// Returns the raw, unrounded value.
    #[inline]
    pub const fn value(&self) -> f64 {
        self.0
    }

    /// Returns zero.
    #[inline]
    pub const fn zero() -> Self {
        Amount(0.0)
    }

    /// Checks if the value is strictly positive.
    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0 > 0.0
    }

    /// Checks the value is neither NaN nor infinite.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.0.is_finite()
    }

    /// Returns the value rounded to two decimals (for display only).
    ///
    /// ## Example
    /// ```rust
    /// use billgen_core::money::Amount;
    ///
    /// assert_eq!(Amount::new(1.005_1).rounded(), 1.01);
    /// assert_eq!(Amount::new(0.1 * 3.0).rounded(), 0.3);
    /// ```
    pub fn rounded(&self) -> f64 {
        let rounded = (self.0 * 100.0).round() / 100.0;
        // Avoid printing "-0.00" for tiny negative noise
        if rounded == 0.0 {
            0.0
        } else {
            rounded
        }
    }

    /// Applies a GST percentage to this amount.
    ///
    /// ## Example
    /// ```rust
    /// use billgen_core::money::Amount;
    /// use billgen_core::types::GstRate;
    ///
    /// let subtotal = Amount::new(20.0);
    /// let gst = subtotal.gst(GstRate::from_percent(5.0));
    /// assert_eq!(gst.value(), 1.0);
    /// ```
    #[inline]
    pub fn gst(&self, rate: GstRate) -> Amount {
        Amount(self.0 * rate.percent() / 100.0)
    }

    /// Multiplies a unit price by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use billgen_core::money::Amount;
    ///
    /// let unit_price = Amount::new(2.5);
    /// assert_eq!(unit_price.multiply_quantity(3).value(), 7.5);
    /// ```
    #[inline]
    pub fn multiply_quantity(&self, qty: u32) -> Amount {
        Amount(self.0 * f64::from(qty))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Two-decimal display. Currency symbols are added by the presentation layer.
impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.rounded())
    }
}

impl From<f64> for Amount {
    fn from(value: f64) -> Self {
        Amount(value)
    }
}

impl Add for Amount {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Amount(self.0 + other.0)
    }
}

impl AddAssign for Amount {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Amount {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Amount(self.0 - other.0)
    }
}

impl Mul<u32> for Amount {
    type Output = Self;

    #[inline]
    fn mul(self, qty: u32) -> Self {
        self.multiply_quantity(qty)
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Self {
        iter.fold(Amount::zero(), |acc, amount| acc + amount)
    }
}

// =============================================================================
// Line Amounts
// =============================================================================

/// The computed amounts of a single line item.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct LineAmounts {
    /// `price × quantity`
    pub subtotal: Amount,
    /// `subtotal × gst / 100`
    pub gst: Amount,
    /// `subtotal + gst`
    pub total: Amount,
}

impl LineAmounts {
    /// Computes the amounts for a unit price, GST rate and quantity.
    pub fn compute(price: Amount, rate: GstRate, quantity: u32) -> Self {
        let subtotal = price.multiply_quantity(quantity);
        let gst = subtotal.gst(rate);
        LineAmounts {
            subtotal,
            gst,
            total: subtotal + gst,
        }
    }

    /// False once `price × quantity` or the GST on it overflows.
    pub fn is_finite(&self) -> bool {
        self.subtotal.is_finite() && self.gst.is_finite() && self.total.is_finite()
    }
}

/// Computes the amounts for one product.
///
/// ## Example
/// ```rust
/// use billgen_core::money::line_amounts;
/// use billgen_core::types::ProductInput;
///
/// let pen = ProductInput::new("Pen", 10.0, 5.0, 2).into_product("p-1");
/// let line = line_amounts(&pen);
/// assert_eq!(line.subtotal.value(), 20.0);
/// assert_eq!(line.gst.value(), 1.0);
/// assert_eq!(line.total.value(), 21.0);
/// ```
pub fn line_amounts(product: &Product) -> LineAmounts {
    LineAmounts::compute(product.price, product.gst, product.quantity)
}

// =============================================================================
// Bill Totals
// =============================================================================

/// Aggregates over a collection of line items.
///
/// ## Invariant
/// `total_amount == subtotal + total_gst`, computed once from the line sums.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct BillTotals {
    pub subtotal: Amount,
    #[serde(rename = "totalGST")]
    pub total_gst: Amount,
    pub total_amount: Amount,
}

impl BillTotals {
    /// False once a sum overflows.
    pub fn is_finite(&self) -> bool {
        self.subtotal.is_finite() && self.total_gst.is_finite() && self.total_amount.is_finite()
    }
}

/// Computes subtotal, total GST and total amount for a list of products.
///
/// An empty slice yields all-zero totals.
pub fn bill_totals(products: &[Product]) -> BillTotals {
    let lines: Vec<LineAmounts> = products.iter().map(line_amounts).collect();
    let subtotal: Amount = lines.iter().map(|l| l.subtotal).sum();
    let total_gst: Amount = lines.iter().map(|l| l.gst).sum();

    BillTotals {
        subtotal,
        total_gst,
        total_amount: subtotal + total_gst,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
