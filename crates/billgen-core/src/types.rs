//! # Domain Types
//!
//! Core domain types used throughout the bill generator.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Bill       │   │  ShopDetails    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  name           │       │
//! │  │  name           │   │  billNumber     │   │  location       │       │
//! │  │  price          │   │  date           │   │  phone?         │       │
//! │  │  gst (%)        │   │  products[]     │   │  email?         │       │
//! │  │  quantity       │   │  totals         │   └─────────────────┘       │
//! │  └─────────────────┘   └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! A bill has:
//! - `id`: UUID v4 - immutable, authoritative key for history operations
//! - `bill_number`: `BILL-YYYYMMDD-HHMMSS` - human-readable, may repeat
//!   within the same second
//!
//! ## Wire Names
//! Serialized field names follow the browser storage format
//! (`billNumber`, `shopDetails`, `totalGST`, ...) so existing histories load.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::identity::BillIdentity;
use crate::money::{bill_totals, line_amounts, Amount, BillTotals, LineAmounts};

// =============================================================================
// GST Rate
// =============================================================================

/// GST rate as a percentage of the line subtotal (`5.0` = 5%).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GstRate(f64);

impl GstRate {
    /// Creates a rate from a percentage.
    #[inline]
    pub const fn from_percent(percent: f64) -> Self {
        GstRate(percent)
    }

    /// Returns the rate as a percentage.
    #[inline]
    pub const fn percent(&self) -> f64 {
        self.0
    }

    /// Zero rate.
    #[inline]
    pub const fn zero() -> Self {
        GstRate(0.0)
    }

    /// Checks if the rate is zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0 == 0.0
    }
}

// =============================================================================
// Product
// =============================================================================

/// Product fields as entered by the user, before an id is assigned.
///
/// Also the payload of an update: every field except `id` is replaced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductInput {
    pub name: String,
    pub price: Amount,
    pub gst: GstRate,
    pub quantity: u32,
}

impl ProductInput {
    /// Creates product input from plain values.
    pub fn new(name: impl Into<String>, price: f64, gst_percent: f64, quantity: u32) -> Self {
        ProductInput {
            name: name.into(),
            price: Amount::new(price),
            gst: GstRate::from_percent(gst_percent),
            quantity,
        }
    }

    /// Attaches an id, producing a line item.
    pub fn into_product(self, id: impl Into<String>) -> Product {
        Product {
            id: id.into(),
            name: self.name,
            price: self.price,
            gst: self.gst,
            quantity: self.quantity,
        }
    }
}

/// A line item on a bill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4), assigned on creation.
    pub id: String,

    /// Name printed on the receipt.
    pub name: String,

    /// Unit price.
    pub price: Amount,

    /// GST percentage for this line.
    pub gst: GstRate,

    /// Units sold.
    pub quantity: u32,
}

impl Product {
    /// Returns subtotal, GST and total for this line.
    #[inline]
    pub fn amounts(&self) -> LineAmounts {
        line_amounts(self)
    }

    /// Replaces every field except `id`.
    pub fn apply(&mut self, input: ProductInput) {
        self.name = input.name;
        self.price = input.price;
        self.gst = input.gst;
        self.quantity = input.quantity;
    }
}

// =============================================================================
// Shop Details
// =============================================================================

/// The shop printed in the receipt header.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ShopDetails {
    pub name: String,
    pub location: String,
    pub phone: Option<String>,
    pub email: Option<String>,
}

impl ShopDetails {
    /// Creates shop details with the two required fields.
    pub fn new(name: impl Into<String>, location: impl Into<String>) -> Self {
        ShopDetails {
            name: name.into(),
            location: location.into(),
            phone: None,
            email: None,
        }
    }

    /// Sets the phone number (blank input clears it).
    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = non_blank(phone.into());
        self
    }

    /// Sets the email address (blank input clears it).
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = non_blank(email.into());
        self
    }
}

/// Maps blank optional text to `None`.
pub fn non_blank(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

// =============================================================================
// Bill
// =============================================================================

/// A finalized bill.
///
/// ## Snapshot Pattern
/// Shop details and products are copied in at finalization and the totals
/// are stored, not recomputed. Later changes to the draft or to the
/// calculation rules never alter a stored bill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Bill {
    /// Authoritative key (UUID v4).
    pub id: String,

    /// Human-readable number, e.g. `BILL-20240115-143052`.
    pub bill_number: String,

    /// Finalization timestamp.
    #[ts(as = "String")]
    pub date: DateTime<Utc>,

    pub shop_details: ShopDetails,

    /// Line items in insertion order.
    pub products: Vec<Product>,

    pub subtotal: Amount,

    #[serde(rename = "totalGST")]
    pub total_gst: Amount,

    pub total_amount: Amount,
}

impl Bill {
    /// Assembles a bill from freshly minted identity and draft snapshots.
    ///
    /// Totals are computed here, once.
    pub fn assemble(identity: BillIdentity, shop_details: ShopDetails, products: Vec<Product>) -> Self {
        let totals = bill_totals(&products);
        Bill {
            id: identity.id,
            bill_number: identity.bill_number,
            date: identity.date,
            shop_details,
            products,
            subtotal: totals.subtotal,
            total_gst: totals.total_gst,
            total_amount: totals.total_amount,
        }
    }

    /// Returns the stored totals.
    pub fn totals(&self) -> BillTotals {
        BillTotals {
            subtotal: self.subtotal,
            total_gst: self.total_gst,
            total_amount: self.total_amount,
        }
    }

    /// True when every stored number is finite, so the bill survives a
    /// JSON round trip.
    pub fn has_finite_amounts(&self) -> bool {
        self.totals().is_finite()
            && self
                .products
                .iter()
                .all(|p| p.price.is_finite() && p.gst.percent().is_finite())
    }

    /// Number of line items.
    pub fn item_count(&self) -> usize {
        self.products.len()
    }

    /// Line items paired with their computed amounts.
    pub fn lines(&self) -> impl Iterator<Item = (&Product, LineAmounts)> {
        self.products.iter().map(|p| (p, p.amounts()))
    }

    /// Case-insensitive match on bill number or shop name.
    ///
    /// A blank term matches every bill.
    pub fn matches_search(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return true;
        }
        self.bill_number.to_lowercase().contains(&term)
            || self.shop_details.name.to_lowercase().contains(&term)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
