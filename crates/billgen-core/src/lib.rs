//! # billgen-core: Pure Business Logic for the Bill Generator
//!
//! This crate holds the bill arithmetic, identity rules, and validation as
//! pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Bill Generator Architecture                        │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Front end (CLI session / browser)               │   │
//! │  │    Shop form ──► Product form ──► Summary ──► Receipt           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 Bill controller (apps/billgen)                  │   │
//! │  │    add_product, update_product, generate_bill, back_to_generator│   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ billgen-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │ identity  │  │ validation│  │   │
//! │  │   │  Product  │  │  Amount   │  │  bill no. │  │   rules   │  │   │
//! │  │   │   Bill    │  │ BillTotals│  │  uuid v4  │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO STORAGE • NO RENDERING • PURE FUNCTIONS          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 billgen-store (History Store)                   │   │
//! │  │            key-value backends, versioned bill history           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, ShopDetails, Bill)
//! - [`money`] - Amount type and the GST calculator
//! - [`identity`] - Bill ids and bill numbers
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Example Usage
//!
//! ```rust
//! use billgen_core::money::bill_totals;
//! use billgen_core::types::ProductInput;
//!
//! let pen = ProductInput::new("Pen", 10.0, 5.0, 2).into_product("p-1");
//! let totals = bill_totals(&[pen]);
//!
//! assert_eq!(totals.subtotal.to_string(), "20.00");
//! assert_eq!(totals.total_gst.to_string(), "1.00");
//! assert_eq!(totals.total_amount.to_string(), "21.00");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod identity;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::{Amount, BillTotals, LineAmounts};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Prefix of every human-readable bill number (`BILL-20240115-143052`).
pub const BILL_NUMBER_PREFIX: &str = "BILL";

/// Highest GST percentage accepted on a line item.
pub const MAX_GST_PERCENT: f64 = 100.0;

/// Smallest quantity a line item may carry.
pub const MIN_QUANTITY: u32 = 1;
