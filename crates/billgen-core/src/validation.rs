//! # Validation Module
//!
//! Input validation for line items, shop details and whole drafts.
//!
//! ## When Each Rule Runs
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Points                                  │
//! │                                                                         │
//! │  Add / update product                                                  │
//! │  └── validate_product_input()  name, price > 0, gst 0..=100, qty >= 1, │
//! │                                 line total finite                       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Edit shop details                                                     │
//! │  └── (nothing: every keystroke is accepted)                            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Generate bill                                                         │
//! │  └── validate_bill_draft()   shop name + location, >= 1 product,       │
//! │                               bill totals finite                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use billgen_core::types::ProductInput;
//! use billgen_core::validation::validate_product_input;
//!
//! assert!(validate_product_input(&ProductInput::new("Pen", 10.0, 5.0, 2)).is_ok());
//! assert!(validate_product_input(&ProductInput::new("Pen", 0.0, 5.0, 2)).is_err());
//! ```

use crate::error::ValidationError;
use crate::money::{bill_totals, Amount, LineAmounts};
use crate::types::{GstRate, Product, ProductInput, ShopDetails};
use crate::{MAX_GST_PERCENT, MIN_QUANTITY};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Field Validators
// =============================================================================

/// Validates a required text field (blank after trimming is missing).
pub fn validate_required(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::required(field));
    }
    Ok(())
}

/// Validates a unit price.
///
/// ## Rules
/// - Must be a finite number
/// - Must be strictly positive (a zero price is never added to a bill)
pub fn validate_price(price: Amount) -> ValidationResult<()> {
    if !price.value().is_finite() {
        return Err(ValidationError::NotFinite {
            field: "price".to_string(),
        });
    }

    if !price.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "price".to_string(),
        });
    }

    Ok(())
}

/// Validates a GST percentage.
///
/// ## Rules
/// - Must be a finite number between 0 and 100 inclusive
pub fn validate_gst(rate: GstRate) -> ValidationResult<()> {
    let percent = rate.percent();

    if !percent.is_finite() {
        return Err(ValidationError::NotFinite {
            field: "gst".to_string(),
        });
    }

    if !(0.0..=MAX_GST_PERCENT).contains(&percent) {
        return Err(ValidationError::OutOfRange {
            field: "gst".to_string(),
            min: 0.0,
            max: MAX_GST_PERCENT,
        });
    }

    Ok(())
}

/// Validates a quantity.
pub fn validate_quantity(quantity: u32) -> ValidationResult<()> {
    if quantity < MIN_QUANTITY {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Aggregate Validators
// =============================================================================

/// Validates a product before it is added to, or updated in, a draft.
pub fn validate_product_input(input: &ProductInput) -> ValidationResult<()> {
    validate_required("product name", &input.name)?;
    validate_price(input.price)?;
    validate_gst(input.gst)?;
    validate_quantity(input.quantity)?;

    if !LineAmounts::compute(input.price, input.gst, input.quantity).is_finite() {
        return Err(ValidationError::NotFinite {
            field: "line total".to_string(),
        });
    }

    Ok(())
}

/// Validates the shop fields required on every bill.
///
/// Phone and email are optional and never format-checked.
pub fn validate_shop_details(shop: &ShopDetails) -> ValidationResult<()> {
    validate_required("shop name", &shop.name)?;
    validate_required("shop location", &shop.location)?;
    Ok(())
}

/// Validates that a draft may be finalized.
///
/// ## Rules
/// - Shop name and location present
/// - At least one product
/// - Totals finite (each line can be finite while their sum overflows)
pub fn validate_bill_draft(shop: &ShopDetails, products: &[Product]) -> ValidationResult<()> {
    validate_shop_details(shop)?;

    if products.is_empty() {
        return Err(ValidationError::EmptyBill);
    }

    if !bill_totals(products).is_finite() {
        return Err(ValidationError::NotFinite {
            field: "bill total".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
