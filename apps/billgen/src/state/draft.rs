//! # Draft State
//!
//! The bill being built: shop details plus an ordered list of products.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Draft Lifecycle                                  │
//! │                                                                         │
//! │  ┌──────────┐  add_product()    ┌──────────┐  generate (controller)    │
//! │  │  Empty   │ ────────────────► │  Items   │ ─────────────────────►    │
//! │  │  Draft   │                   │  Added   │   products snapshotted    │
//! │  └──────────┘ ◄──────────────── └──────────┘   into the Bill, then     │
//! │       ▲         remove last         │          clear_products()         │
//! │       │                             │                                   │
//! │       └──── clear_products() ◄──────┘   shop details are kept          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Invalid input never changes the draft.

use billgen_core::identity::new_id;
use billgen_core::money::{bill_totals, BillTotals, LineAmounts};
use billgen_core::types::non_blank;
use billgen_core::validation::{validate_bill_draft, validate_product_input};
use billgen_core::{CoreError, CoreResult, Product, ProductInput, ShopDetails};
use serde::Serialize;
use tracing::debug;

/// A single editable shop field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShopField {
    Name,
    Location,
    Phone,
    Email,
}

impl std::str::FromStr for ShopField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "name" => Ok(ShopField::Name),
            "location" | "address" => Ok(ShopField::Location),
            "phone" => Ok(ShopField::Phone),
            "email" => Ok(ShopField::Email),
            other => Err(format!(
                "Unknown shop field: '{}'. Valid options: name, location, phone, email",
                other
            )),
        }
    }
}

/// A line of the draft with its live amounts.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftLine {
    pub product: Product,
    pub amounts: LineAmounts,
}

/// Snapshot of the draft for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftView {
    pub shop: ShopDetails,
    pub lines: Vec<DraftLine>,
    pub totals: BillTotals,
    /// Whether generating a bill would pass validation right now.
    pub can_generate: bool,
}

/// The bill under construction.
#[derive(Debug, Clone, Default)]
pub struct Draft {
    shop: ShopDetails,
    products: Vec<Product>,
}

impl Draft {
    /// Creates an empty draft for `shop`.
    pub fn new(shop: ShopDetails) -> Self {
        Draft {
            shop,
            products: Vec::new(),
        }
    }

    pub fn shop(&self) -> &ShopDetails {
        &self.shop
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Validates and appends a product with a fresh id.
    pub fn add_product(&mut self, input: ProductInput) -> CoreResult<&Product> {
        validate_product_input(&input)?;

        let product = input.into_product(new_id());
        debug!(product_id = %product.id, name = %product.name, "Product added to draft");
        self.products.push(product);

        Ok(&self.products[self.products.len() - 1])
    }

    /// Replaces every field of product `id` except the id itself.
    pub fn update_product(&mut self, id: &str, input: ProductInput) -> CoreResult<&Product> {
        validate_product_input(&input)?;

        let product = self
            .products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| CoreError::ProductNotFound(id.to_string()))?;
        product.apply(input);

        debug!(product_id = %id, "Product updated");
        Ok(product)
    }

    /// Removes product `id`.
    pub fn remove_product(&mut self, id: &str) -> CoreResult<Product> {
        let index = self
            .products
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| CoreError::ProductNotFound(id.to_string()))?;

        debug!(product_id = %id, "Product removed");
        Ok(self.products.remove(index))
    }

    /// Replaces the shop details. Blank optional fields become absent.
    pub fn set_shop_details(&mut self, shop: ShopDetails) {
        let ShopDetails {
            name,
            location,
            phone,
            email,
        } = shop;
        self.shop = ShopDetails {
            name,
            location,
            phone: phone.and_then(non_blank),
            email: email.and_then(non_blank),
        };
    }

    /// Sets one shop field. No validation until the bill is generated.
    pub fn set_shop_field(&mut self, field: ShopField, value: impl Into<String>) {
        let value = value.into();
        match field {
            ShopField::Name => self.shop.name = value,
            ShopField::Location => self.shop.location = value,
            ShopField::Phone => self.shop.phone = non_blank(value),
            ShopField::Email => self.shop.email = non_blank(value),
        }
    }

    /// Empties the product list, keeping the shop.
    pub fn clear_products(&mut self) {
        self.products.clear();
    }

    /// Resolves a 1-based line number or a product id to a product id.
    pub fn resolve_product(&self, reference: &str) -> Option<String> {
        if let Ok(number) = reference.parse::<usize>() {
            if let Some(product) = number.checked_sub(1).and_then(|i| self.products.get(i)) {
                return Some(product.id.clone());
            }
        }
        self.products
            .iter()
            .find(|p| p.id == reference)
            .map(|p| p.id.clone())
    }

    /// Aggregate totals of the current products.
    pub fn totals(&self) -> BillTotals {
        bill_totals(&self.products)
    }

    /// Takes a display snapshot.
    pub fn view(&self) -> DraftView {
        DraftView {
            shop: self.shop.clone(),
            lines: self
                .products
                .iter()
                .map(|p| DraftLine {
                    product: p.clone(),
                    amounts: p.amounts(),
                })
                .collect(),
            totals: self.totals(),
            can_generate: validate_bill_draft(&self.shop, &self.products).is_ok(),
        }
    }
}
