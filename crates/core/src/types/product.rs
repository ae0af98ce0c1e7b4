//! Catalog and cart records.
//!
//! Field names follow the backend's JSON (`_id`, `image`, `qty`), renamed
//! to Rust conventions on the struct side.

use serde::{Deserialize, Serialize};

use super::id::ProductId;

/// A product available to buy.
///
/// Products are immutable once fetched; a catalog query replaces the whole
/// list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Unique ID for the product.
    #[serde(rename = "_id")]
    pub id: ProductId,
    /// The name or title of the product.
    pub name: String,
    /// The category that the product belongs to.
    pub category: String,
    /// The price to buy the product, in whole currency units.
    pub cost: u64,
    /// The aggregate rating of the product, out of five.
    pub rating: f32,
    /// URL for the product image.
    #[serde(rename = "image")]
    pub image_url: String,
}

/// A sparse cart record: one product and how many of it are in the cart.
///
/// The backend owns the cart; the client only ever holds a copy of the
/// backend's latest response.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CartEntry {
    /// ID of the product in the cart.
    #[serde(rename = "productId")]
    pub product_id: ProductId,
    /// Quantity of the product in the cart.
    #[serde(rename = "qty")]
    pub quantity: u32,
}

impl CartEntry {
    /// Create a new cart entry.
    #[must_use]
    pub fn new(product_id: impl Into<ProductId>, quantity: u32) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
        }
    }
}

/// A cart entry joined with its product, ready for display.
///
/// Derived by [`crate::cart::reconcile`]; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartLineItem {
    pub product_id: ProductId,
    pub name: String,
    pub category: String,
    pub cost: u64,
    pub rating: f32,
    pub image_url: String,
    pub quantity: u32,
}

impl CartLineItem {
    /// Build a line item from a product and a quantity.
    #[must_use]
    pub fn from_product(product: &Product, quantity: u32) -> Self {
        Self {
            product_id: product.id.clone(),
            name: product.name.clone(),
            category: product.category.clone(),
            cost: product.cost,
            rating: product.rating,
            image_url: product.image_url.clone(),
            quantity,
        }
    }

    /// Cost of this line (`cost * quantity`).
    #[must_use]
    pub fn line_total(&self) -> u64 {
        self.cost.saturating_mul(u64::from(self.quantity))
    }
}
