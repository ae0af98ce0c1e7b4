//! Cart reconciliation.
//!
//! The backend stores the cart as sparse `(productId, qty)` pairs. These
//! functions join that list against the catalog to produce display-ready
//! line items and their totals.

use std::collections::HashMap;

use crate::types::{CartEntry, CartLineItem, Product};

/// Join cart entries with their products.
///
/// Output order follows `entries`. An entry whose product is not in
/// `catalog` is dropped without error, so a cart that still references a
/// removed product renders everything else.
#[must_use]
pub fn reconcile(entries: &[CartEntry], catalog: &[Product]) -> Vec<CartLineItem> {
    if entries.is_empty() {
        return Vec::new();
    }

    let by_id: HashMap<&str, &Product> = catalog.iter().map(|p| (p.id.as_str(), p)).collect();

    entries
        .iter()
        .filter_map(|entry| {
            by_id
                .get(entry.product_id.as_str())
                .map(|product| CartLineItem::from_product(product, entry.quantity))
        })
        .collect()
}

/// Total value of the cart: the sum of `cost * quantity` over all items.
///
/// Saturates at `u64::MAX`, like [`CartLineItem::line_total`].
#[must_use]
pub fn total_value(items: &[CartLineItem]) -> u64 {
    items
        .iter()
        .map(CartLineItem::line_total)
        .fold(0, u64::saturating_add)
}

/// Number of distinct line items in the cart.
///
/// This counts products, not units; see [`total_quantity`] for the sum of
/// quantities.
#[must_use]
pub const fn total_count(items: &[CartLineItem]) -> usize {
    items.len()
}

/// Sum of quantities over all line items.
#[must_use]
pub fn total_quantity(items: &[CartLineItem]) -> u64 {
    items
        .iter()
        .map(|item| u64::from(item.quantity))
        .fold(0, u64::saturating_add)
}
