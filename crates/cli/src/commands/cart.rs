//! Cart commands.
//!
//! # Usage
//!
//! ```bash
//! qkart cart add KCRwjF7lN97HnEaY
//! qkart cart inc KCRwjF7lN97HnEaY
//! qkart cart dec KCRwjF7lN97HnEaY
//! qkart cart set KCRwjF7lN97HnEaY 3
//! qkart cart show --checkout
//! ```
//!
//! Every command starts by reloading the cart, so duplicate checks and
//! `inc`/`dec` work from the backend's current quantities.

use qkart_core::{CartLineItem, ProductId, total_count, total_quantity, total_value};
use qkart_storefront::{MutateOptions, StorefrontError};

use super::{CliError, Context};

/// Print the cart, optionally with the checkout summary.
pub async fn show(ctx: &mut Context, checkout: bool) -> Result<(), CliError> {
    ctx.cart.fetch(&ctx.session).await?;
    let items = line_items(ctx).await?;

    print_items(&items);
    if checkout {
        println!();
        println!("{}", checkout_summary(&items));
        if let Some(session) = ctx.session.session() {
            println!("Wallet balance: {}", session.balance());
        }
    }
    Ok(())
}

/// Add one unit of a product that is not yet in the cart.
pub async fn add(ctx: &mut Context, product_id: ProductId) -> Result<(), CliError> {
    ctx.cart.fetch(&ctx.session).await?;
    ctx.cart.add(&ctx.session, &product_id).await?;
    print_cart(ctx).await
}

/// Set the quantity of a product.
pub async fn set(ctx: &mut Context, product_id: ProductId, quantity: u32) -> Result<(), CliError> {
    ctx.cart.fetch(&ctx.session).await?;
    ctx.cart
        .mutate(&ctx.session, &product_id, quantity, MutateOptions::ADJUST)
        .await?;
    print_cart(ctx).await
}

/// Raise the quantity of a product by one.
pub async fn increment(ctx: &mut Context, product_id: ProductId) -> Result<(), CliError> {
    ctx.cart.fetch(&ctx.session).await?;
    ctx.cart.increment(&ctx.session, &product_id).await?;
    print_cart(ctx).await
}

/// Lower the quantity of a product by one.
pub async fn decrement(ctx: &mut Context, product_id: ProductId) -> Result<(), CliError> {
    ctx.cart.fetch(&ctx.session).await?;
    ctx.cart.decrement(&ctx.session, &product_id).await?;
    print_cart(ctx).await
}

async fn print_cart(ctx: &Context) -> Result<(), CliError> {
    print_items(&line_items(ctx).await?);
    Ok(())
}

async fn line_items(ctx: &Context) -> Result<Vec<CartLineItem>, CliError> {
    let catalog = ctx
        .client
        .products()
        .await
        .map_err(|e| StorefrontError::catalog_unavailable(&e))?;
    Ok(ctx.cart.line_items(&catalog))
}

fn print_items(items: &[CartLineItem]) {
    if items.is_empty() {
        println!("Cart is empty");
        return;
    }
    for item in items {
        println!("{}", format_line_item(item));
    }
    println!("Order total: ${}", total_value(items));
}

/// One cart row: quantity, name, unit cost and line total.
pub fn format_line_item(item: &CartLineItem) -> String {
    format!(
        "{:>3} x {:<32} ${:>6}  = ${}",
        item.quantity,
        item.name,
        item.cost,
        item.line_total()
    )
}

/// Order details shown before checkout.
pub fn checkout_summary(items: &[CartLineItem]) -> String {
    let subtotal = total_value(items);
    format!(
        "Order Details\n\
         Products: {}\n\
         Units: {}\n\
         Subtotal: ${subtotal}\n\
         Shipping Charges: $0\n\
         Total: ${subtotal}",
        total_count(items),
        total_quantity(items),
    )
}
