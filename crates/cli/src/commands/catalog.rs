//! Catalog commands: listing, one-shot search and interactive search.
//!
//! # Usage
//!
//! ```bash
//! qkart products
//! qkart search basketball
//!
//! # Each line read from stdin replaces the search text
//! printf 'i\nip\niph\n' | qkart browse
//! ```

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};

use qkart_core::Product;
use qkart_storefront::{CatalogView, SearchDispatcher, StorefrontError};

use super::{CliError, Context};

const NO_PRODUCTS: &str = "No products found";

/// How long `browse` waits at end of input for a query already sent.
const IN_FLIGHT_WAIT: Duration = Duration::from_secs(10);

/// Print the full catalog.
pub async fn products(ctx: &Context) -> Result<(), CliError> {
    let products = ctx
        .client
        .products()
        .await
        .map_err(|e| StorefrontError::catalog_unavailable(&e))?;
    print_products(&products);
    Ok(())
}

/// Run a single search without debouncing.
///
/// A 4xx from the backend means no matches.
pub async fn search(ctx: &Context, text: &str) -> Result<(), CliError> {
    match ctx.client.search(text).await {
        Ok(products) => print_products(&products),
        Err(e) if e.is_client_error() => println!("{NO_PRODUCTS}"),
        Err(e) => return Err(StorefrontError::catalog_unavailable(&e).into()),
    }
    Ok(())
}

/// Interactive search.
///
/// Each stdin line is treated as the new content of the search box. The
/// catalog is reprinted whenever the view changes. At end of input a
/// pending query is sent immediately, and a query already sent is waited
/// for up to [`IN_FLIGHT_WAIT`].
pub async fn browse(ctx: &Context) -> Result<(), CliError> {
    let dispatcher = SearchDispatcher::new(ctx.client.clone(), ctx.config.search_debounce);
    let mut view = dispatcher.subscribe();

    print_view(&dispatcher.refresh().await?);
    view.mark_unchanged();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => match line? {
                Some(text) => dispatcher.on_keystroke(text),
                None => break,
            },
            changed = view.changed() => {
                if changed.is_err() {
                    break;
                }
                print_view(&view.borrow_and_update());
            }
        }
    }

    if let Some(text) = dispatcher.pending_text() {
        dispatcher.search_now(&text).await;
        print_view(&dispatcher.view());
    } else if (dispatcher.is_searching() || view.has_changed().unwrap_or(false))
        && let Ok(Ok(())) = tokio::time::timeout(IN_FLIGHT_WAIT, view.changed()).await
    {
        print_view(&view.borrow_and_update());
    }
    Ok(())
}

fn print_view(view: &CatalogView) {
    if view.available {
        print_products(&view.products);
    } else {
        println!("{NO_PRODUCTS}");
    }
}

fn print_products(products: &[Product]) {
    if products.is_empty() {
        println!("{NO_PRODUCTS}");
        return;
    }
    for product in products {
        println!("{}", format_product(product));
    }
}

/// One catalog row: id, name, category, cost and rating.
pub fn format_product(product: &Product) -> String {
    format!(
        "{:<18} {:<32} {:<12} ${:>6}  {:.1}/5",
        product.id, product.name, product.category, product.cost, product.rating
    )
}

#[cfg(test)]
mod tests {
    use qkart_core::ProductId;

    use super::*;

    #[test]
    fn test_format_product() {
        let product = Product {
            id: ProductId::new("KCRwjF7lN97HnEaY"),
            name: "Tan Leatherette Weekender Duffle".to_string(),
            category: "Fashion".to_string(),
            cost: 150,
            rating: 4.0,
            image_url: String::new(),
        };
        let row = format_product(&product);
        assert!(row.starts_with("KCRwjF7lN97HnEaY "));
        assert!(row.contains("Tan Leatherette Weekender Duffle"));
        assert!(row.contains("Fashion"));
        assert!(row.ends_with("$   150  4.0/5"));
    }
}
