//! Commands behind the `premium` binary, kept free of I/O so they can be
//! tested against an in-memory repository.

use std::fmt::Write;

use premium_core::db::RepositoryRegistry;
use premium_core::pricing::{
    ProductPricer, Quote, QuotedPrice, RetryPolicy, retry_with_backoff, select_price_table,
};
use premium_core::{PriceTable, PricingRepository, Product, RepositoryError, Resolution};
use premium_db_sqlite::SqliteRepositoryFactory;

const CONTACT_US: &str = "contact us";

/// Registry with every backend this binary ships with.
pub fn build_registry() -> RepositoryRegistry {
    let mut registry = RepositoryRegistry::new();
    registry.register(Box::new(SqliteRepositoryFactory));
    registry
}

/// A product together with the table that prices it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductListing {
    pub product: Product,
    pub table: Option<PriceTable>,
    pub linked_tables: usize,
}

/// Every product with its pricing table. Each read is retried under `retry`.
pub async fn list_products(
    repo: &dyn PricingRepository,
    retry: &RetryPolicy,
) -> Result<Vec<ProductListing>, RepositoryError> {
    let products =
        retry_with_backoff(retry, "list products", move || repo.list_products()).await?;

    let mut listings = Vec::with_capacity(products.len());
    for product in products {
        let product_id = product.id;
        let links = retry_with_backoff(retry, "get product table links", move || {
            repo.get_product_table_links(product_id)
        })
        .await?;
        let table = match select_price_table(&links) {
            Some(table_id) => Some(
                retry_with_backoff(retry, "get price table", move || {
                    repo.get_price_table(table_id)
                })
                .await?,
            ),
            None => None,
        };
        listings.push(ProductListing {
            product,
            table,
            linked_tables: links.len(),
        });
    }
    Ok(listings)
}

/// Price one product for one age, looking the product up first so an
/// unknown id is reported as such.
pub async fn price_product(
    repo: &dyn PricingRepository,
    pricer: &ProductPricer<'_>,
    product_id: i64,
    age: u32,
) -> anyhow::Result<(Product, Resolution)> {
    let lookup = retry_with_backoff(pricer.retry_policy(), "get product", move || {
        repo.get_product(product_id)
    });
    let product = match lookup.await {
        Ok(product) => product,
        Err(RepositoryError::NotFound) => anyhow::bail!("product {product_id} does not exist"),
        Err(other) => return Err(other.into()),
    };
    let resolution = pricer.price_product(product_id, age).await?;
    Ok((product, resolution))
}

fn format_price(price: &QuotedPrice) -> String {
    match price {
        QuotedPrice::Amount { value } => format!("R$ {:.2}", value),
        QuotedPrice::ContactUs { .. } => CONTACT_US.to_string(),
    }
}

pub fn render_quote(quote: &Quote) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Quote for age bucket {} (age {})", quote.bucket, quote.age);
    if quote.products.is_empty() {
        let _ = writeln!(out, "  no products available");
        return out;
    }
    for item in &quote.products {
        let _ = writeln!(
            out,
            "  {:<32} {:<20} {}",
            item.product.name,
            item.product.carrier,
            format_price(&item.price)
        );
    }
    out
}

pub fn render_price(
    product: &Product,
    age: u32,
    resolution: &Resolution,
) -> String {
    match resolution {
        Resolution::Found {
            value,
            matched_label,
        } => format!(
            "{} at age {}: R$ {:.2} (bracket {})\n",
            product.name, age, value, matched_label
        ),
        Resolution::NotFound { reason } => format!(
            "{} at age {}: {} ({})\n",
            product.name, age, CONTACT_US, reason
        ),
    }
}

pub fn render_products(listings: &[ProductListing]) -> String {
    let mut out = String::new();
    for listing in listings {
        let table = match &listing.table {
            Some(table) if listing.linked_tables > 1 => {
                format!("{} (1 of {} linked)", table.name, listing.linked_tables)
            }
            Some(table) => table.name.clone(),
            None => "no price table".to_string(),
        };
        let _ = writeln!(
            out,
            "{:>4}  {:<32} {:<20} {}",
            listing.product.id, listing.product.name, listing.product.carrier, table
        );
    }
    out
}
