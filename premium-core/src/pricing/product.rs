//! Product-level pricing: the callers of [`PriceResolver`].
//!
//! A product may be linked to several price tables. Exactly one is used,
//! chosen by [`select_price_table`] (lowest table id, i.e. the oldest table),
//! so the same product and age always price the same way.
//!
//! Two entry points serve the two screens that show prices:
//!
//! * [`ProductPricer::price_product`] for the broker's product detail view,
//!   which asks about one explicit age;
//! * [`ProductPricer::quote`] for the public quote flow, which receives an age
//!   bucket such as `"29-33"` and prices every product.
//!
//! A missing price is never an error here. Both "nothing configured" and
//! "configured but not covering this age" come back as
//! [`Resolution::NotFound`] and are shown to the user as *contact us*.
//! Failures to read the data store are errors ([`PricingError::Repository`]).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::db::{PricingRepository, RepositoryError};
use crate::models::{NotFoundReason, Product, ProductTableLink, Resolution};
use crate::pricing::age::{AgeBucketError, representative_age};
use crate::pricing::resolver::PriceResolver;
use crate::pricing::retry::{RetryPolicy, retry_with_backoff};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PricingError {
    #[error("failed to read pricing data: {0}")]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    AgeBucket(#[from] AgeBucketError),
}

/// Pick the table that prices a product: the lowest table id among its links.
pub fn select_price_table(links: &[ProductTableLink]) -> Option<i64> {
    links.iter().map(|link| link.table_id).min()
}

/// What the quote screen shows for one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QuotedPrice {
    Amount { value: Decimal },
    ContactUs { reason: NotFoundReason },
}

impl From<&Resolution> for QuotedPrice {
    fn from(resolution: &Resolution) -> Self {
        match resolution {
            Resolution::Found { value, .. } => Self::Amount { value: *value },
            Resolution::NotFound { reason } => Self::ContactUs { reason: *reason },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductQuote {
    pub product: Product,
    /// Table the price came from, if the product has one.
    pub table_id: Option<i64>,
    pub resolution: Resolution,
    pub price: QuotedPrice,
}

/// Quote for every product at the age represented by `bucket`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub bucket: String,
    pub age: u32,
    pub products: Vec<ProductQuote>,
}

/// Prices products against a repository handle it is given.
pub struct ProductPricer<'r> {
    repo: &'r dyn PricingRepository,
    retry: RetryPolicy,
}

impl<'r> ProductPricer<'r> {
    pub fn new(repo: &'r dyn PricingRepository) -> Self {
        Self {
            repo,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(
        mut self,
        retry: RetryPolicy,
    ) -> Self {
        self.retry = retry;
        self
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Premium of `product_id` for an explicit `age`.
    pub async fn price_product(
        &self,
        product_id: i64,
        age: u32,
    ) -> Result<Resolution, PricingError> {
        let (_, resolution) = self.resolve_for_product(product_id, age).await?;
        Ok(resolution)
    }

    /// Reduce `bucket` to its representative age and price every product.
    ///
    /// A product without a price still appears, with
    /// [`QuotedPrice::ContactUs`], so the user can pick it anyway.
    pub async fn quote(
        &self,
        bucket: &str,
    ) -> Result<Quote, PricingError> {
        let age = representative_age(bucket)?;
        debug!(bucket, age, "quoting all products");

        let repo = self.repo;
        let products = self.fetch("list products", move || repo.list_products()).await?;

        let mut quotes = Vec::with_capacity(products.len());
        for product in products {
            let (table_id, resolution) = self.resolve_for_product(product.id, age).await?;
            quotes.push(ProductQuote {
                price: QuotedPrice::from(&resolution),
                product,
                table_id,
                resolution,
            });
        }

        Ok(Quote {
            bucket: bucket.to_string(),
            age,
            products: quotes,
        })
    }

    async fn resolve_for_product(
        &self,
        product_id: i64,
        age: u32,
    ) -> Result<(Option<i64>, Resolution), PricingError> {
        let repo = self.repo;
        let links = self
            .fetch("fetch product table links", move || {
                repo.get_product_table_links(product_id)
            })
            .await?;

        let Some(table_id) = select_price_table(&links) else {
            info!(
                product_id,
                reason = %NotFoundReason::NoBracketsConfigured,
                "no price table linked to product"
            );
            return Ok((
                None,
                Resolution::not_found(NotFoundReason::NoBracketsConfigured),
            ));
        };
        if links.len() > 1 {
            debug!(
                product_id,
                table_id,
                linked = links.len(),
                "several tables linked, using lowest id"
            );
        }

        let brackets = self
            .fetch("fetch price brackets", move || repo.get_price_brackets(table_id))
            .await?;

        let resolution = PriceResolver::new(&brackets).resolve(age);
        match &resolution {
            Resolution::Found { value, matched_label } => {
                debug!(product_id, table_id, age, %value, %matched_label, "product priced");
            }
            Resolution::NotFound {
                reason: reason @ NotFoundReason::NoBracketsConfigured,
            } => {
                info!(product_id, table_id, %reason, "price table has no brackets configured");
            }
            Resolution::NotFound {
                reason: reason @ NotFoundReason::NoBracketMatches,
            } => {
                warn!(product_id, table_id, age, %reason, "price table does not cover age");
            }
        }

        Ok((Some(table_id), resolution))
    }

    async fn fetch<F, Fut, T>(
        &self,
        context: &str,
        operation: F,
    ) -> Result<T, RepositoryError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, RepositoryError>>,
    {
        retry_with_backoff(&self.retry, context, operation).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::test_support::MemoryRepository;

    fn no_wait() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            initial_delay_ms: 0,
            max_delay_ms: 0,
            backoff_factor: 2,
        }
    }

    fn standard_table() -> [(&'static str, Decimal); 3] {
        [("0-18", dec!(50)), ("19-23", dec!(80)), ("59+", dec!(200))]
    }

    fn link(table_id: i64) -> ProductTableLink {
        ProductTableLink {
            product_id: 1,
            table_id,
        }
    }

    // =========================================================================
    // select_price_table
    // =========================================================================

    #[test]
    fn selects_lowest_table_id() {
        assert_eq!(select_price_table(&[link(9), link(3), link(7)]), Some(3));
    }

    #[test]
    fn selection_ignores_link_order() {
        assert_eq!(
            select_price_table(&[link(3), link(9)]),
            select_price_table(&[link(9), link(3)])
        );
    }

    #[test]
    fn no_links_selects_nothing() {
        assert_eq!(select_price_table(&[]), None);
    }

    // =========================================================================
    // price_product
    // =========================================================================

    #[tokio::test]
    async fn prices_product_from_its_table() {
        let repo = MemoryRepository::default()
            .with_table(1, &standard_table())
            .with_product(1, "Plano Bronze", &[1]);

        let resolution = ProductPricer::new(&repo).price_product(1, 20).await;

        assert_eq!(
            resolution,
            Ok(Resolution::Found {
                value: dec!(80),
                matched_label: "19-23".to_string(),
            })
        );
    }

    #[tokio::test]
    async fn uses_oldest_of_several_linked_tables() {
        let repo = MemoryRepository::default()
            .with_table(5, &[("0+", dec!(500))])
            .with_table(2, &[("0+", dec!(200))])
            .with_product(1, "Plano Prata", &[5, 2]);

        let resolution = ProductPricer::new(&repo).price_product(1, 40).await.unwrap();

        assert_eq!(resolution.value(), Some(dec!(200)));
    }

    #[tokio::test]
    async fn unlinked_product_is_not_configured_without_fetching_brackets() {
        let repo = MemoryRepository::default()
            .with_table(1, &standard_table())
            .with_product(1, "Plano Ouro", &[]);

        let resolution = ProductPricer::new(&repo).price_product(1, 20).await;

        assert_eq!(
            resolution,
            Ok(Resolution::not_found(NotFoundReason::NoBracketsConfigured))
        );
        assert_eq!(repo.bracket_fetches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn empty_table_is_not_configured() {
        let repo = MemoryRepository::default()
            .with_table(1, &[])
            .with_product(1, "Plano Ouro", &[1]);

        let resolution = ProductPricer::new(&repo).price_product(1, 20).await;

        assert_eq!(
            resolution,
            Ok(Resolution::not_found(NotFoundReason::NoBracketsConfigured))
        );
    }

    #[tokio::test]
    async fn coverage_gap_is_reported_as_no_match() {
        let repo = MemoryRepository::default()
            .with_table(1, &standard_table())
            .with_product(1, "Plano Bronze", &[1]);

        let resolution = ProductPricer::new(&repo).price_product(1, 40).await;

        assert_eq!(
            resolution,
            Ok(Resolution::not_found(NotFoundReason::NoBracketMatches))
        );
    }

    #[tokio::test]
    async fn transient_fetch_failure_is_retried() {
        let repo = MemoryRepository::default()
            .with_table(1, &standard_table())
            .with_product(1, "Plano Bronze", &[1])
            .failing_bracket_fetches(2);

        let resolution = ProductPricer::new(&repo)
            .with_retry(no_wait())
            .price_product(1, 60)
            .await
            .unwrap();

        assert_eq!(resolution.value(), Some(dec!(200)));
        assert_eq!(repo.bracket_fetches.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn persistent_fetch_failure_is_an_error_not_a_missing_price() {
        let repo = MemoryRepository::default()
            .with_table(1, &standard_table())
            .with_product(1, "Plano Bronze", &[1])
            .failing_bracket_fetches(10);

        let result = ProductPricer::new(&repo)
            .with_retry(no_wait())
            .price_product(1, 60)
            .await;

        assert_eq!(
            result,
            Err(PricingError::Repository(RepositoryError::Connection(
                "store unavailable".to_string()
            )))
        );
    }

    // =========================================================================
    // quote
    // =========================================================================

    #[tokio::test]
    async fn quote_prices_open_bucket_end_to_end() {
        let repo = MemoryRepository::default()
            .with_table(1, &standard_table())
            .with_product(1, "Plano Bronze", &[1]);

        let quote = ProductPricer::new(&repo).quote("59+").await.unwrap();

        assert_eq!(quote.age, 64);
        assert_eq!(quote.products.len(), 1);
        assert_eq!(
            quote.products[0].resolution,
            Resolution::Found {
                value: dec!(200),
                matched_label: "59+".to_string(),
            }
        );
        assert_eq!(
            quote.products[0].price,
            QuotedPrice::Amount { value: dec!(200) }
        );
        assert_eq!(quote.products[0].table_id, Some(1));
    }

    #[tokio::test]
    async fn quote_lists_unpriced_products_as_contact_us() {
        let repo = MemoryRepository::default()
            .with_table(1, &standard_table())
            .with_product(1, "Plano Bronze", &[1])
            .with_product(2, "Plano Sem Tabela", &[]);

        let quote = ProductPricer::new(&repo).quote("29-33").await.unwrap();

        assert_eq!(quote.age, 31);
        let prices: Vec<_> = quote.products.iter().map(|q| q.price.clone()).collect();
        assert_eq!(
            prices,
            vec![
                QuotedPrice::ContactUs {
                    reason: NotFoundReason::NoBracketMatches
                },
                QuotedPrice::ContactUs {
                    reason: NotFoundReason::NoBracketsConfigured
                },
            ]
        );
    }

    #[tokio::test]
    async fn quote_rejects_unrecognized_bucket() {
        let repo = MemoryRepository::default();

        let result = ProductPricer::new(&repo).quote("seniors").await;

        assert_eq!(
            result,
            Err(PricingError::AgeBucket(AgeBucketError::Unrecognized(
                "seniors".to_string()
            )))
        );
    }

    #[tokio::test]
    async fn quote_with_no_products_is_empty() {
        let repo = MemoryRepository::default();

        let quote = ProductPricer::new(&repo).quote("45").await.unwrap();

        assert!(quote.products.is_empty());
    }
}
