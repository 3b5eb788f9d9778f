//! Premium lookup: bracket matching, age buckets and product-level pricing.

pub mod age;
pub mod product;
pub mod resolver;
pub mod retry;

pub use age::{AgeBucketError, OPEN_BUCKET_OFFSET, representative_age};
pub use product::{
    PricingError, ProductPricer, ProductQuote, Quote, QuotedPrice, select_price_table,
};
pub use resolver::{PriceResolver, resolve};
pub use retry::{RetryPolicy, retry_with_backoff};
