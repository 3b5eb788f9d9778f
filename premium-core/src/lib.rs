pub mod db;
pub mod models;
pub mod pricing;

#[cfg(test)]
mod test_support;

pub use db::repository::{PricingRepository, RepositoryError};
pub use models::*;
