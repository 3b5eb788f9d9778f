use async_trait::async_trait;
use thiserror::Error;

use crate::models::{
    NewPriceTable, NewProduct, PriceBracket, PriceTable, Product, ProductTableLink,
};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("Record not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl RepositoryError {
    /// Whether retrying the same call could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Database(_) | Self::Connection(_))
    }
}

#[async_trait]
pub trait PricingRepository: Send + Sync {
    // Products
    async fn create_product(&self, product: NewProduct) -> Result<Product, RepositoryError>;
    async fn get_product(&self, id: i64) -> Result<Product, RepositoryError>;
    async fn get_product_by_name(&self, name: &str) -> Result<Product, RepositoryError>;
    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError>;

    // Price tables
    async fn create_price_table(
        &self,
        table: NewPriceTable,
    ) -> Result<PriceTable, RepositoryError>;
    async fn get_price_table(&self, id: i64) -> Result<PriceTable, RepositoryError>;
    async fn get_price_table_by_name(&self, name: &str) -> Result<PriceTable, RepositoryError>;
    async fn list_price_tables(&self) -> Result<Vec<PriceTable>, RepositoryError>;

    // Brackets, always returned in entry order
    async fn get_price_brackets(&self, table_id: i64) -> Result<Vec<PriceBracket>, RepositoryError>;

    /// Append a bracket after the table's existing brackets.
    async fn insert_price_bracket(
        &self,
        table_id: i64,
        bracket: &PriceBracket,
    ) -> Result<(), RepositoryError>;

    async fn delete_price_brackets(&self, table_id: i64) -> Result<(), RepositoryError>;

    // Product ↔ table links
    async fn link_price_table(&self, link: ProductTableLink) -> Result<(), RepositoryError>;
    async fn get_product_table_links(
        &self,
        product_id: i64,
    ) -> Result<Vec<ProductTableLink>, RepositoryError>;
}
