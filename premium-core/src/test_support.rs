//! In-memory [`PricingRepository`] for unit tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use chrono::Utc;

use crate::db::{PricingRepository, RepositoryError};
use crate::models::{
    NewPriceTable, NewProduct, PriceBracket, PriceTable, Product, ProductTableLink,
};

#[derive(Default)]
struct State {
    products: Vec<Product>,
    tables: Vec<PriceTable>,
    brackets: Vec<(i64, PriceBracket)>,
    links: Vec<ProductTableLink>,
}

/// Vec-backed repository. `failures_remaining` makes the next N bracket
/// fetches fail with a `Connection` error.
#[derive(Default)]
pub struct MemoryRepository {
    state: Mutex<State>,
    pub failures_remaining: AtomicU32,
    pub bracket_fetches: AtomicU32,
}

impl MemoryRepository {
    /// Insert a table with an explicit id and its brackets.
    pub fn with_table(
        self,
        id: i64,
        brackets: &[(&str, rust_decimal::Decimal)],
    ) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.tables.push(PriceTable {
                id,
                name: format!("table-{id}"),
                created_at: Utc::now(),
            });
            for (label, value) in brackets {
                state.brackets.push((id, PriceBracket::new(*label, *value)));
            }
        }
        self
    }

    pub fn with_product(
        self,
        id: i64,
        name: &str,
        table_ids: &[i64],
    ) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.products.push(Product {
                id,
                name: name.to_string(),
                carrier: "Test Carrier".to_string(),
            });
            for table_id in table_ids {
                state.links.push(ProductTableLink {
                    product_id: id,
                    table_id: *table_id,
                });
            }
        }
        self
    }

    pub fn failing_bracket_fetches(
        self,
        count: u32,
    ) -> Self {
        self.failures_remaining.store(count, Ordering::SeqCst);
        self
    }
}

#[async_trait]
impl PricingRepository for MemoryRepository {
    async fn create_product(
        &self,
        product: NewProduct,
    ) -> Result<Product, RepositoryError> {
        let mut state = self.state.lock().unwrap();
        let id = state.products.iter().map(|p| p.id).max().unwrap_or(0) + 1;
        let created = Product {
            id,
            name: product.name,
            carrier: product.carrier,
        };
        state.products.push(created.clone());
        Ok(created)
    }

    async fn get_product(
        &self,
        id: i64,
    ) -> Result<Product, RepositoryError> {
        let state = self.state.lock().unwrap();
        state
            .products
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn get_product_by_name(
        &self,
        name: &str,
    ) -> Result<Product, RepositoryError> {
        let state = self.state.lock().unwrap();
        state
            .products
            .iter()
            .find(|p| p.name == name)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError> {
        let state = self.state.lock().unwrap();
        let mut products = state.products.clone();
        products.sort_by_key(|p| p.id);
        Ok(products)
    }

    async fn create_price_table(
        &self,
        table: NewPriceTable,
    ) -> Result<PriceTable, RepositoryError> {
        let mut state = self.state.lock().unwrap();
        let id = state.tables.iter().map(|t| t.id).max().unwrap_or(0) + 1;
        let created = PriceTable {
            id,
            name: table.name,
            created_at: Utc::now(),
        };
        state.tables.push(created.clone());
        Ok(created)
    }

    async fn get_price_table(
        &self,
        id: i64,
    ) -> Result<PriceTable, RepositoryError> {
        let state = self.state.lock().unwrap();
        state
            .tables
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn get_price_table_by_name(
        &self,
        name: &str,
    ) -> Result<PriceTable, RepositoryError> {
        let state = self.state.lock().unwrap();
        state
            .tables
            .iter()
            .find(|t| t.name == name)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn list_price_tables(&self) -> Result<Vec<PriceTable>, RepositoryError> {
        Ok(self.state.lock().unwrap().tables.clone())
    }

    async fn get_price_brackets(
        &self,
        table_id: i64,
    ) -> Result<Vec<PriceBracket>, RepositoryError> {
        self.bracket_fetches.fetch_add(1, Ordering::SeqCst);
        let pending = self.failures_remaining.load(Ordering::SeqCst);
        if pending > 0 {
            self.failures_remaining.store(pending - 1, Ordering::SeqCst);
            return Err(RepositoryError::Connection("store unavailable".to_string()));
        }

        let state = self.state.lock().unwrap();
        Ok(state
            .brackets
            .iter()
            .filter(|(id, _)| *id == table_id)
            .map(|(_, b)| b.clone())
            .collect())
    }

    async fn insert_price_bracket(
        &self,
        table_id: i64,
        bracket: &PriceBracket,
    ) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().unwrap();
        if !state.tables.iter().any(|t| t.id == table_id) {
            return Err(RepositoryError::NotFound);
        }
        state.brackets.push((table_id, bracket.clone()));
        Ok(())
    }

    async fn delete_price_brackets(
        &self,
        table_id: i64,
    ) -> Result<(), RepositoryError> {
        self.state
            .lock()
            .unwrap()
            .brackets
            .retain(|(id, _)| *id != table_id);
        Ok(())
    }

    async fn link_price_table(
        &self,
        link: ProductTableLink,
    ) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().unwrap();
        if !state.links.contains(&link) {
            state.links.push(link);
        }
        Ok(())
    }

    async fn get_product_table_links(
        &self,
        product_id: i64,
    ) -> Result<Vec<ProductTableLink>, RepositoryError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .links
            .iter()
            .filter(|l| l.product_id == product_id)
            .copied()
            .collect())
    }
}
