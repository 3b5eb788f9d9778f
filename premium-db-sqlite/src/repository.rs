use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use premium_core::{
    NewPriceTable, NewProduct, PriceBracket, PriceTable, PricingRepository, Product,
    ProductTableLink, RepositoryError,
};
use sqlx::{Row, sqlite::SqlitePool};

use crate::decimal::get_premium;

pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    pub async fn new(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .with_context(|| format!("Failed to connect to database: {}", database_url))?;
        Ok(Self { pool })
    }

    pub async fn new_with_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }

    /// Load and execute all SQL seed files from the specified directory.
    /// Files are executed in alphabetical order by filename.
    pub async fn run_seeds(
        &self,
        seeds_dir: &Path,
    ) -> Result<()> {
        let mut entries: Vec<_> = std::fs::read_dir(seeds_dir)
            .with_context(|| format!("Failed to read seeds directory '{}'", seeds_dir.display()))?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "sql"))
            .collect();

        entries.sort_by_key(|entry| entry.file_name());

        for entry in entries {
            let path = entry.path();
            let sql = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read seed file '{}'", path.display()))?;

            sqlx::raw_sql(&sql)
                .execute(&self.pool)
                .await
                .with_context(|| format!("Failed to execute seed file '{}'", path.display()))?;
            tracing::debug!(seed = %path.display(), "seed file applied");
        }

        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Referencing a missing product or table trips the foreign key; callers see
/// that as the parent not existing.
fn map_write_error(error: sqlx::Error) -> RepositoryError {
    match &error {
        sqlx::Error::Database(db) if db.message().contains("FOREIGN KEY constraint failed") => {
            RepositoryError::NotFound
        }
        _ => RepositoryError::Database(error.to_string()),
    }
}

fn row_to_product(row: &sqlx::sqlite::SqliteRow) -> Result<Product, RepositoryError> {
    Ok(Product {
        id: row
            .try_get("id")
            .map_err(|e| RepositoryError::Database(e.to_string()))?,
        name: row
            .try_get("name")
            .map_err(|e| RepositoryError::Database(e.to_string()))?,
        carrier: row
            .try_get("carrier")
            .map_err(|e| RepositoryError::Database(e.to_string()))?,
    })
}

fn row_to_price_table(row: &sqlx::sqlite::SqliteRow) -> Result<PriceTable, RepositoryError> {
    Ok(PriceTable {
        id: row
            .try_get("id")
            .map_err(|e| RepositoryError::Database(e.to_string()))?,
        name: row
            .try_get("name")
            .map_err(|e| RepositoryError::Database(e.to_string()))?,
        created_at: row
            .try_get::<DateTime<Utc>, _>("created_at")
            .map_err(|e| RepositoryError::Database(format!("Failed to get created_at: {}", e)))?,
    })
}

#[async_trait]
impl PricingRepository for SqliteRepository {
    async fn create_product(
        &self,
        product: NewProduct,
    ) -> Result<Product, RepositoryError> {
        let result = sqlx::query("INSERT INTO products (name, carrier) VALUES (?, ?)")
            .bind(&product.name)
            .bind(&product.carrier)
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        self.get_product(result.last_insert_rowid()).await
    }

    async fn get_product(
        &self,
        id: i64,
    ) -> Result<Product, RepositoryError> {
        let row = sqlx::query("SELECT id, name, carrier FROM products WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?
            .ok_or(RepositoryError::NotFound)?;

        row_to_product(&row)
    }

    async fn get_product_by_name(
        &self,
        name: &str,
    ) -> Result<Product, RepositoryError> {
        let row = sqlx::query("SELECT id, name, carrier FROM products WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?
            .ok_or(RepositoryError::NotFound)?;

        row_to_product(&row)
    }

    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query("SELECT id, name, carrier FROM products ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        rows.iter().map(row_to_product).collect()
    }

    async fn create_price_table(
        &self,
        table: NewPriceTable,
    ) -> Result<PriceTable, RepositoryError> {
        let result = sqlx::query("INSERT INTO price_tables (name, created_at) VALUES (?, ?)")
            .bind(&table.name)
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        self.get_price_table(result.last_insert_rowid()).await
    }

    async fn get_price_table(
        &self,
        id: i64,
    ) -> Result<PriceTable, RepositoryError> {
        let row = sqlx::query("SELECT id, name, created_at FROM price_tables WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?
            .ok_or(RepositoryError::NotFound)?;

        row_to_price_table(&row)
    }

    async fn get_price_table_by_name(
        &self,
        name: &str,
    ) -> Result<PriceTable, RepositoryError> {
        let row = sqlx::query("SELECT id, name, created_at FROM price_tables WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?
            .ok_or(RepositoryError::NotFound)?;

        row_to_price_table(&row)
    }

    async fn list_price_tables(&self) -> Result<Vec<PriceTable>, RepositoryError> {
        let rows = sqlx::query("SELECT id, name, created_at FROM price_tables ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        rows.iter().map(row_to_price_table).collect()
    }

    async fn get_price_brackets(
        &self,
        table_id: i64,
    ) -> Result<Vec<PriceBracket>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT age_range, value FROM price_brackets
             WHERE table_id = ?
             ORDER BY position",
        )
        .bind(table_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        let mut brackets = Vec::with_capacity(rows.len());
        for row in rows {
            brackets.push(PriceBracket {
                label: row
                    .try_get("age_range")
                    .map_err(|e| RepositoryError::Database(e.to_string()))?,
                value: get_premium(&row, "value")?,
            });
        }
        Ok(brackets)
    }

    async fn insert_price_bracket(
        &self,
        table_id: i64,
        bracket: &PriceBracket,
    ) -> Result<(), RepositoryError> {
        // Stored as text so the decimal survives without float rounding.
        sqlx::query(
            "INSERT INTO price_brackets (table_id, position, age_range, value)
             VALUES (
                ?,
                (SELECT COALESCE(MAX(position), -1) + 1 FROM price_brackets WHERE table_id = ?),
                ?,
                ?
             )",
        )
        .bind(table_id)
        .bind(table_id)
        .bind(&bracket.label)
        .bind(bracket.value.to_string())
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;

        Ok(())
    }

    async fn delete_price_brackets(
        &self,
        table_id: i64,
    ) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM price_brackets WHERE table_id = ?")
            .bind(table_id)
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        Ok(())
    }

    async fn link_price_table(
        &self,
        link: ProductTableLink,
    ) -> Result<(), RepositoryError> {
        sqlx::query("INSERT OR IGNORE INTO product_price_tables (product_id, table_id) VALUES (?, ?)")
            .bind(link.product_id)
            .bind(link.table_id)
            .execute(&self.pool)
            .await
            .map_err(map_write_error)?;

        Ok(())
    }

    async fn get_product_table_links(
        &self,
        product_id: i64,
    ) -> Result<Vec<ProductTableLink>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT product_id, table_id FROM product_price_tables
             WHERE product_id = ?
             ORDER BY table_id",
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        rows.iter()
            .map(|row| {
                Ok(ProductTableLink {
                    product_id: row
                        .try_get("product_id")
                        .map_err(|e| RepositoryError::Database(e.to_string()))?,
                    table_id: row
                        .try_get("table_id")
                        .map_err(|e| RepositoryError::Database(e.to_string()))?,
                })
            })
            .collect()
    }
}
