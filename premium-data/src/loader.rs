use std::io::Read;

use premium_core::{
    BracketLabel, NewPriceTable, NewProduct, PriceBracket, PricingRepository, ProductTableLink,
    RawPremium, RawPriceBracket, RepositoryError,
};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that can occur when loading price tables and product links.
#[derive(Debug, Error)]
pub enum PriceLoaderError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("JSON parse error: {0}")]
    JsonParse(String),

    #[error("Price table '{0}' not found in database (load the price tables first)")]
    TableNotFound(String),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<csv::Error> for PriceLoaderError {
    fn from(err: csv::Error) -> Self {
        PriceLoaderError::CsvParse(err.to_string())
    }
}

impl From<serde_json::Error> for PriceLoaderError {
    fn from(err: serde_json::Error) -> Self {
        PriceLoaderError::JsonParse(err.to_string())
    }
}

/// One bracket of one named table, ready to store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceRecord {
    pub table: String,
    pub bracket: PriceBracket,
}

/// A row of the price CSV:
/// - `table`: price table name, e.g. `Essencial 2025`
/// - `age_range`: bracket label (`0-18`, `59+`, `45`)
/// - `value`: monthly premium; read leniently, blank is zero
#[derive(Debug, Deserialize)]
struct CsvPriceRow {
    table: String,
    age_range: String,
    #[serde(default)]
    value: Option<String>,
}

/// An element of the JSON export: `{"tabela", "faixa_etaria", "valor"}`.
#[derive(Debug, Deserialize)]
struct JsonPriceRow {
    #[serde(rename = "tabela")]
    table: String,
    #[serde(rename = "faixa_etaria")]
    age_range: String,
    #[serde(rename = "valor", default)]
    value: Option<RawPremium>,
}

impl From<JsonPriceRow> for PriceRecord {
    fn from(row: JsonPriceRow) -> Self {
        PriceRecord {
            table: row.table,
            bracket: PriceBracket::from(RawPriceBracket {
                age_range: row.age_range,
                value: row.value,
            }),
        }
    }
}

/// Counts reported after a load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub tables: usize,
    pub tables_created: usize,
    pub brackets: usize,
}

/// Loader for price tables from CSV or JSON.
///
/// Rows go through the [`PricingRepository`] trait so any backend works.
/// Labels are stored exactly as given; a malformed one is reported here and
/// skipped later at pricing time.
pub struct PriceTableLoader;

impl PriceTableLoader {
    /// Parse price records from a CSV reader with a
    /// `table,age_range,value` header.
    pub fn parse_csv<R: Read>(reader: R) -> Result<Vec<PriceRecord>, PriceLoaderError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::Fields)
            .from_reader(reader);
        let mut records = Vec::new();

        for result in csv_reader.deserialize() {
            let row: CsvPriceRow = result?;
            let raw = RawPriceBracket {
                age_range: row.age_range,
                value: row.value.filter(|v| !v.is_empty()).map(RawPremium::Text),
            };
            records.push(PriceRecord {
                table: row.table,
                bracket: PriceBracket::from(raw),
            });
        }

        Ok(records)
    }

    /// Parse price records from a JSON array of
    /// `{"tabela", "faixa_etaria", "valor"}` objects. `valor` may be a
    /// number, a string, null or absent.
    pub fn parse_json<R: Read>(reader: R) -> Result<Vec<PriceRecord>, PriceLoaderError> {
        let rows: Vec<JsonPriceRow> = serde_json::from_reader(reader)?;
        Ok(rows.into_iter().map(PriceRecord::from).collect())
    }

    /// Store `records`, one table at a time in the order tables first appear.
    ///
    /// For each table:
    /// 1. Look it up by name, creating it if missing
    /// 2. Delete its existing brackets
    /// 3. Insert its brackets in row order
    ///
    /// Loading the same records twice leaves the same data behind.
    pub async fn load<R: PricingRepository + ?Sized>(
        repo: &R,
        records: &[PriceRecord],
    ) -> Result<LoadSummary, PriceLoaderError> {
        let mut summary = LoadSummary::default();

        for (table_name, brackets) in group_by_table(records) {
            let table = match repo.get_price_table_by_name(table_name).await {
                Ok(table) => table,
                Err(RepositoryError::NotFound) => {
                    summary.tables_created += 1;
                    info!(table = table_name, "creating price table");
                    repo.create_price_table(NewPriceTable {
                        name: table_name.to_string(),
                    })
                    .await?
                }
                Err(other) => return Err(other.into()),
            };

            repo.delete_price_brackets(table.id).await?;

            for bracket in brackets {
                if BracketLabel::parse(&bracket.label).is_malformed() {
                    warn!(
                        table = table_name,
                        label = %bracket.label,
                        "storing malformed age range; it will never match"
                    );
                }
                repo.insert_price_bracket(table.id, bracket).await?;
                summary.brackets += 1;
            }

            debug!(table = table_name, table_id = table.id, "price table loaded");
            summary.tables += 1;
        }

        Ok(summary)
    }
}

/// Group brackets by table name, keeping first-seen table order and row
/// order within each table.
fn group_by_table(records: &[PriceRecord]) -> Vec<(&str, Vec<&PriceBracket>)> {
    let mut groups: Vec<(&str, Vec<&PriceBracket>)> = Vec::new();

    for record in records {
        match groups.iter_mut().find(|(name, _)| *name == record.table) {
            Some((_, brackets)) => brackets.push(&record.bracket),
            None => groups.push((record.table.as_str(), vec![&record.bracket])),
        }
    }

    groups
}

/// A row of the product links CSV: `product,carrier,table`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ProductLinkRecord {
    pub product: String,
    pub carrier: String,
    pub table: String,
}

/// Loader for product ↔ price table links.
pub struct ProductLinkLoader;

impl ProductLinkLoader {
    pub fn parse<R: Read>(reader: R) -> Result<Vec<ProductLinkRecord>, PriceLoaderError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::Fields)
            .from_reader(reader);
        let mut records = Vec::new();

        for result in csv_reader.deserialize() {
            let record: ProductLinkRecord = result?;
            records.push(record);
        }

        Ok(records)
    }

    /// Create missing products and link each to its named table.
    ///
    /// Tables must already exist. Existing links are left alone, so the
    /// load is idempotent. Returns the number of link rows processed.
    pub async fn load<R: PricingRepository + ?Sized>(
        repo: &R,
        records: &[ProductLinkRecord],
    ) -> Result<usize, PriceLoaderError> {
        let mut linked = 0;

        for record in records {
            let table = repo
                .get_price_table_by_name(&record.table)
                .await
                .map_err(|e| match e {
                    RepositoryError::NotFound => {
                        PriceLoaderError::TableNotFound(record.table.clone())
                    }
                    other => PriceLoaderError::Repository(other),
                })?;

            let product = match repo.get_product_by_name(&record.product).await {
                Ok(product) => product,
                Err(RepositoryError::NotFound) => {
                    info!(product = %record.product, "creating product");
                    repo.create_product(NewProduct {
                        name: record.product.clone(),
                        carrier: record.carrier.clone(),
                    })
                    .await?
                }
                Err(other) => return Err(other.into()),
            };

            repo.link_price_table(ProductTableLink {
                product_id: product.id,
                table_id: table.id,
            })
            .await?;
            linked += 1;
        }

        Ok(linked)
    }
}
