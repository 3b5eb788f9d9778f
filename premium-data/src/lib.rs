//! Import price tables and product links into a pricing repository.

pub mod loader;

pub use loader::{
    LoadSummary, PriceLoaderError, PriceRecord, PriceTableLoader, ProductLinkLoader,
    ProductLinkRecord,
};
