//! SQLite storage for products, price tables and their age brackets.

mod decimal;
pub mod factory;
pub mod repository;

pub use decimal::get_premium;
pub use factory::{SqliteRepositoryFactory, database_url, seeds_dir};
pub use repository::SqliteRepository;
