use std::path::PathBuf;

use async_trait::async_trait;

use premium_core::db::repository::{PricingRepository, RepositoryError};
use premium_core::db::{DbConfig, RepositoryFactory};

use crate::repository::SqliteRepository;

/// Resolve the seeds directory at runtime so it works in both development and
/// packaged distribution.
///
/// Resolution order:
/// 1. **`PREMIUM_DB_SQLITE_SEEDS_DIR`** if set (packagers, custom layouts).
/// 2. **`./seeds`** if the directory exists in the current working directory.
/// 3. **`$CARGO_MANIFEST_DIR/seeds`** as last resort (dev and tests).
pub fn seeds_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("PREMIUM_DB_SQLITE_SEEDS_DIR") {
        return PathBuf::from(dir);
    }
    let cwd_seeds = PathBuf::from("./seeds");
    if cwd_seeds.is_dir() {
        return cwd_seeds;
    }
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("seeds")
}

/// Turn a [`DbConfig::connection_string`] into a sqlx URL.
///
/// * `":memory:"` becomes `sqlite::memory:`.
/// * Anything already starting with `sqlite:` is passed through.
/// * A bare path is opened read-write and created if missing.
pub fn database_url(connection_string: &str) -> String {
    match connection_string {
        ":memory:" => "sqlite::memory:".to_string(),
        s if s.starts_with("sqlite:") => s.to_string(),
        path => format!("sqlite:{}?mode=rwc", path),
    }
}

/// In-memory databases start empty on every open, so they get the demo seeds.
fn is_in_memory(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

/// [`RepositoryFactory`] for SQLite.
///
/// Register this with a [`premium_core::db::RepositoryRegistry`] to make the
/// `"sqlite"` backend available:
///
/// ```rust,no_run
/// use premium_core::db::RepositoryRegistry;
/// use premium_db_sqlite::SqliteRepositoryFactory;
///
/// let mut registry = RepositoryRegistry::new();
/// registry.register(Box::new(SqliteRepositoryFactory));
/// ```
pub struct SqliteRepositoryFactory;

#[async_trait]
impl RepositoryFactory for SqliteRepositoryFactory {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    /// Open the database described by `config.connection_string` and apply
    /// migrations. Only in-memory databases also get the seed files from
    /// [`seeds_dir`]; a file database keeps exactly the data loaded into it.
    async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn PricingRepository>, RepositoryError> {
        let url = database_url(&config.connection_string);
        tracing::debug!(%url, "opening sqlite repository");

        let repo = SqliteRepository::new(&url)
            .await
            .map_err(|e| RepositoryError::Connection(format!("{:#}", e)))?;
        repo.run_migrations()
            .await
            .map_err(|e| RepositoryError::Database(format!("{:#}", e)))?;
        if is_in_memory(&url) {
            repo.run_seeds(&seeds_dir())
                .await
                .map_err(|e| RepositoryError::Database(format!("{:#}", e)))?;
        }
        Ok(Box::new(repo))
    }
}
