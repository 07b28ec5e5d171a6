//! Store handle over the kitchen database
//!
//! A [`Store`] is constructed once by the composition root and cloned into
//! whatever needs database access. Each submodule adds the operations for
//! one aggregate. Multi-statement operations run inside a transaction that
//! rolls back on drop, so an early `?` return never leaves partial writes.

mod catalog;
mod inventory;
mod locations;
mod photos;
mod recipes;
mod seasonings;

pub use catalog::CatalogUpdate;
pub use recipes::stock_flags;

use crate::config::ListingConfig;
use crate::Result;
use sqlx::{Sqlite, SqlitePool, Transaction};
use std::path::Path;
use tracing::info;

/// Row caps applied to inventory and recipe listings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListingLimits {
    pub inventory: Option<i64>,
    pub recipes: Option<i64>,
}

impl ListingLimits {
    /// No caps
    pub fn unlimited() -> Self {
        Self::default()
    }

    pub fn from_config(config: &ListingConfig) -> Self {
        if config.constrained {
            Self {
                inventory: Some(config.inventory_row_cap),
                recipes: Some(config.recipe_row_cap),
            }
        } else {
            Self::unlimited()
        }
    }
}

/// Append ` LIMIT n` when a cap applies
fn limit_clause(cap: Option<i64>) -> String {
    cap.map(|n| format!(" LIMIT {}", n)).unwrap_or_default()
}

/// Trim and drop empty optional text so blank form fields store as NULL
fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[derive(Debug, Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Open (creating if needed) and migrate the database at `db_path`
    pub async fn open(db_path: &Path) -> Result<Self> {
        let pool = crate::db::init_database(db_path).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Write transaction that takes SQLite's write lock at `BEGIN`, so a
    /// read-then-write step waits on the busy timeout instead of failing
    /// with SQLITE_BUSY.
    pub(crate) async fn begin_write(&self) -> Result<Transaction<'static, Sqlite>> {
        Ok(self.pool.begin_with("BEGIN IMMEDIATE").await?)
    }

    /// Close all pooled connections
    pub async fn close(&self) {
        self.pool.close().await;
        info!("Database connections closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limits_from_config() {
        let mut config = ListingConfig::default();
        assert_eq!(ListingLimits::from_config(&config), ListingLimits::unlimited());

        config.constrained = true;
        let limits = ListingLimits::from_config(&config);
        assert_eq!(limits.inventory, Some(100));
        assert_eq!(limits.recipes, Some(50));
    }

    #[test]
    fn test_limit_clause() {
        assert_eq!(limit_clause(None), "");
        assert_eq!(limit_clause(Some(5)), " LIMIT 5");
    }

    #[test]
    fn test_clean() {
        assert_eq!(clean(Some("  ".to_string())), None);
        assert_eq!(clean(Some(" kg ".to_string())), Some("kg".to_string()));
        assert_eq!(clean(None), None);
    }
}
