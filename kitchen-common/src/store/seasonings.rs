//! Legacy seasoning presence list
//!
//! Inventory rows are the source of truth for stock, seasonings included.
//! This table is kept so older clients keep working; the catalog merge and
//! delete guard still account for it.

use super::catalog::classification_from_row;
use super::{clean, Store};
use crate::db::models::SeasoningStock;
use crate::{Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::info;

const DEFAULT_STATUS: &str = "present";

fn seasoning_from_row(row: &SqliteRow) -> Result<SeasoningStock> {
    let classification = classification_from_row(row)?;

    Ok(SeasoningStock {
        id: row.try_get("id")?,
        catalog_id: row.try_get("catalog_id")?,
        status: row.try_get("status")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        name: row.try_get("name")?,
        classification,
        category: row.try_get("category")?,
    })
}

impl Store {
    pub async fn list_seasonings(&self) -> Result<Vec<SeasoningStock>> {
        let rows = sqlx::query(
            r#"
            SELECT s.id, s.catalog_id, s.status, s.created_at, s.updated_at,
                   c.name, c.classification, c.category
            FROM seasoning_stock s
            JOIN item_catalog c ON c.id = s.catalog_id
            ORDER BY COALESCE(c.kana, '') ASC, c.name ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(seasoning_from_row).collect()
    }

    /// Record a seasoning; status defaults to `present`
    pub async fn add_seasoning(&self, catalog_id: i64, status: Option<String>) -> Result<i64> {
        let mut tx = self.begin_write().await?;

        let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM item_catalog WHERE id = ?")
            .bind(catalog_id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(Error::Conflict(format!("catalog item {} does not exist", catalog_id)));
        }

        let status = clean(status).unwrap_or_else(|| DEFAULT_STATUS.to_string());
        let id = sqlx::query("INSERT INTO seasoning_stock (catalog_id, status) VALUES (?, ?)")
            .bind(catalog_id)
            .bind(&status)
            .execute(&mut *tx)
            .await?
            .last_insert_rowid();

        tx.commit().await?;
        info!("Added seasoning {} (catalog {}, {})", id, catalog_id, status);
        Ok(id)
    }

    pub async fn delete_seasoning(&self, id: i64) -> Result<()> {
        let deleted = sqlx::query("DELETE FROM seasoning_stock WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if deleted == 0 {
            return Err(Error::NotFound(format!("seasoning {}", id)));
        }
        Ok(())
    }
}
