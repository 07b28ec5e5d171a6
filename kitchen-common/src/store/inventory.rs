//! Inventory store

use super::catalog::classification_from_row;
use super::locations::ensure_location;
use super::{clean, limit_clause, Store};
use crate::db::models::{InventoryItem, InventoryUpdate, NewInventoryItem};
use crate::{Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};
use tracing::info;

const LIST_INVENTORY: &str = r#"
    SELECT i.id, i.catalog_id, i.amount, i.unit, i.expiration_date,
           i.location_id, l.name AS location, i.created_at, i.updated_at,
           c.name, c.kana, c.classification,
           (SELECT COUNT(DISTINCT ri.recipe_id)
              FROM recipe_ingredients ri
             WHERE ri.catalog_id = i.catalog_id) AS recipe_count
    FROM inventory_items i
    JOIN item_catalog c ON c.id = i.catalog_id
    JOIN locations l ON l.id = i.location_id
    ORDER BY l.priority ASC, COALESCE(c.kana, '') ASC, c.name ASC, i.id ASC
"#;

fn inventory_from_row(row: &SqliteRow) -> Result<InventoryItem> {
    let classification = classification_from_row(row)?;

    Ok(InventoryItem {
        id: row.try_get("id")?,
        catalog_id: row.try_get("catalog_id")?,
        amount: row.try_get("amount")?,
        unit: row.try_get("unit")?,
        expiration_date: row.try_get("expiration_date")?,
        location_id: row.try_get("location_id")?,
        location: row.try_get("location")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        name: row.try_get("name")?,
        kana: row.try_get("kana")?,
        classification,
        recipe_count: row.try_get("recipe_count")?,
    })
}

async fn require_location(conn: &mut SqliteConnection, location_id: i64) -> Result<()> {
    let found: Option<i64> = sqlx::query_scalar("SELECT id FROM locations WHERE id = ?")
        .bind(location_id)
        .fetch_optional(&mut *conn)
        .await?;
    match found {
        Some(_) => Ok(()),
        None => Err(Error::Conflict(format!("location {} does not exist", location_id))),
    }
}

impl Store {
    /// Inventory ordered by location priority, then kana, then name
    pub async fn list_inventory(&self, cap: Option<i64>) -> Result<Vec<InventoryItem>> {
        let sql = format!("{}{}", LIST_INVENTORY, limit_clause(cap));
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.iter().map(inventory_from_row).collect()
    }

    /// Add a stock row.
    ///
    /// `unit` falls back to the catalog entry's default unit; a missing
    /// `location_id` falls back to `default_location`.
    pub async fn add_inventory(&self, item: NewInventoryItem, default_location: &str) -> Result<i64> {
        let mut tx = self.begin_write().await?;

        let default_unit: Option<Option<String>> =
            sqlx::query_scalar("SELECT default_unit FROM item_catalog WHERE id = ?")
                .bind(item.catalog_id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some(default_unit) = default_unit else {
            return Err(Error::Conflict(format!(
                "catalog item {} does not exist",
                item.catalog_id
            )));
        };

        let location_id = match item.location_id {
            Some(id) => {
                require_location(&mut *tx, id).await?;
                id
            }
            None => ensure_location(&mut *tx, default_location).await?,
        };

        let id = sqlx::query(
            r#"
            INSERT INTO inventory_items (catalog_id, amount, unit, expiration_date, location_id)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(item.catalog_id)
        .bind(item.amount)
        .bind(clean(item.unit).or(default_unit))
        .bind(clean(item.expiration_date))
        .bind(location_id)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        tx.commit().await?;
        info!("Added inventory {} (catalog {})", id, item.catalog_id);
        Ok(id)
    }

    /// Update amount, expiration and location in place
    pub async fn update_inventory(&self, update: InventoryUpdate) -> Result<()> {
        let mut tx = self.begin_write().await?;
        require_location(&mut *tx, update.location_id).await?;

        let updated = sqlx::query(
            r#"
            UPDATE inventory_items
            SET amount = ?, expiration_date = ?, location_id = ?, updated_at = CURRENT_TIMESTAMP
            WHERE id = ?
            "#,
        )
        .bind(update.amount)
        .bind(clean(update.expiration_date))
        .bind(update.location_id)
        .bind(update.id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if updated == 0 {
            return Err(Error::NotFound(format!("inventory item {}", update.id)));
        }

        tx.commit().await?;
        Ok(())
    }

    pub async fn delete_inventory(&self, id: i64) -> Result<()> {
        let deleted = sqlx::query("DELETE FROM inventory_items WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if deleted == 0 {
            return Err(Error::NotFound(format!("inventory item {}", id)));
        }

        info!("Deleted inventory item {}", id);
        Ok(())
    }
}
