//! Storage location registry

use super::Store;
use crate::db::models::Location;
use crate::{Error, Result};
use sqlx::SqliteConnection;
use tracing::info;

/// Find a location by name, appending it at the lowest priority if absent
pub(crate) async fn ensure_location(conn: &mut SqliteConnection, name: &str) -> Result<i64> {
    let existing: Option<i64> = sqlx::query_scalar("SELECT id FROM locations WHERE name = ?")
        .bind(name)
        .fetch_optional(&mut *conn)
        .await?;
    if let Some(id) = existing {
        return Ok(id);
    }

    let id = sqlx::query(
        "INSERT INTO locations (name, priority) SELECT ?, COALESCE(MAX(priority), 0) + 1 FROM locations",
    )
    .bind(name)
    .execute(&mut *conn)
    .await?
    .last_insert_rowid();

    info!("Created location '{}' ({})", name, id);
    Ok(id)
}

impl Store {
    pub async fn list_locations(&self) -> Result<Vec<Location>> {
        let locations = sqlx::query_as::<_, (i64, String, i64)>(
            "SELECT id, name, priority FROM locations ORDER BY priority ASC, id ASC",
        )
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(|(id, name, priority)| Location { id, name, priority })
        .collect();

        Ok(locations)
    }

    /// Add a location after all existing ones
    pub async fn add_location(&self, name: &str) -> Result<Location> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidInput("name required".to_string()));
        }

        let mut tx = self.begin_write().await?;

        let priority: i64 = sqlx::query_scalar("SELECT COALESCE(MAX(priority), 0) + 1 FROM locations")
            .fetch_one(&mut *tx)
            .await?;

        let id = sqlx::query("INSERT INTO locations (name, priority) VALUES (?, ?)")
            .bind(name)
            .bind(priority)
            .execute(&mut *tx)
            .await
            .map_err(|e| Error::unique_conflict(e, format!("location '{}' already exists", name)))?
            .last_insert_rowid();

        tx.commit().await?;
        info!("Added location '{}' at priority {}", name, priority);

        Ok(Location {
            id,
            name: name.to_string(),
            priority,
        })
    }

    /// Delete a location no inventory row references
    pub async fn delete_location(&self, id: i64) -> Result<()> {
        let mut tx = self.begin_write().await?;

        let in_use: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM inventory_items WHERE location_id = ?")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
        if in_use > 0 {
            return Err(Error::Conflict(format!(
                "location {} is in use by inventory ({} rows in inventory_items)",
                id, in_use
            )));
        }

        let deleted = sqlx::query("DELETE FROM locations WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if deleted == 0 {
            return Err(Error::NotFound(format!("location {}", id)));
        }

        tx.commit().await?;
        info!("Deleted location {}", id);
        Ok(())
    }

    /// Reassign priorities 1..=n following the order of `ids`
    pub async fn reorder_locations(&self, ids: &[i64]) -> Result<()> {
        let mut tx = self.begin_write().await?;

        for (index, id) in ids.iter().enumerate() {
            let updated = sqlx::query("UPDATE locations SET priority = ? WHERE id = ?")
                .bind(index as i64 + 1)
                .bind(id)
                .execute(&mut *tx)
                .await?
                .rows_affected();
            if updated == 0 {
                return Err(Error::NotFound(format!("location {}", id)));
            }
        }

        tx.commit().await?;
        info!("Reordered {} locations", ids.len());
        Ok(())
    }
}
