//! Catalog operations: listing, bulk upsert, rename-with-merge, guarded
//! delete, usage lookup and CSV import/export

use super::{clean, Store};
use crate::catalog_csv::{self, ImportReport};
use crate::db::models::{CatalogDraft, CatalogItem, CatalogUsage, Classification};
use crate::{Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};
use tracing::{info, warn};

/// Tables holding a `catalog_id` reference, with the label used in
/// conflict messages. Order is the order delete guards report in.
const DEPENDENT_TABLES: [(&str, &str); 3] = [
    ("recipe_ingredients", "recipes"),
    ("inventory_items", "inventory"),
    ("seasoning_stock", "seasoning list"),
];

/// Result of [`Store::update_catalog`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogUpdate {
    /// The entry was changed in place
    Updated,
    /// The entry was folded into `target_id` and removed
    Merged { target_id: i64 },
}

/// Decode the `classification` column of a catalog-joined row
pub(crate) fn classification_from_row(row: &SqliteRow) -> Result<Classification> {
    let text: String = row.try_get("classification")?;
    text.parse::<Classification>()
        .map_err(|e| Error::Database(sqlx::Error::Decode(e.into())))
}

pub(crate) fn catalog_from_row(row: &SqliteRow) -> Result<CatalogItem> {
    let classification = classification_from_row(row)?;

    Ok(CatalogItem {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        kana: row.try_get("kana")?,
        classification,
        category: row.try_get("category")?,
        default_unit: row.try_get("default_unit")?,
    })
}

/// Point every dependent row at `target_id`, then drop `source_id`
async fn merge_into(conn: &mut SqliteConnection, source_id: i64, target_id: i64) -> Result<()> {
    for (table, _) in DEPENDENT_TABLES {
        let moved = sqlx::query(&format!(
            "UPDATE {} SET catalog_id = ? WHERE catalog_id = ?",
            table
        ))
        .bind(target_id)
        .bind(source_id)
        .execute(&mut *conn)
        .await?
        .rows_affected();

        if moved > 0 {
            info!("  Repointed {} {} rows: {} -> {}", moved, table, source_id, target_id);
        }
    }

    sqlx::query("DELETE FROM item_catalog WHERE id = ?")
        .bind(source_id)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

impl Store {
    pub async fn list_catalog(&self) -> Result<Vec<CatalogItem>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, kana, classification, category, default_unit
            FROM item_catalog
            ORDER BY name ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(catalog_from_row).collect()
    }

    pub async fn get_catalog_item(&self, id: i64) -> Result<CatalogItem> {
        let row = sqlx::query(
            "SELECT id, name, kana, classification, category, default_unit FROM item_catalog WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("catalog item {}", id)))?;

        catalog_from_row(&row)
    }

    /// Insert or overwrite (by name) every draft in one transaction.
    ///
    /// An empty name aborts the whole batch.
    pub async fn upsert_catalog(&self, drafts: Vec<CatalogDraft>) -> Result<usize> {
        let mut tx = self.begin_write().await?;

        for draft in &drafts {
            let name = draft.name.trim();
            if name.is_empty() {
                return Err(Error::InvalidInput("name required".to_string()));
            }

            sqlx::query(
                r#"
                INSERT INTO item_catalog (name, kana, classification, category, default_unit)
                VALUES (?, ?, ?, ?, ?)
                ON CONFLICT(name) DO UPDATE SET
                    kana = excluded.kana,
                    classification = excluded.classification,
                    category = excluded.category,
                    default_unit = excluded.default_unit
                "#,
            )
            .bind(name)
            .bind(clean(draft.kana.clone()))
            .bind(draft.classification.as_str())
            .bind(clean(draft.category.clone()))
            .bind(clean(draft.default_unit.clone()))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        info!("Upserted {} catalog items", drafts.len());
        Ok(drafts.len())
    }

    /// Apply `draft` to catalog entry `id`.
    ///
    /// If another entry already has the proposed name, the update is refused
    /// with [`Error::MergeConfirmationRequired`] unless `force_merge` is set,
    /// in which case every inventory, seasoning and recipe-ingredient row
    /// pointing at `id` is repointed to that entry and `id` is deleted. The
    /// target's own attributes are left untouched. All of it happens in one
    /// transaction.
    pub async fn update_catalog(
        &self,
        id: i64,
        draft: CatalogDraft,
        force_merge: bool,
    ) -> Result<CatalogUpdate> {
        let name = draft.name.trim().to_string();
        if name.is_empty() {
            return Err(Error::InvalidInput("name required".to_string()));
        }

        let mut tx = self.begin_write().await?;

        let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM item_catalog WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(Error::NotFound(format!("catalog item {}", id)));
        }

        let collision: Option<(i64, String)> =
            sqlx::query_as("SELECT id, name FROM item_catalog WHERE name = ? AND id != ?")
                .bind(&name)
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;

        match collision {
            None => {
                sqlx::query(
                    r#"
                    UPDATE item_catalog
                    SET name = ?, kana = ?, classification = ?, category = ?, default_unit = ?
                    WHERE id = ?
                    "#,
                )
                .bind(&name)
                .bind(clean(draft.kana))
                .bind(draft.classification.as_str())
                .bind(clean(draft.category))
                .bind(clean(draft.default_unit))
                .bind(id)
                .execute(&mut *tx)
                .await?;

                tx.commit().await?;
                Ok(CatalogUpdate::Updated)
            }
            Some((target_id, target_name)) if !force_merge => {
                warn!(
                    "Catalog rename of {} collides with {} ({}); merge not confirmed",
                    id, target_id, target_name
                );
                Err(Error::MergeConfirmationRequired {
                    target_id,
                    target_name,
                })
            }
            Some((target_id, _)) => {
                merge_into(&mut *tx, id, target_id).await?;
                tx.commit().await?;
                info!("Merged catalog item {} into {}", id, target_id);
                Ok(CatalogUpdate::Merged { target_id })
            }
        }
    }

    /// Delete an unreferenced catalog entry.
    ///
    /// Fails with [`Error::Conflict`] naming the first dependent table that
    /// still references it.
    pub async fn delete_catalog(&self, id: i64) -> Result<()> {
        let mut tx = self.begin_write().await?;

        for (table, label) in DEPENDENT_TABLES {
            let count: i64 = sqlx::query_scalar(&format!(
                "SELECT COUNT(*) FROM {} WHERE catalog_id = ?",
                table
            ))
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

            if count > 0 {
                warn!("Refusing to delete catalog item {}: {} rows in {}", id, count, table);
                return Err(Error::Conflict(format!(
                    "catalog item {} is in use by {} ({} rows in {})",
                    id, label, count, table
                )));
            }
        }

        let deleted = sqlx::query("DELETE FROM item_catalog WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if deleted == 0 {
            return Err(Error::NotFound(format!("catalog item {}", id)));
        }

        tx.commit().await?;
        info!("Deleted catalog item {}", id);
        Ok(())
    }

    /// Count of recipes using a catalog entry and up to three of their names
    pub async fn catalog_usage(&self, id: i64) -> Result<CatalogUsage> {
        let recipe_count: i64 = sqlx::query_scalar(
            "SELECT COUNT(DISTINCT recipe_id) FROM recipe_ingredients WHERE catalog_id = ?",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        let recipe_names: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT DISTINCT r.name
            FROM recipes r
            JOIN recipe_ingredients ri ON r.id = ri.recipe_id
            WHERE ri.catalog_id = ?
            ORDER BY r.name
            LIMIT 3
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(CatalogUsage {
            recipe_count,
            recipe_names,
        })
    }

    /// Whole catalog as CSV, ordered by classification then name
    pub async fn export_catalog_csv(&self) -> Result<Vec<u8>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, kana, classification, category, default_unit
            FROM item_catalog
            ORDER BY classification, name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let items = rows.iter().map(catalog_from_row).collect::<Result<Vec<_>>>()?;
        catalog_csv::write_export(&items)
    }

    /// Import catalog rows from CSV.
    ///
    /// Existing names are skipped and counted, never modified. Row-level
    /// failures are collected and do not abort the batch.
    pub async fn import_catalog_csv(&self, bytes: &[u8]) -> Result<ImportReport> {
        let (drafts, parse_errors) = catalog_csv::parse_import(bytes);
        let mut report = ImportReport {
            errors: parse_errors,
            ..ImportReport::default()
        };

        let mut tx = self.begin_write().await?;

        for draft in drafts {
            let existing: Option<i64> =
                sqlx::query_scalar("SELECT id FROM item_catalog WHERE name = ?")
                    .bind(&draft.name)
                    .fetch_optional(&mut *tx)
                    .await?;
            if existing.is_some() {
                report.skipped += 1;
                continue;
            }

            let inserted = sqlx::query(
                r#"
                INSERT INTO item_catalog (name, classification, category, default_unit, kana)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(&draft.name)
            .bind(draft.classification.as_str())
            .bind(&draft.category)
            .bind(&draft.default_unit)
            .bind(&draft.kana)
            .execute(&mut *tx)
            .await;

            match inserted {
                Ok(_) => report.added += 1,
                Err(e) => report.errors.push(format!("{}: {}", draft.name, e)),
            }
        }

        tx.commit().await?;
        info!(
            "Catalog import: {} added, {} skipped, {} errors",
            report.added,
            report.skipped,
            report.errors.len()
        );
        Ok(report)
    }
}
