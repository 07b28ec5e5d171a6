//! Recipe store: listing with stock flags, save through the ingredient
//! parser, and per-recipe ingredient views

use super::catalog::classification_from_row;
use super::{clean, limit_clause, Store};
use crate::db::models::{
    Classification, Recipe, RecipeDraft, RecipeIngredientView, RecipeSummary,
};
use crate::parser;
use crate::{Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use std::collections::{HashMap, HashSet};
use tracing::info;

/// Compute the (has all ingredients, has all seasonings) pair for one
/// recipe's ingredient lines against the set of catalog ids in stock.
///
/// A class with no lines counts as fully stocked.
pub fn stock_flags(lines: &[(i64, Classification)], in_stock: &HashSet<i64>) -> (bool, bool) {
    let has_all = |class: Classification| {
        lines
            .iter()
            .filter(|(_, c)| *c == class)
            .all(|(catalog_id, _)| in_stock.contains(catalog_id))
    };

    (has_all(Classification::Ingredient), has_all(Classification::Seasoning))
}

fn recipe_from_row(row: &SqliteRow) -> Result<Recipe> {
    Ok(Recipe {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        yield_text: row.try_get("yield")?,
        process: row.try_get("process")?,
        original_process: row.try_get("original_process")?,
        original_ingredients: row.try_get("original_ingredients")?,
        url: row.try_get("url")?,
        created_at: row.try_get("created_at")?,
    })
}

impl Store {
    /// Catalog ids with at least one inventory row
    async fn stocked_catalog_ids(&self) -> Result<HashSet<i64>> {
        let ids: Vec<i64> = sqlx::query_scalar("SELECT DISTINCT catalog_id FROM inventory_items")
            .fetch_all(&self.pool)
            .await?;
        Ok(ids.into_iter().collect())
    }

    /// Recipes, newest first, each with stock availability flags.
    ///
    /// `ingredient` restricts the list to recipes using that catalog id.
    pub async fn list_recipes(
        &self,
        ingredient: Option<i64>,
        cap: Option<i64>,
    ) -> Result<Vec<RecipeSummary>> {
        let filter = if ingredient.is_some() {
            "WHERE id IN (SELECT recipe_id FROM recipe_ingredients WHERE catalog_id = ?)"
        } else {
            ""
        };
        let sql = format!(
            r#"
            SELECT id, name, yield, process, original_process, original_ingredients, url, created_at
            FROM recipes
            {}
            ORDER BY created_at DESC, id DESC{}
            "#,
            filter,
            limit_clause(cap)
        );

        let mut query = sqlx::query(&sql);
        if let Some(catalog_id) = ingredient {
            query = query.bind(catalog_id);
        }
        let recipes = query
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(recipe_from_row)
            .collect::<Result<Vec<_>>>()?;

        let line_rows = sqlx::query(
            r#"
            SELECT ri.recipe_id, ri.catalog_id, c.classification
            FROM recipe_ingredients ri
            JOIN item_catalog c ON c.id = ri.catalog_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut lines: HashMap<i64, Vec<(i64, Classification)>> = HashMap::new();
        for row in &line_rows {
            let recipe_id: i64 = row.try_get("recipe_id")?;
            let catalog_id: i64 = row.try_get("catalog_id")?;
            lines
                .entry(recipe_id)
                .or_default()
                .push((catalog_id, classification_from_row(row)?));
        }

        let in_stock = self.stocked_catalog_ids().await?;

        Ok(recipes
            .into_iter()
            .map(|recipe| {
                let recipe_lines = lines.get(&recipe.id).map(Vec::as_slice).unwrap_or_default();
                let (has_ingredients, has_seasonings) = stock_flags(recipe_lines, &in_stock);
                RecipeSummary {
                    recipe,
                    has_ingredients,
                    has_seasonings,
                }
            })
            .collect())
    }

    /// Insert (`id` = None) or replace a recipe and its ingredient lines.
    ///
    /// The ingredient block is resolved before anything is written; unknown
    /// names fail with [`Error::MissingIngredients`] and leave the database
    /// unchanged. On update every existing ingredient line is replaced.
    pub async fn save_recipe(&self, id: Option<i64>, draft: RecipeDraft) -> Result<i64> {
        let name = draft.name.trim().to_string();
        if name.is_empty() {
            return Err(Error::InvalidInput("name required".to_string()));
        }

        let mut tx = self.begin_write().await?;

        let rows = parser::resolve_block(&mut *tx, &draft.ingredients_text).await?;

        // Keep the verbatim paste unless the caller supplied its own copy
        let original_ingredients = if draft.original_ingredients.is_empty() {
            draft.ingredients_text.clone()
        } else {
            draft.original_ingredients.clone()
        };
        let conflict = || format!("recipe '{}' already exists", name);

        let recipe_id = match id {
            None => sqlx::query(
                r#"
                INSERT INTO recipes (name, yield, process, original_process, original_ingredients, url)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&name)
            .bind(clean(draft.yield_text))
            .bind(clean(draft.process))
            .bind(&draft.original_process)
            .bind(&original_ingredients)
            .bind(clean(draft.url))
            .execute(&mut *tx)
            .await
            .map_err(|e| Error::unique_conflict(e, conflict()))?
            .last_insert_rowid(),
            Some(recipe_id) => {
                let updated = sqlx::query(
                    r#"
                    UPDATE recipes
                    SET name = ?, yield = ?, process = ?, original_process = ?,
                        original_ingredients = ?, url = ?
                    WHERE id = ?
                    "#,
                )
                .bind(&name)
                .bind(clean(draft.yield_text))
                .bind(clean(draft.process))
                .bind(&draft.original_process)
                .bind(&original_ingredients)
                .bind(clean(draft.url))
                .bind(recipe_id)
                .execute(&mut *tx)
                .await
                .map_err(|e| Error::unique_conflict(e, conflict()))?
                .rows_affected();

                if updated == 0 {
                    return Err(Error::NotFound(format!("recipe {}", recipe_id)));
                }

                sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = ?")
                    .bind(recipe_id)
                    .execute(&mut *tx)
                    .await?;
                recipe_id
            }
        };

        for row in &rows {
            sqlx::query(
                r#"
                INSERT INTO recipe_ingredients (recipe_id, catalog_id, unit, amount, group_name, details)
                VALUES (?, ?, NULL, ?, ?, ?)
                "#,
            )
            .bind(recipe_id)
            .bind(row.catalog_id)
            .bind(&row.amount)
            .bind(&row.group_name)
            .bind(&row.details)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        info!("Saved recipe {} '{}' with {} ingredients", recipe_id, name, rows.len());
        Ok(recipe_id)
    }

    /// Ingredient lines of one recipe in entry order, marked with stock state
    pub async fn recipe_ingredients(&self, recipe_id: i64) -> Result<Vec<RecipeIngredientView>> {
        let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM recipes WHERE id = ?")
            .bind(recipe_id)
            .fetch_optional(&self.pool)
            .await?;
        if exists.is_none() {
            return Err(Error::NotFound(format!("recipe {}", recipe_id)));
        }

        let rows = sqlx::query(
            r#"
            SELECT c.name, ri.amount, ri.unit,
                   ri.group_name, ri.details, ri.catalog_id,
                   EXISTS (SELECT 1 FROM inventory_items i WHERE i.catalog_id = ri.catalog_id) AS in_stock
            FROM recipe_ingredients ri
            JOIN item_catalog c ON c.id = ri.catalog_id
            WHERE ri.recipe_id = ?
            ORDER BY ri.id ASC
            "#,
        )
        .bind(recipe_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> Result<RecipeIngredientView> {
                Ok(RecipeIngredientView {
                    name: row.try_get("name")?,
                    amount: row.try_get("amount")?,
                    unit: row.try_get("unit")?,
                    group_name: row.try_get("group_name")?,
                    details: row.try_get("details")?,
                    catalog_id: row.try_get("catalog_id")?,
                    in_stock: row.try_get::<i64, _>("in_stock")? != 0,
                })
            })
            .collect()
    }
}
