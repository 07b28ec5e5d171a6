//! Database models

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Whether a catalog item is tracked as a regular ingredient or a seasoning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    #[default]
    Ingredient,
    Seasoning,
}

impl Classification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::Ingredient => "ingredient",
            Classification::Seasoning => "seasoning",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Classification {
    type Err = String;

    /// Case-insensitive; also accepts the legacy labels found in old CSV dumps
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ingredient" | "食材" => Ok(Classification::Ingredient),
            "seasoning" | "調味料" => Ok(Classification::Seasoning),
            other => Err(format!("unknown classification: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: i64,
    pub name: String,
    pub kana: Option<String>,
    pub classification: Classification,
    pub category: Option<String>,
    pub default_unit: Option<String>,
}

/// Fields for creating or replacing a catalog entry
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogDraft {
    pub name: String,
    #[serde(default)]
    pub kana: Option<String>,
    #[serde(default)]
    pub classification: Classification,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub default_unit: Option<String>,
}

/// Physical stock row joined with its catalog entry and location
#[derive(Debug, Clone, Serialize)]
pub struct InventoryItem {
    pub id: i64,
    pub catalog_id: i64,
    pub amount: Option<f64>,
    pub unit: Option<String>,
    pub expiration_date: Option<String>,
    pub location_id: i64,
    pub location: String,
    pub created_at: String,
    pub updated_at: String,
    pub name: String,
    pub kana: Option<String>,
    pub classification: Classification,
    /// Number of distinct recipes referencing this catalog item
    pub recipe_count: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewInventoryItem {
    pub catalog_id: i64,
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub expiration_date: Option<String>,
    /// Falls back to the configured default location when absent
    #[serde(default)]
    pub location_id: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InventoryUpdate {
    pub id: i64,
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub expiration_date: Option<String>,
    pub location_id: i64,
}

/// Legacy seasoning presence row
#[derive(Debug, Clone, Serialize)]
pub struct SeasoningStock {
    pub id: i64,
    pub catalog_id: i64,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
    pub name: String,
    pub classification: Classification,
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: i64,
    pub name: String,
    pub priority: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Recipe {
    pub id: i64,
    pub name: String,
    #[serde(rename = "yield")]
    pub yield_text: Option<String>,
    pub process: Option<String>,
    pub original_process: String,
    pub original_ingredients: String,
    pub url: Option<String>,
    pub created_at: String,
}

/// Recipe listing row with stock availability flags
#[derive(Debug, Clone, Serialize)]
pub struct RecipeSummary {
    #[serde(flatten)]
    pub recipe: Recipe,
    pub has_ingredients: bool,
    pub has_seasonings: bool,
}

/// Fields submitted when saving a recipe
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecipeDraft {
    pub name: String,
    #[serde(default, rename = "yield")]
    pub yield_text: Option<String>,
    #[serde(default)]
    pub process: Option<String>,
    #[serde(default)]
    pub original_process: String,
    #[serde(default)]
    pub url: Option<String>,
    /// Free-text ingredient block run through the parser
    #[serde(default, alias = "csv_data")]
    pub ingredients_text: String,
    #[serde(default)]
    pub original_ingredients: String,
}

/// Recipe ingredient line resolved against the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecipeIngredientRow {
    pub catalog_id: i64,
    pub amount: String,
    pub group_name: String,
    pub details: String,
}

/// Recipe ingredient with catalog name and current stock state
#[derive(Debug, Clone, Serialize)]
pub struct RecipeIngredientView {
    pub name: String,
    pub amount: String,
    pub unit: Option<String>,
    pub group_name: String,
    pub details: String,
    pub catalog_id: i64,
    pub in_stock: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CatalogUsage {
    pub recipe_count: i64,
    pub recipe_names: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FridgePhoto {
    pub id: i64,
    pub image_path: String,
    pub location: String,
    pub created_at: String,
}
