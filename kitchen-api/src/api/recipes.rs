//! Recipe endpoints
//!
//! Saving runs the pasted ingredient block through the parser. Unknown
//! names come back as 400 with `error_code: missing_ingredients` and the
//! list of names, so the client can offer to create catalog entries.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use kitchen_common::db::models::{RecipeDraft, RecipeIngredientView, RecipeSummary};
use serde::Deserialize;
use serde_json::{json, Value};

use super::IdQuery;
use crate::{ApiResult, AppState};

#[derive(Debug, Default, Deserialize)]
pub struct RecipeListQuery {
    /// Only recipes using this catalog id
    #[serde(default)]
    pub ingredient_id: Option<i64>,
    #[serde(default)]
    pub all: bool,
}

/// GET /api/recipes[?ingredient_id=N][&all=true]
pub async fn list_recipes(
    State(state): State<AppState>,
    query: Result<Query<RecipeListQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<RecipeSummary>>> {
    let Query(query) = query?;
    let cap = if query.all { None } else { state.limits.recipes };
    Ok(Json(state.store.list_recipes(query.ingredient_id, cap).await?))
}

pub async fn add_recipe(
    State(state): State<AppState>,
    payload: Result<Json<RecipeDraft>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let Json(draft) = payload?;
    let id = state.store.save_recipe(None, draft).await?;
    Ok((StatusCode::CREATED, Json(json!({ "status": "success", "id": id }))))
}

/// PUT /api/recipes?id=N replaces the recipe and all of its ingredient lines
pub async fn update_recipe(
    State(state): State<AppState>,
    query: Result<Query<IdQuery>, QueryRejection>,
    payload: Result<Json<RecipeDraft>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Query(IdQuery { id }) = query?;
    let Json(draft) = payload?;
    let id = state.store.save_recipe(Some(id), draft).await?;
    Ok(Json(json!({ "status": "success", "id": id })))
}

pub async fn recipe_ingredients(
    State(state): State<AppState>,
    query: Result<Query<IdQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<RecipeIngredientView>>> {
    let Query(IdQuery { id }) = query?;
    Ok(Json(state.store.recipe_ingredients(id).await?))
}

pub fn recipe_routes() -> Router<AppState> {
    Router::new()
        .route("/recipes", get(list_recipes).post(add_recipe).put(update_recipe))
        .route("/recipes/ingredients", get(recipe_ingredients))
}
