//! Inventory endpoints under `/api/ingredients`

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use kitchen_common::db::models::{InventoryItem, InventoryUpdate, NewInventoryItem};
use serde_json::{json, Value};

use super::{status, AllQuery, IdQuery};
use crate::{ApiResult, AppState};

/// GET /api/ingredients[?all=true]
pub async fn list_ingredients(
    State(state): State<AppState>,
    query: Result<Query<AllQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<InventoryItem>>> {
    let Query(AllQuery { all }) = query?;
    let cap = if all { None } else { state.limits.inventory };
    Ok(Json(state.store.list_inventory(cap).await?))
}

pub async fn add_ingredient(
    State(state): State<AppState>,
    payload: Result<Json<NewInventoryItem>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let Json(item) = payload?;
    let id = state.store.add_inventory(item, &state.default_location).await?;
    Ok((StatusCode::CREATED, Json(json!({ "status": "success", "id": id }))))
}

pub async fn update_ingredient(
    State(state): State<AppState>,
    payload: Result<Json<InventoryUpdate>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(update) = payload?;
    state.store.update_inventory(update).await?;
    Ok(Json(status("updated")))
}

pub async fn delete_ingredient(
    State(state): State<AppState>,
    query: Result<Query<IdQuery>, QueryRejection>,
) -> ApiResult<Json<Value>> {
    let Query(IdQuery { id }) = query?;
    state.store.delete_inventory(id).await?;
    Ok(Json(status("deleted")))
}

pub fn ingredient_routes() -> Router<AppState> {
    Router::new().route(
        "/ingredients",
        get(list_ingredients)
            .post(add_ingredient)
            .put(update_ingredient)
            .delete(delete_ingredient),
    )
}
