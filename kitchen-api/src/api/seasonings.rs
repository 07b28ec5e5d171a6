//! Legacy seasoning list endpoints under `/api/seasonings`

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use kitchen_common::db::models::SeasoningStock;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{status, IdQuery};
use crate::{ApiResult, AppState};

#[derive(Debug, Deserialize)]
pub struct NewSeasoning {
    pub catalog_id: i64,
    #[serde(default)]
    pub status: Option<String>,
}

pub async fn list_seasonings(State(state): State<AppState>) -> ApiResult<Json<Vec<SeasoningStock>>> {
    Ok(Json(state.store.list_seasonings().await?))
}

pub async fn add_seasoning(
    State(state): State<AppState>,
    payload: Result<Json<NewSeasoning>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let Json(seasoning) = payload?;
    let id = state
        .store
        .add_seasoning(seasoning.catalog_id, seasoning.status)
        .await?;
    Ok((StatusCode::CREATED, Json(json!({ "status": "success", "id": id }))))
}

pub async fn delete_seasoning(
    State(state): State<AppState>,
    query: Result<Query<IdQuery>, QueryRejection>,
) -> ApiResult<Json<Value>> {
    let Query(IdQuery { id }) = query?;
    state.store.delete_seasoning(id).await?;
    Ok(Json(status("deleted")))
}

pub fn seasoning_routes() -> Router<AppState> {
    Router::new().route(
        "/seasonings",
        get(list_seasonings).post(add_seasoning).delete(delete_seasoning),
    )
}
