//! Storage location endpoints under `/api/locations`
//!
//! PUT takes the full ordered list and reassigns priorities 1..=n.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use kitchen_common::db::models::Location;
use serde::Deserialize;
use serde_json::Value;

use super::{status, IdQuery};
use crate::{ApiResult, AppState};

#[derive(Debug, Deserialize)]
pub struct NewLocation {
    pub name: String,
}

/// Element of the PUT body; other fields a client echoes back are ignored
#[derive(Debug, Deserialize)]
pub struct LocationRef {
    pub id: i64,
}

pub async fn list_locations(State(state): State<AppState>) -> ApiResult<Json<Vec<Location>>> {
    Ok(Json(state.store.list_locations().await?))
}

pub async fn add_location(
    State(state): State<AppState>,
    payload: Result<Json<NewLocation>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Location>)> {
    let Json(location) = payload?;
    let created = state.store.add_location(&location.name).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn reorder_locations(
    State(state): State<AppState>,
    payload: Result<Json<Vec<LocationRef>>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(order) = payload?;
    let ids: Vec<i64> = order.into_iter().map(|l| l.id).collect();
    state.store.reorder_locations(&ids).await?;
    Ok(Json(status("success")))
}

pub async fn delete_location(
    State(state): State<AppState>,
    query: Result<Query<IdQuery>, QueryRejection>,
) -> ApiResult<Json<Value>> {
    let Query(IdQuery { id }) = query?;
    state.store.delete_location(id).await?;
    Ok(Json(status("deleted")))
}

pub fn location_routes() -> Router<AppState> {
    Router::new().route(
        "/locations",
        get(list_locations)
            .post(add_location)
            .put(reorder_locations)
            .delete(delete_location),
    )
}
