//! Catalog endpoints
//!
//! - `GET    /api/catalog`         list
//! - `POST   /api/catalog`         bulk upsert (JSON array)
//! - `PUT    /api/catalog`         update, merging on confirmed name collision
//! - `DELETE /api/catalog?id=`     delete an unreferenced entry
//! - `GET    /api/catalog/usage?id=`
//! - `GET    /api/catalog/export`  CSV download
//! - `POST   /api/catalog/import`  CSV upload (raw body)

use axum::{
    body::Bytes,
    extract::rejection::{JsonRejection, QueryRejection},
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use kitchen_common::catalog_csv::ImportReport;
use kitchen_common::db::models::{CatalogDraft, CatalogItem, CatalogUsage};
use kitchen_common::store::CatalogUpdate;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use super::{status, IdQuery};
use crate::{ApiResult, AppState};

/// PUT body: the target id, the new attributes and the merge confirmation
#[derive(Debug, Deserialize)]
pub struct UpdateCatalogRequest {
    pub id: i64,
    #[serde(flatten)]
    pub draft: CatalogDraft,
    #[serde(default)]
    pub force_merge: bool,
}

pub async fn list_catalog(State(state): State<AppState>) -> ApiResult<Json<Vec<CatalogItem>>> {
    Ok(Json(state.store.list_catalog().await?))
}

pub async fn upsert_catalog(
    State(state): State<AppState>,
    payload: Result<Json<Vec<CatalogDraft>>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(drafts) = payload?;
    let count = state.store.upsert_catalog(drafts).await?;
    Ok(Json(json!({ "status": "success", "count": count })))
}

/// Returns 409 `merge_confirmation_required` when the new name is taken and
/// `force_merge` is false
pub async fn update_catalog(
    State(state): State<AppState>,
    payload: Result<Json<UpdateCatalogRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(request) = payload?;

    let body = match state
        .store
        .update_catalog(request.id, request.draft, request.force_merge)
        .await?
    {
        CatalogUpdate::Updated => status("success"),
        CatalogUpdate::Merged { target_id } => {
            json!({ "status": "merged", "target_id": target_id })
        }
    };

    Ok(Json(body))
}

pub async fn delete_catalog(
    State(state): State<AppState>,
    query: Result<Query<IdQuery>, QueryRejection>,
) -> ApiResult<Json<Value>> {
    let Query(IdQuery { id }) = query?;
    state.store.delete_catalog(id).await?;
    Ok(Json(status("deleted")))
}

pub async fn catalog_usage(
    State(state): State<AppState>,
    query: Result<Query<IdQuery>, QueryRejection>,
) -> ApiResult<Json<CatalogUsage>> {
    let Query(IdQuery { id }) = query?;
    Ok(Json(state.store.catalog_usage(id).await?))
}

pub async fn export_catalog(State(state): State<AppState>) -> ApiResult<Response> {
    let csv = state.store.export_catalog_csv().await?;
    let filename = format!(
        "catalog_export_{}.csv",
        chrono::Local::now().format("%Y%m%d%H%M%S")
    );
    info!("Exported catalog ({} bytes) as {}", csv.len(), filename);

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        csv,
    )
        .into_response())
}

pub async fn import_catalog(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<Json<ImportReport>> {
    Ok(Json(state.store.import_catalog_csv(&body).await?))
}

/// Build catalog routes
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/catalog",
            get(list_catalog)
                .post(upsert_catalog)
                .put(update_catalog)
                .delete(delete_catalog),
        )
        .route("/catalog/usage", get(catalog_usage))
        .route("/catalog/export", get(export_catalog))
        .route("/catalog/import", post(import_catalog))
}
