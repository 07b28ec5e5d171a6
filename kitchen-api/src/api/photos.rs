//! Image upload and fridge photo endpoints
//!
//! `POST /api/upload` stores the multipart `photo` field under the images
//! folder and returns the generated file name. Bodies over the configured
//! cap are rejected with 413; nothing is written in that case.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    extract::{DefaultBodyLimit, Multipart, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use kitchen_common::db::models::FridgePhoto;
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::Path;
use tracing::info;

use super::{status, IdQuery};
use crate::{ApiError, ApiResult, AppState};

/// Multipart field carrying the image
const PHOTO_FIELD: &str = "photo";

const DEFAULT_EXTENSION: &str = "jpg";

#[derive(Debug, Deserialize)]
pub struct NewPhoto {
    pub image_path: String,
    #[serde(default)]
    pub location: Option<String>,
}

/// Lowercased extension of the client's file name, if it looks like one
fn upload_extension(client_name: Option<&str>) -> String {
    client_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(str::to_ascii_lowercase)
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string())
}

/// `img_<unix nanos>_<8 hex>.<ext>`
fn generate_filename(extension: &str) -> String {
    let nanos = chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default();
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("img_{}_{}.{}", nanos, &suffix[..8], extension)
}

pub async fn upload_photo(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<Value>> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(PHOTO_FIELD) {
            continue;
        }

        let extension = upload_extension(field.file_name());
        let bytes = field.bytes().await?;
        if bytes.is_empty() {
            return Err(ApiError::BadRequest("photo is empty".to_string()));
        }

        let filename = generate_filename(&extension);
        tokio::fs::create_dir_all(&state.images_dir).await?;
        tokio::fs::write(state.images_dir.join(&filename), &bytes).await?;

        info!("Stored upload {} ({} bytes)", filename, bytes.len());
        return Ok(Json(json!({ "status": "success", "filename": filename })));
    }

    Err(ApiError::BadRequest(format!("multipart field '{}' required", PHOTO_FIELD)))
}

pub async fn list_photos(State(state): State<AppState>) -> ApiResult<Json<Vec<FridgePhoto>>> {
    Ok(Json(state.store.list_photos().await?))
}

pub async fn add_photo(
    State(state): State<AppState>,
    payload: Result<Json<NewPhoto>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<FridgePhoto>)> {
    let Json(photo) = payload?;
    let created = state
        .store
        .add_photo(&photo.image_path, photo.location, &state.default_location)
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Removes the row and the stored image file
pub async fn delete_photo(
    State(state): State<AppState>,
    query: Result<Query<IdQuery>, QueryRejection>,
) -> ApiResult<Json<Value>> {
    let Query(IdQuery { id }) = query?;
    state.store.delete_photo(id, &state.images_dir).await?;
    Ok(Json(status("deleted")))
}

pub fn photo_routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route(
            "/upload",
            post(upload_photo).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route(
            "/fridge_photos",
            get(list_photos).post(add_photo).delete(delete_photo),
        )
}
