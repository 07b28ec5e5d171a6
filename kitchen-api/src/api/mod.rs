//! HTTP API handlers for kitchen-api

pub mod auth;
pub mod catalog;
pub mod health;
pub mod ingredients;
pub mod locations;
pub mod photos;
pub mod recipes;
pub mod seasonings;

pub use auth::auth_middleware;
pub use catalog::catalog_routes;
pub use health::health_routes;
pub use ingredients::ingredient_routes;
pub use locations::location_routes;
pub use photos::photo_routes;
pub use recipes::recipe_routes;
pub use seasonings::seasoning_routes;

use axum::extract::OriginalUri;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::ApiError;

/// `?id=` query parameter addressing a single row
#[derive(Debug, Deserialize)]
pub struct IdQuery {
    pub id: i64,
}

/// `?all=true` bypasses listing row caps
#[derive(Debug, Default, Deserialize)]
pub struct AllQuery {
    #[serde(default)]
    pub all: bool,
}

/// `{"status": "<status>"}` acknowledgement body
pub(crate) fn status(status: &str) -> Value {
    json!({ "status": status })
}

/// Fallback for unknown paths under `/api`
pub async fn not_found(OriginalUri(uri): OriginalUri) -> ApiError {
    ApiError::NotFound(format!("no route for {}", uri.path()))
}
