//! kitchen-api library - HTTP surface of the kitchen inventory service
//!
//! Handlers are thin adapters between the wire format (JSON, CSV,
//! multipart) and [`kitchen_common::Store`].

use axum::Router;
use kitchen_common::config::{AuthConfig, TomlConfig};
use kitchen_common::store::ListingLimits;
use kitchen_common::Store;
use std::path::PathBuf;

pub mod api;
pub mod error;

pub use error::{ApiError, ApiResult};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database store, opened and closed by the composition root
    pub store: Store,
    /// Row caps for inventory and recipe listings
    pub limits: ListingLimits,
    /// Location used when an inventory row or photo names none
    pub default_location: String,
    /// Folder holding uploaded images
    pub images_dir: PathBuf,
    /// Basic auth credentials; an empty password disables the check
    pub auth: AuthConfig,
    /// Upload size cap in bytes
    pub max_upload_bytes: usize,
    /// Web front-end folder served at `/`, if configured
    pub static_dir: Option<PathBuf>,
}

impl AppState {
    pub fn new(store: Store, config: &TomlConfig, images_dir: PathBuf) -> Self {
        Self {
            store,
            limits: ListingLimits::from_config(&config.listing),
            default_location: config.default_location.clone(),
            images_dir,
            auth: config.auth.clone(),
            max_upload_bytes: config.upload.max_bytes,
            static_dir: config.static_dir.clone(),
        }
    }
}

/// Build application router
///
/// `/health` is public; everything else sits behind Basic auth. JSON
/// endpoints live under `/api`, stored images under `/images`, and the web
/// front end (when `static_dir` is set) at `/`.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use tower_http::cors::CorsLayer;
    use tower_http::services::ServeDir;
    use tower_http::trace::TraceLayer;

    let api_routes = Router::new()
        .merge(api::catalog_routes())
        .merge(api::ingredient_routes())
        .merge(api::seasoning_routes())
        .merge(api::recipe_routes())
        .merge(api::location_routes())
        .merge(api::photo_routes(state.max_upload_bytes))
        .fallback(api::not_found);

    // Protected routes (require authentication)
    let mut protected = Router::new()
        .nest("/api", api_routes)
        .nest_service("/images", ServeDir::new(&state.images_dir));
    if let Some(static_dir) = &state.static_dir {
        protected = protected.fallback_service(ServeDir::new(static_dir));
    }
    let protected = protected
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::auth_middleware,
        ));

    // Public routes (no authentication)
    let public = Router::new().merge(api::health_routes());

    Router::new()
        .merge(protected)
        .merge(public)
        .layer(TraceLayer::new_for_http())
        // Enable CORS for local access
        .layer(CorsLayer::permissive())
        .with_state(state)
}
