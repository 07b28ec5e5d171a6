//! HTTP error type for kitchen-api
//!
//! Every handler returns [`ApiResult`]. Store errors convert through
//! `From<kitchen_common::Error>` and are mapped to a status here, so
//! handlers never pick status codes for store failures themselves.

use axum::{
    extract::multipart::MultipartError,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use kitchen_common::Error as CommonError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request (400)
    #[error("{0}")]
    BadRequest(String),

    /// Resource not found (404)
    #[error("{0}")]
    NotFound(String),

    /// Upload exceeds the configured cap (413)
    #[error("{0}")]
    PayloadTooLarge(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// kitchen-common error
    #[error(transparent)]
    Common(#[from] CommonError),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge(err.body_text())
        } else {
            ApiError::BadRequest(err.body_text())
        }
    }
}

fn plain(status: StatusCode, message: String) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(msg) => plain(StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => plain(StatusCode::NOT_FOUND, msg),
            ApiError::PayloadTooLarge(msg) => plain(StatusCode::PAYLOAD_TOO_LARGE, msg),
            ApiError::Io(err) => {
                error!("IO error: {}", err);
                plain(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
            ApiError::Common(err) => common_response(err),
        }
    }
}

fn common_response(err: CommonError) -> Response {
    let message = err.to_string();
    match err {
        CommonError::InvalidInput(msg) => plain(StatusCode::BAD_REQUEST, msg),
        CommonError::NotFound(what) => plain(StatusCode::NOT_FOUND, format!("{} not found", what)),
        CommonError::Conflict(msg) => plain(StatusCode::CONFLICT, msg),
        CommonError::MissingIngredients(items) => (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error_code": "missing_ingredients",
                "items": items,
            })),
        )
            .into_response(),
        CommonError::MergeConfirmationRequired { target_id, .. } => (
            StatusCode::CONFLICT,
            Json(json!({
                "error_code": "merge_confirmation_required",
                "target_id": target_id,
                "message": message,
            })),
        )
            .into_response(),
        _ => {
            error!("Request failed: {}", message);
            plain(StatusCode::INTERNAL_SERVER_ERROR, message)
        }
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
