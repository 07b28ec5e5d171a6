//! Authentication middleware for kitchen-api
//!
//! HTTP Basic credentials checked against the `[auth]` section of the
//! bootstrap config. An empty configured password disables the check.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde_json::json;
use tracing::warn;

use crate::AppState;

const REALM: &str = r#"Basic realm="kitchen""#;

/// Authentication middleware
///
/// Returns 401 Unauthorized with a `WWW-Authenticate` challenge if the
/// request carries no or wrong credentials.
///
/// **Note:** This is applied to protected routes only.
/// Health endpoint (/health) does NOT use this middleware.
pub async fn auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    if !state.auth.is_enabled() {
        return Ok(next.run(request).await);
    }

    let (username, password) = basic_credentials(request.headers())?;
    if username != state.auth.username || password != state.auth.password {
        warn!("Rejected credentials for user '{}' on {}", username, request.uri().path());
        return Err(AuthError::InvalidCredentials);
    }

    Ok(next.run(request).await)
}

/// Decode `Authorization: Basic <base64(user:pass)>`
fn basic_credentials(headers: &HeaderMap) -> Result<(String, String), AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    let encoded = value
        .strip_prefix("Basic ")
        .ok_or(AuthError::MissingCredentials)?;
    let decoded = STANDARD
        .decode(encoded.trim())
        .map_err(|_| AuthError::Malformed)?;
    let decoded = String::from_utf8(decoded).map_err(|_| AuthError::Malformed)?;

    let (username, password) = decoded.split_once(':').ok_or(AuthError::Malformed)?;
    Ok((username.to_string(), password.to_string()))
}

/// Authentication error types for HTTP responses
#[derive(Debug)]
pub enum AuthError {
    MissingCredentials,
    Malformed,
    InvalidCredentials,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let message = match self {
            AuthError::MissingCredentials => "Authentication required",
            AuthError::Malformed => "Malformed Authorization header",
            AuthError::InvalidCredentials => "Invalid credentials",
        };

        let mut response = (StatusCode::UNAUTHORIZED, Json(json!({ "error": message }))).into_response();
        response
            .headers_mut()
            .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static(REALM));
        response
    }
}
