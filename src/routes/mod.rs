pub mod auth;
pub mod categories;
pub mod health;
pub mod posts;

use axum::{
    http::{header, HeaderMap, StatusCode},
    Json,
};
use serde_json::{json, Value};
use validator::ValidationErrors;

/// The User-Agent recorded as the session `platform`.
pub(crate) fn user_agent(headers: &HeaderMap) -> Option<&str> {
    headers.get(header::USER_AGENT).and_then(|v| v.to_str().ok())
}

pub(crate) fn invalid_body(errors: ValidationErrors) -> (StatusCode, Json<Value>) {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": "Invalid request body", "details": errors })),
    )
}

pub(crate) fn internal_error(e: anyhow::Error) -> (StatusCode, Json<Value>) {
    tracing::error!("{e:#}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "Internal server error" })),
    )
}

/// Result of an UPDATE .. RETURNING. A missing row means it was deleted
/// after the ownership check and is reported as 404.
pub(crate) fn updated<T>(
    result: anyhow::Result<Option<T>>,
    missing: &'static str,
) -> Result<Json<T>, (StatusCode, Json<Value>)> {
    match result {
        Ok(Some(row)) => Ok(Json(row)),
        Ok(None) => Err((StatusCode::NOT_FOUND, Json(json!({ "error": missing })))),
        Err(e) => Err(internal_error(e)),
    }
}
