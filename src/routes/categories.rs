use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use validator::Validate;

use crate::{
    models::{
        auth::AuthSession,
        category::{Category, CategoryRequest},
    },
    routes::{internal_error, invalid_body, updated},
    services::categories::CategoryService,
    AppState,
};

/// Loads a category the caller is allowed to change. Only its author may.
async fn owned_category(
    state: &AppState,
    id: i32,
    session: &AuthSession,
) -> Result<Category, (StatusCode, Json<Value>)> {
    let category = CategoryService::get(&state.db, id)
        .await
        .map_err(internal_error)?
        .ok_or((StatusCode::NOT_FOUND, Json(json!({ "error": "Category not found" }))))?;
    if category.author_id != session.principal.id {
        return Err((StatusCode::FORBIDDEN, Json(json!({ "error": "Unauthorized user" }))));
    }
    Ok(category)
}

pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<Category>>, (StatusCode, Json<Value>)> {
    CategoryService::list(&state.db)
        .await
        .map(Json)
        .map_err(internal_error)
}

pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Category>, (StatusCode, Json<Value>)> {
    CategoryService::get(&state.db, id)
        .await
        .map_err(internal_error)?
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, Json(json!({ "error": "Category not found" }))))
}

pub async fn create_category(
    State(state): State<AppState>,
    session: AuthSession,
    Json(body): Json<CategoryRequest>,
) -> Result<(StatusCode, Json<Category>), (StatusCode, Json<Value>)> {
    body.validate().map_err(invalid_body)?;
    CategoryService::create(&state.db, session.principal.id, &body)
        .await
        .map(|category| (StatusCode::CREATED, Json(category)))
        .map_err(internal_error)
}

pub async fn update_category(
    State(state): State<AppState>,
    session: AuthSession,
    Path(id): Path<i32>,
    Json(body): Json<CategoryRequest>,
) -> Result<Json<Category>, (StatusCode, Json<Value>)> {
    body.validate().map_err(invalid_body)?;
    owned_category(&state, id, &session).await?;
    updated(CategoryService::update(&state.db, id, &body).await, "Category not found")
}

pub async fn delete_category(
    State(state): State<AppState>,
    session: AuthSession,
    Path(id): Path<i32>,
) -> Result<StatusCode, (StatusCode, Json<Value>)> {
    owned_category(&state, id, &session).await?;
    CategoryService::delete(&state.db, id)
        .await
        .map(|_| StatusCode::NO_CONTENT)
        .map_err(internal_error)
}
