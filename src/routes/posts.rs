use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use validator::Validate;

use crate::{
    models::{
        auth::AuthSession,
        post::{CreatePostRequest, Post, PostFilter, UpdatePostRequest},
    },
    routes::{internal_error, invalid_body, updated},
    services::{categories::CategoryService, posts::PostService},
    AppState,
};

fn not_found() -> (StatusCode, Json<Value>) {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Post not found" })))
}

async fn require_category(state: &AppState, id: i32) -> Result<(), (StatusCode, Json<Value>)> {
    match CategoryService::get(&state.db, id).await {
        Ok(Some(_)) => Ok(()),
        Ok(None) => Err((
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Unknown category" })),
        )),
        Err(e) => Err(internal_error(e)),
    }
}

pub async fn list_posts(
    State(state): State<AppState>,
    Query(filter): Query<PostFilter>,
) -> Result<Json<Vec<Post>>, (StatusCode, Json<Value>)> {
    PostService::list(&state.db, &filter)
        .await
        .map(Json)
        .map_err(internal_error)
}

pub async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Post>, (StatusCode, Json<Value>)> {
    PostService::get(&state.db, id)
        .await
        .map_err(internal_error)?
        .map(Json)
        .ok_or_else(not_found)
}

pub async fn create_post(
    State(state): State<AppState>,
    session: AuthSession,
    Json(body): Json<CreatePostRequest>,
) -> Result<(StatusCode, Json<Post>), (StatusCode, Json<Value>)> {
    body.validate().map_err(invalid_body)?;
    require_category(&state, body.category_id).await?;
    PostService::create(&state.db, session.principal.id, &body)
        .await
        .map(|post| (StatusCode::CREATED, Json(post)))
        .map_err(internal_error)
}

pub async fn update_post(
    State(state): State<AppState>,
    session: AuthSession,
    Path(id): Path<i32>,
    Json(body): Json<UpdatePostRequest>,
) -> Result<Json<Post>, (StatusCode, Json<Value>)> {
    body.validate().map_err(invalid_body)?;
    let post = PostService::get(&state.db, id)
        .await
        .map_err(internal_error)?
        .ok_or_else(not_found)?;
    if post.author_id != session.principal.id {
        return Err((StatusCode::FORBIDDEN, Json(json!({ "error": "Unauthorized user" }))));
    }
    if let Some(category_id) = body.category_id {
        require_category(&state, category_id).await?;
    }
    updated(PostService::update(&state.db, id, &body).await, "Post not found")
}

pub async fn delete_post(
    State(state): State<AppState>,
    session: AuthSession,
    Path(id): Path<i32>,
) -> Result<StatusCode, (StatusCode, Json<Value>)> {
    let post = PostService::get(&state.db, id)
        .await
        .map_err(internal_error)?
        .ok_or_else(not_found)?;
    if post.author_id != session.principal.id {
        return Err((StatusCode::FORBIDDEN, Json(json!({ "error": "Unauthorized user" }))));
    }
    PostService::delete(&state.db, id)
        .await
        .map(|_| StatusCode::NO_CONTENT)
        .map_err(internal_error)
}
