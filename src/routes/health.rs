use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

use crate::{models::auth::AuthSession, AppState};

const VERSION: &str = env!("CARGO_PKG_VERSION");

pub async fn public_health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let db = sqlx::query("SELECT 1").execute(&state.db).await;
    let cache = state.sessions.ping().await;

    match (db, cache) {
        (Ok(_), Ok(())) => (
            StatusCode::OK,
            Json(json!({ "status": "ok", "version": VERSION, "db": "connected", "cache": "connected" })),
        ),
        (db, cache) => {
            if let Err(e) = &db {
                tracing::warn!("health: database unavailable: {e}");
            }
            if let Err(e) = &cache {
                tracing::warn!("health: session cache unavailable: {e}");
            }
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "error",
                    "version": VERSION,
                    "db": if db.is_ok() { "connected" } else { "unavailable" },
                    "cache": if cache.is_ok() { "connected" } else { "unavailable" },
                })),
            )
        }
    }
}

pub async fn health(session: AuthSession) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": VERSION,
        "user_id": session.principal.id,
    }))
}
