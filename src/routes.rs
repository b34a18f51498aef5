use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};

use crate::app::AppState;

/// The example route group.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/hello", get(hello))
        .route("/health", get(health))
}

async fn hello() -> Json<Value> {
    Json(json!({ "message": "Hello World" }))
}

/// Reports the database health signal observed at composition time.
async fn health(State(state): State<AppState>) -> Json<Value> {
    let database = match &state.db {
        Some(db) => match db.ping().await {
            Ok(()) => "ok",
            Err(_) => "unreachable",
        },
        None => "degraded",
    };
    Json(json!({ "status": "ok", "database": database }))
}
