pub mod archive;
pub mod auth;
pub mod denoise;
pub mod error;
pub mod filter;
pub mod pages;
pub mod session;

use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, FromRef};
use axum::routing::{get, post};
use axum::{Json, Router};
use axum_extra::extract::cookie::Key;
use serde_json::json;

use noisegate_db::Database;

/// Everything handlers need, injected at construction. The store and
/// the cookie signing key are owned by the process entry point.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    key: Key,
}

impl AppState {
    pub fn new(db: Arc<Database>, key: Key) -> Self {
        Self { db, key }
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Key {
        state.key.clone()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/login", get(auth::login_page).post(auth::login_submit))
        .route("/logout", get(auth::logout))
        .route("/denoise/", get(denoise::control_page))
        .route("/denoise/image", post(denoise::denoise_image))
        .route("/denoise/sequence.zip", post(denoise::denoise_sequence))
        .layer(DefaultBodyLimit::max(256 * 1024 * 1024)) // room for image batches
        .with_state(state)
}

async fn root() -> Json<serde_json::Value> {
    Json(json!({ "message": "noisegate image processing service" }))
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "ok": true }))
}
