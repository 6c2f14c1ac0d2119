//! Photo API routes

use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    response::IntoResponse,
    routing::get,
};
use serde_json::json;
use tower::Layer;
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::{
    middleware::photo_access_guard, models::photo::PHOTO_URL_PREFIX, state::AppState,
    storage::PhotoStorage,
};

pub mod photos;
pub mod users;

/// Create the router for the photo API
///
/// JSON endpoints live under `/api/v1`; photo files are served from
/// `/photos` behind the access guard.
pub fn create_router(state: AppState, storage: &PhotoStorage, max_upload_bytes: usize) -> Router {
    let static_files = from_fn_with_state(state.clone(), photo_access_guard)
        .layer(ServeDir::new(storage.root()));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1/users", users::router(state.clone()))
        .nest("/api/v1/photos", photos::router(state.clone()))
        .nest_service(PHOTO_URL_PREFIX, static_files)
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "photo-api"
    }))
}
