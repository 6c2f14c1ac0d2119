//! Account endpoints under `/api/v1/users`

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    middleware::from_fn_with_state,
    response::IntoResponse,
    routing::{post, put},
};
use axum_extra::extract::WithRejection;

use crate::{
    error::{ApiError, ApiResult},
    identity::RequestIdentity,
    middleware::require_auth,
    models::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse, UpdateUserRequest},
    state::AppState,
};

/// Create the user router
pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route(
            "/me",
            put(update_me)
                .delete(delete_me)
                .route_layer(from_fn_with_state(state, require_auth)),
        )
}

/// Register a new account
pub async fn register(
    State(state): State<AppState>,
    WithRejection(Json(payload), _): WithRejection<Json<RegisterRequest>, ApiError>,
) -> ApiResult<impl IntoResponse> {
    let user_id = state.user_controller.register(payload).await?;

    Ok((StatusCode::CREATED, Json(RegisterResponse { user_id })))
}

/// Exchange credentials for a session token
pub async fn login(
    State(state): State<AppState>,
    WithRejection(Json(payload), _): WithRejection<Json<LoginRequest>, ApiError>,
) -> ApiResult<impl IntoResponse> {
    let token = state.user_controller.login(payload).await?;

    Ok(Json(LoginResponse { token }))
}

/// Update the caller's profile
pub async fn update_me(
    State(state): State<AppState>,
    identity: RequestIdentity,
    WithRejection(Json(payload), _): WithRejection<Json<UpdateUserRequest>, ApiError>,
) -> ApiResult<StatusCode> {
    state.user_controller.update(&identity, payload).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Delete the caller's account with all their photos
pub async fn delete_me(
    State(state): State<AppState>,
    identity: RequestIdentity,
) -> ApiResult<StatusCode> {
    state.user_controller.delete(&identity).await?;

    Ok(StatusCode::NO_CONTENT)
}
