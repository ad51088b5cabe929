// src/routes/user_routes.rs

use axum::{
    extract::{Path, State},
    routing::{delete, get, post},
    Json, Router,
};
use axum_extra::extract::WithRejection;

use crate::{
    error::ApiError,
    models::{ActionResponse, ApiOk, AppState, CredentialsRequest, NewUserRequest, UserProfile},
    store::users,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/{user_id}", delete(delete_user))
        .route("/verify", post(verify_user))
}

pub async fn list_users(
    State(state): State<AppState>,
) -> Result<Json<ApiOk<Vec<UserProfile>>>, ApiError> {
    let rows = users::list(&state.db).await?;
    Ok(Json(ApiOk { data: rows }))
}

pub async fn create_user(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<NewUserRequest>, ApiError>,
) -> Result<Json<ActionResponse<UserProfile>>, ApiError> {
    let profile = users::create(&state.db, &req).await?;
    Ok(Json(ActionResponse::ok("user created", profile)))
}

pub async fn delete_user(
    State(state): State<AppState>,
    WithRejection(Path(user_id), _): WithRejection<Path<i64>, ApiError>,
) -> Result<Json<ActionResponse<()>>, ApiError> {
    users::delete(&state.db, user_id).await?;
    Ok(Json(ActionResponse::done("user deleted")))
}

/// Credential check for the (external) login layer. No session is issued here.
pub async fn verify_user(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<CredentialsRequest>, ApiError>,
) -> Result<Json<ActionResponse<UserProfile>>, ApiError> {
    let profile = users::verify_credentials(&state.db, &req.username, &req.password).await?;
    Ok(Json(ActionResponse::ok("credentials accepted", profile)))
}
