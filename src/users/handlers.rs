use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::instrument;

use super::dto::{ListQuery, ListResponse, UserPayload, UserResponse};
use super::services::{self, parse_id};
use crate::{
    error::{AppError, ErrorBody},
    state::AppState,
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route(
            "/users/:id",
            get(show_user)
                .put(update_user)
                .patch(update_user)
                .delete(delete_user),
        )
}

#[utoipa::path(
    get,
    path = "/users",
    params(ListQuery),
    responses(
        (status = 200, description = "One page of users, newest first", body = ListResponse),
        (status = 422, description = "Invalid query parameters", body = ErrorBody),
        (status = 500, description = "Server error", body = ErrorBody)
    ),
    tag = "users",
    operation_id = "listUsers"
)]
#[instrument(skip(state, query))]
pub async fn list_users(
    State(state): State<AppState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<ListResponse>, AppError> {
    let Query(query) = query?;
    let page = services::list_users(&state, &query).await?;
    Ok(Json(page))
}

#[utoipa::path(
    post,
    path = "/users",
    request_body = UserPayload,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 422, description = "Validation failed", body = ErrorBody),
        (status = 500, description = "Server error", body = ErrorBody)
    ),
    tag = "users",
    operation_id = "createUser"
)]
#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    payload: Result<Json<UserPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    let Json(payload) = payload?;
    let user = services::create_user(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(UserResponse { data: user })))
}

#[utoipa::path(
    get,
    path = "/users/{id}",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 200, description = "The user", body = UserResponse),
        (status = 404, description = "User not found", body = ErrorBody),
        (status = 500, description = "Server error", body = ErrorBody)
    ),
    tag = "users",
    operation_id = "showUser"
)]
#[instrument(skip(state))]
pub async fn show_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UserResponse>, AppError> {
    let user = services::get_user(&state, parse_id(&id)?).await?;
    Ok(Json(UserResponse { data: user }))
}

#[utoipa::path(
    put,
    path = "/users/{id}",
    params(("id" = i64, Path, description = "User id")),
    request_body = UserPayload,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 404, description = "User not found", body = ErrorBody),
        (status = 422, description = "Validation failed", body = ErrorBody),
        (status = 500, description = "Server error", body = ErrorBody)
    ),
    tag = "users",
    operation_id = "updateUser"
)]
#[instrument(skip(state, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UserPayload>, JsonRejection>,
) -> Result<Json<UserResponse>, AppError> {
    // A missing record is reported before anything about the body.
    let existing = services::find_user(&state, parse_id(&id)?).await?;
    let Json(payload) = payload?;
    let user = services::update_user(&state, existing, payload).await?;
    Ok(Json(UserResponse { data: user }))
}

#[utoipa::path(
    delete,
    path = "/users/{id}",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 404, description = "User not found", body = ErrorBody),
        (status = 500, description = "Server error", body = ErrorBody)
    ),
    tag = "users",
    operation_id = "deleteUser"
)]
#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    services::delete_user(&state, parse_id(&id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}
