/// User CRUD endpoints
///
/// # Endpoints
///
/// - `POST /users` - Create user
/// - `GET /users` - List users
/// - `GET /users/:id` - Get user
/// - `PUT /users/:id` - Partially update user
/// - `DELETE /users/:id` - Delete user
///
/// Handlers are thin: each maps to one statement in
/// [`userhub_shared::models::user::User`]. Failed statements become a
/// generic 500 (`"Failed to <operation>"`), a missing row becomes 404.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{user_not_found, AppJson, UserId},
};
use axum::{extract::State, http::StatusCode, Json};
use tracing::info;
use userhub_shared::models::user::{CreateUser, UpdateUser, User};

/// Create user
///
/// # Endpoint
///
/// ```text
/// POST /users
/// Content-Type: application/json
///
/// { "name": "Ada Lovelace", "email": "ada@example.com" }
/// ```
///
/// # Response
///
/// `201 Created` with the stored user:
///
/// ```json
/// {
///   "id": 1,
///   "name": "Ada Lovelace",
///   "email": "ada@example.com",
///   "createdAt": "2024-10-01T12:00:00Z",
///   "updatedAt": "2024-10-01T12:00:00Z"
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: body is not JSON
/// - `500 Internal Server Error`: insert rejected (e.g. missing field) or database down
pub async fn create_user(
    State(state): State<AppState>,
    AppJson(req): AppJson<CreateUser>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let user = User::create(&state.db, req)
        .await
        .map_err(ApiError::persistence("create user"))?;

    info!(user_id = user.id, "User created");

    Ok((StatusCode::CREATED, Json(user)))
}

/// List users
///
/// Returns every user ordered by id; an empty table yields `[]`.
pub async fn list_users(State(state): State<AppState>) -> ApiResult<Json<Vec<User>>> {
    let users = User::list(&state.db)
        .await
        .map_err(ApiError::persistence("retrieve users"))?;

    Ok(Json(users))
}

/// Get user
///
/// # Errors
///
/// - `404 Not Found`: no user with this id
/// - `500 Internal Server Error`: database failure
pub async fn get_user(State(state): State<AppState>, UserId(id): UserId) -> ApiResult<Json<User>> {
    let user = User::find_by_id(&state.db, id)
        .await
        .map_err(ApiError::persistence("retrieve user"))?
        .ok_or_else(user_not_found)?;

    Ok(Json(user))
}

/// Update user
///
/// Fields omitted from the body (or sent as `null`) keep their value; a
/// field that is present overwrites, even with `""`.
///
/// # Endpoint
///
/// ```text
/// PUT /users/:id
/// Content-Type: application/json
///
/// { "name": "Ada King" }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: body is not JSON
/// - `404 Not Found`: no user with this id
/// - `500 Internal Server Error`: database failure
pub async fn update_user(
    State(state): State<AppState>,
    UserId(id): UserId,
    AppJson(req): AppJson<UpdateUser>,
) -> ApiResult<Json<User>> {
    let user = User::update(&state.db, id, req)
        .await
        .map_err(ApiError::persistence("update user"))?
        .ok_or_else(user_not_found)?;

    Ok(Json(user))
}

/// Delete user
///
/// Responds `204 No Content`. Deleting the same id again is a 404.
pub async fn delete_user(State(state): State<AppState>, UserId(id): UserId) -> ApiResult<StatusCode> {
    let deleted = User::delete(&state.db, id)
        .await
        .map_err(ApiError::persistence("delete user"))?;

    if !deleted {
        return Err(user_not_found());
    }

    info!(user_id = id, "User deleted");

    Ok(StatusCode::NO_CONTENT)
}
