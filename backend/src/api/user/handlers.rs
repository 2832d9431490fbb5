//! Handler functions for user management API endpoints.
//!
//! These functions process requests for user records, delegate to the
//! user service (which enforces the per-operation permission checks), and
//! shape the responses.

use crate::api::common::{ApiResponse, PaginationMeta, UserListFilter, service_error_to_http};
use crate::database::models::{CreateNewUser, UpdateUser, User, UserView};
use crate::services::user_service::UserService;
use axum::{
    extract::{Extension, Json, Path, Query},
    http::StatusCode,
};
use sqlx::SqlitePool;

/// Lists users with optional search, pagination, and ordering.
#[axum::debug_handler]
pub async fn list_users(
    Extension(actor): Extension<User>,
    Extension(pool): Extension<SqlitePool>,
    Query(filter): Query<UserListFilter>,
) -> Result<Json<ApiResponse<Vec<UserView>>>, (StatusCode, String)> {
    let user_service = UserService::new(&pool);
    let (users, total) = user_service
        .get_users(&actor, &filter)
        .await
        .map_err(service_error_to_http)?;

    let views: Vec<UserView> = users.iter().map(UserView::from).collect();

    if filter.paginate() {
        let meta = PaginationMeta::new(filter.page(), filter.page_size(), total);
        Ok(Json(ApiResponse::ok_paginated(views, meta)))
    } else {
        Ok(Json(ApiResponse::ok(views)))
    }
}

/// Retrieves a user by its ID.
#[axum::debug_handler]
pub async fn get_user_by_id(
    Extension(actor): Extension<User>,
    Extension(pool): Extension<SqlitePool>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<UserView>>, (StatusCode, String)> {
    tracing::info!("Getting user by ID: {} for actor: {}", id, actor.id);

    let user_service = UserService::new(&pool);
    let user = user_service
        .get_user_required(&actor, &id)
        .await
        .map_err(service_error_to_http)?;

    Ok(Json(ApiResponse::success(
        UserView::from(user),
        "User retrieved successfully",
    )))
}

/// Creates a new user.
#[axum::debug_handler]
pub async fn create_user(
    Extension(actor): Extension<User>,
    Extension(pool): Extension<SqlitePool>,
    Json(payload): Json<CreateNewUser>,
) -> Result<(StatusCode, Json<ApiResponse<UserView>>), (StatusCode, String)> {
    let user_service = UserService::new(&pool);
    let user = user_service
        .create_user(&actor, payload)
        .await
        .map_err(service_error_to_http)?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            UserView::from(user),
            "User created successfully",
        )),
    ))
}

/// Applies a partial update to a user.
#[axum::debug_handler]
pub async fn update_user(
    Extension(actor): Extension<User>,
    Extension(pool): Extension<SqlitePool>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateUser>,
) -> Result<Json<ApiResponse<UserView>>, (StatusCode, String)> {
    let user_service = UserService::new(&pool);
    let user = user_service
        .update_user(&actor, &id, payload)
        .await
        .map_err(service_error_to_http)?;

    Ok(Json(ApiResponse::success(
        UserView::from(user),
        "User updated successfully",
    )))
}

/// Permanently deletes a user.
#[axum::debug_handler]
pub async fn delete_user(
    Extension(actor): Extension<User>,
    Extension(pool): Extension<SqlitePool>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, (StatusCode, String)> {
    let user_service = UserService::new(&pool);
    user_service
        .delete_user(&actor, &id)
        .await
        .map_err(service_error_to_http)?;

    Ok(Json(ApiResponse::success((), "User deleted successfully")))
}
