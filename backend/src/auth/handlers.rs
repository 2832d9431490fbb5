//! Handler functions for authentication-related API endpoints.
//!
//! These functions process incoming HTTP requests for sign-in, sign-up,
//! sign-out, and the OAuth exchange, and interact with the `auth::service`
//! for core business logic. Successful sign-ins set the session cookie;
//! sign-out clears it.

use crate::api::common::{ApiResponse, service_error_to_http};
use crate::auth::middleware::SESSION_COOKIE;
use crate::auth::models::*;
use crate::auth::service::AuthService;
use crate::config::Config;
use crate::database::models::{User, UserView};
use axum::{
    extract::{Extension, Json},
    http::{HeaderName, StatusCode, header::SET_COOKIE},
    response::Json as ResponseJson,
};
use sqlx::SqlitePool;

type SessionReply = (
    StatusCode,
    [(HeaderName, String); 1],
    ResponseJson<ApiResponse<LoginResponse>>,
);

fn session_cookie(token: &str, max_age_seconds: i64) -> (HeaderName, String) {
    (
        SET_COOKIE,
        format!(
            "{}={}; Max-Age={}; Path=/; HttpOnly; SameSite=Lax",
            SESSION_COOKIE, token, max_age_seconds
        ),
    )
}

fn expired_session_cookie() -> (HeaderName, String) {
    (
        SET_COOKIE,
        format!("{}=; Max-Age=0; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE),
    )
}

/// Handle user sign-in request
#[axum::debug_handler]
pub async fn login(
    Extension(pool): Extension<SqlitePool>,
    Extension(config): Extension<Config>,
    Json(payload): Json<LoginRequest>,
) -> Result<SessionReply, (StatusCode, String)> {
    let auth_service = AuthService::new(&pool, config).map_err(service_error_to_http)?;
    let response = auth_service
        .login(payload)
        .await
        .map_err(service_error_to_http)?;

    let cookie = session_cookie(&response.access_token, response.expires_in);
    Ok((
        StatusCode::OK,
        [cookie],
        ResponseJson(ApiResponse::success(response, "Logged in successfully")),
    ))
}

/// Handle user sign-up request
#[axum::debug_handler]
pub async fn register(
    Extension(pool): Extension<SqlitePool>,
    Extension(config): Extension<Config>,
    Json(payload): Json<RegisterRequest>,
) -> Result<SessionReply, (StatusCode, String)> {
    let auth_service = AuthService::new(&pool, config).map_err(service_error_to_http)?;
    let response = auth_service
        .register(payload)
        .await
        .map_err(service_error_to_http)?;

    let cookie = session_cookie(&response.access_token, response.expires_in);
    Ok((
        StatusCode::CREATED,
        [cookie],
        ResponseJson(ApiResponse::success(response, "Registered successfully")),
    ))
}

/// Handle OAuth sign-in via the external code exchange
#[axum::debug_handler]
pub async fn google_login(
    Extension(pool): Extension<SqlitePool>,
    Extension(config): Extension<Config>,
    Json(payload): Json<GoogleLoginRequest>,
) -> Result<SessionReply, (StatusCode, String)> {
    let auth_service = AuthService::new(&pool, config).map_err(service_error_to_http)?;
    let response = auth_service
        .login_with_google(&payload.code)
        .await
        .map_err(service_error_to_http)?;

    let cookie = session_cookie(&response.access_token, response.expires_in);
    Ok((
        StatusCode::OK,
        [cookie],
        ResponseJson(ApiResponse::success(response, "Logged in successfully")),
    ))
}

/// Handle sign-out request.
///
/// Sessions are stateless, so the server has nothing to revoke; clearing
/// the cookie is the whole operation and the client discards its token.
#[axum::debug_handler]
pub async fn logout() -> (
    StatusCode,
    [(HeaderName, String); 1],
    ResponseJson<ApiResponse<serde_json::Value>>,
) {
    (
        StatusCode::OK,
        [expired_session_cookie()],
        ResponseJson(ApiResponse::success(
            serde_json::json!({}),
            "Logged out successfully",
        )),
    )
}

/// Get the current actor's profile
#[axum::debug_handler]
pub async fn me(Extension(actor): Extension<User>) -> ResponseJson<ApiResponse<UserView>> {
    ResponseJson(ApiResponse::success(
        UserView::from(&actor),
        "User retrieved successfully",
    ))
}
