//! Middleware for protecting authenticated routes.
//!
//! Extracts the session token from the inbound request, resolves the actor
//! behind it with a fresh store lookup, and hands the actor to downstream
//! handlers through request extensions.

use crate::api::common::service_error_to_http;
use crate::auth::service::AuthService;
use crate::config::Config;
use axum::{
    extract::{Extension, Request},
    http::{
        HeaderMap, StatusCode,
        header::{AUTHORIZATION, COOKIE},
    },
    middleware::Next,
    response::Response,
};
use sqlx::SqlitePool;

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "Authorization";

/// Session authentication middleware.
///
/// Any resolution failure (missing token, bad signature, expiry, unknown or
/// deactivated user) renders as a 401 envelope.
pub async fn session_auth(
    Extension(pool): Extension<SqlitePool>,
    Extension(config): Extension<Config>,
    mut request: Request,
    next: Next,
) -> Result<Response, (StatusCode, String)> {
    let token = extract_token(request.headers());

    let auth_service = AuthService::new(&pool, config).map_err(service_error_to_http)?;
    let actor = auth_service
        .resolve_actor(token.as_deref())
        .await
        .map_err(service_error_to_http)?;

    request.extensions_mut().insert(actor);
    Ok(next.run(request).await)
}

/// Pulls the session token out of the request headers.
///
/// The cookie carrier is checked first; `Authorization: Bearer` is accepted
/// as a fallback for non-browser clients.
fn extract_token(headers: &HeaderMap) -> Option<String> {
    if let Some(cookie_header) = headers.get(COOKIE).and_then(|header| header.to_str().ok()) {
        for pair in cookie_header.split(';') {
            if let Some((name, value)) = pair.trim().split_once('=') {
                if name == SESSION_COOKIE && !value.is_empty() {
                    return Some(value.to_string());
                }
            }
        }
    }

    let auth_header = headers
        .get(AUTHORIZATION)
        .and_then(|header| header.to_str().ok())?;
    auth_header
        .strip_prefix("Bearer ")
        .map(|token| token.to_string())
}
