//! Defines the HTTP routes specifically for authentication.
//!
//! These routes handle endpoints like sign-in, sign-up, sign-out, and the
//! OAuth exchange. They are designed to be integrated into the main Axum
//! router.

use crate::auth::handlers::*;
use crate::auth::middleware::session_auth;
use axum::{
    Router, middleware,
    routing::{get, post},
};

/// Creates the authentication router with all auth-related routes
pub fn auth_router() -> Router {
    Router::new()
        .route("/sign-in", post(login))
        .route("/sign-up", post(register))
        .route("/sign-out", post(logout))
        .route("/oauth2/google", post(google_login))
        .route("/me", get(me).layer(middleware::from_fn(session_auth)))
}
