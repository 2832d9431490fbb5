//! Defines the HTTP routes for user management.
//!
//! Every route requires an authenticated session; per-operation permission
//! checks happen in the user service.

use super::handlers::{create_user, delete_user, get_user_by_id, list_users, update_user};
use crate::auth::middleware::session_auth;
use axum::{Router, middleware, routing::get};

pub fn user_router() -> Router {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route(
            "/{id}",
            get(get_user_by_id).put(update_user).delete(delete_user),
        )
        .layer(middleware::from_fn(session_auth))
}
