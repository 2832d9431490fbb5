//! Data structures for authentication-related entities.
//!
//! This module defines the request and response payloads used by the
//! sign-in, sign-up, and OAuth flows.

use crate::database::models::UserView;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Sign-in request payload
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(
        min = 3,
        max = 50,
        message = "Identifier must be between 3-50 characters"
    ))]
    pub identifier: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Sign-up request payload. The repeated password must match exactly.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(
        min = 3,
        max = 50,
        message = "First name must be between 3-50 characters"
    ))]
    pub first_name: String,

    #[validate(length(
        min = 3,
        max = 50,
        message = "Last name must be between 3-50 characters"
    ))]
    pub last_name: String,

    #[validate(
        email(message = "Must be a valid email"),
        length(min = 3, max = 50, message = "Email must be between 3-50 characters")
    )]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,

    pub password_repeat: String,
}

/// OAuth sign-in request carrying the provider's authorization code
#[derive(Debug, Deserialize, Validate)]
pub struct GoogleLoginRequest {
    #[validate(length(min = 1, message = "Authorization code is required"))]
    pub code: String,
}

/// Session issued after a successful sign-in or sign-up
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    /// Token lifetime in seconds, mirrors the cookie Max-Age
    pub expires_in: i64,
    pub user: UserView,
}
