//! Rust structs that represent database table mappings.
//!
//! These models define the structure of data as it is stored in and retrieved
//! from the database. Note that these may differ from API-specific models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::HashSet;
use validator::Validate;

/// A stored user record. The password hash never leaves the server.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_active: bool,
    pub is_superuser: bool,
    /// Comma-separated capability names, e.g. `user.get,user.update`
    pub permissions: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// The user's granted permissions as a set of capability names.
    pub fn permission_set(&self) -> HashSet<&str> {
        self.permissions
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect()
    }
}

/// User creation payload accepted by the management API.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateNewUser {
    #[validate(
        email(message = "Must be a valid email"),
        length(min = 3, max = 50, message = "Email must be between 3-50 characters")
    )]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,

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

    pub is_active: Option<bool>,

    /// Comma-separated capability names granted to the new user
    pub permissions: Option<String>,
}

/// Fully resolved user row handed to the repository for insertion.
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
    pub is_active: bool,
    pub is_superuser: bool,
    pub permissions: String,
}

/// Partial update payload: only supplied fields change. An absent password
/// leaves the stored hash untouched.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateUser {
    #[validate(
        email(message = "Must be a valid email"),
        length(min = 3, max = 50, message = "Email must be between 3-50 characters")
    )]
    pub email: Option<String>,

    pub password: Option<String>,

    #[validate(length(
        min = 3,
        max = 50,
        message = "First name must be between 3-50 characters"
    ))]
    pub first_name: Option<String>,

    #[validate(length(
        min = 3,
        max = 50,
        message = "Last name must be between 3-50 characters"
    ))]
    pub last_name: Option<String>,

    pub is_active: Option<bool>,
}

/// Public projection of a user record returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserView {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_active: bool,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        UserView {
            id: user.id.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            is_active: user.is_active,
        }
    }
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        UserView::from(&user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_with_permissions(permissions: &str) -> User {
        User {
            id: "u-1".to_string(),
            email: "alice@example.com".to_string(),
            first_name: "Alice".to_string(),
            last_name: "Archer".to_string(),
            password_hash: "hash".to_string(),
            is_active: true,
            is_superuser: false,
            permissions: permissions.to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_permission_set_parsing() {
        let user = user_with_permissions("user.get, user.update ,,user.delete");
        let set = user.permission_set();
        assert_eq!(set.len(), 3);
        assert!(set.contains("user.get"));
        assert!(set.contains("user.update"));
        assert!(set.contains("user.delete"));

        assert!(user_with_permissions("").permission_set().is_empty());
    }

    #[test]
    fn test_user_view_hides_password_hash() {
        let user = user_with_permissions("");
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["email"], "alice@example.com");
    }
}
