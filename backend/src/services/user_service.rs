//! User business logic service.
//!
//! Handles all user-management operations. Every operation consults the
//! permission gate with its operation-specific capability name before
//! touching the store.

use crate::api::common::{UserListFilter, validation_message};
use crate::auth::access::{WILDCARD, need_access};
use crate::database::models::{CreateNewUser, CreateUser, UpdateUser, User};
use crate::errors::{ServiceError, ServiceResult};
use crate::repositories::user_repository::{UserRepository, unique_email_conflict};
use crate::utils::password::{hash_if_present, hash_password};
use sqlx::SqlitePool;
use uuid::Uuid;
use validator::Validate;

pub struct UserService<'a> {
    /// Shared database connection pool
    pool: &'a SqlitePool,
}

impl<'a> UserService<'a> {
    /// Creates a new UserService instance.
    ///
    /// # Arguments
    /// * `pool` - Reference to SQLite connection pool
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Creates a new user with full validation.
    ///
    /// # Errors
    /// Returns `ServiceError` for:
    /// - Missing `user.create` permission
    /// - Validation failures
    /// - Duplicate email (`AlreadyExists`)
    pub async fn create_user(&self, actor: &User, create_user: CreateNewUser) -> ServiceResult<User> {
        need_access(actor, &[WILDCARD, "user.create"])?;

        if let Err(validation_errors) = create_user.validate() {
            return Err(ServiceError::validation(validation_message(validation_errors)));
        }

        let password_hash = hash_password(&create_user.password)?;
        let email = create_user.email.clone();

        let data = CreateUser {
            id: Uuid::now_v7().to_string(),
            email: create_user.email,
            first_name: create_user.first_name,
            last_name: create_user.last_name,
            password_hash,
            is_active: create_user.is_active.unwrap_or(true),
            is_superuser: false,
            permissions: create_user.permissions.unwrap_or_default(),
        };

        let repo = UserRepository::new(self.pool);
        let user = repo
            .create_user(data)
            .await
            .map_err(|e| unique_email_conflict(e, &email))?;

        tracing::info!("User {} created by {}", user.id, actor.email);
        Ok(user)
    }

    /// Retrieves users matching the listing filter, with the total count of
    /// matches (before slicing).
    pub async fn get_users(
        &self,
        actor: &User,
        filter: &UserListFilter,
    ) -> ServiceResult<(Vec<User>, u64)> {
        need_access(actor, &[WILDCARD, "user.get"])?;

        if let Err(validation_errors) = filter.validate() {
            return Err(ServiceError::validation(validation_message(validation_errors)));
        }

        let repo = UserRepository::new(self.pool);
        let users = repo.list_users(filter).await?;
        let total = repo.count_users(filter.search.as_deref()).await?;

        Ok((users, total))
    }

    /// Retrieves a user by ID with existence verification.
    ///
    /// # Errors
    /// Returns `ServiceError::NotFound` if the user doesn't exist
    pub async fn get_user_required(&self, actor: &User, id: &str) -> ServiceResult<User> {
        need_access(actor, &[WILDCARD, "user.get"])?;

        let repo = UserRepository::new(self.pool);
        let user = repo
            .get_user_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("User", id))?;

        Ok(user)
    }

    /// Applies a partial update: only fields present in `data` change.
    ///
    /// The merge is an explicit field-by-field conditional assignment. An
    /// absent password skips the re-hash entirely, leaving the stored hash
    /// untouched.
    pub async fn update_user(&self, actor: &User, id: &str, data: UpdateUser) -> ServiceResult<User> {
        need_access(actor, &[WILDCARD, "user.update"])?;

        if let Err(validation_errors) = data.validate() {
            return Err(ServiceError::validation(validation_message(validation_errors)));
        }

        let repo = UserRepository::new(self.pool);
        let mut user = repo
            .get_user_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("User", id))?;

        if let Some(email) = data.email {
            user.email = email;
        }
        if let Some(first_name) = data.first_name {
            user.first_name = first_name;
        }
        if let Some(last_name) = data.last_name {
            user.last_name = last_name;
        }
        if let Some(password_hash) = hash_if_present(data.password.as_deref())? {
            user.password_hash = password_hash;
        }
        if let Some(is_active) = data.is_active {
            user.is_active = is_active;
        }

        let email = user.email.clone();
        let user = repo
            .update_user(&user)
            .await
            .map_err(|e| unique_email_conflict(e, &email))?;

        tracing::info!("User {} updated by {}", user.id, actor.email);
        Ok(user)
    }

    /// Permanently deletes a user. This is irreversible.
    ///
    /// # Errors
    /// Returns `ServiceError::NotFound` if the user doesn't exist
    pub async fn delete_user(&self, actor: &User, id: &str) -> ServiceResult<()> {
        need_access(actor, &[WILDCARD, "user.delete"])?;

        let repo = UserRepository::new(self.pool);
        if !repo.delete_user(id).await? {
            return Err(ServiceError::not_found("User", id));
        }

        tracing::info!("User {} deleted by {}", id, actor.email);
        Ok(())
    }
}
