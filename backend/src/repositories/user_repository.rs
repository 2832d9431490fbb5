//! Database repository for user management operations.
//!
//! Provides CRUD operations for user records. Queries use the runtime sqlx
//! API with `FromRow` mapping; the UNIQUE index on `users.email` is the sole
//! arbiter of duplicate registrations.

use crate::api::common::UserListFilter;
use crate::database::models::{CreateUser, User};
use crate::errors::ServiceError;
use anyhow::Result;
use chrono::Utc;
use sqlx::SqlitePool;

const USER_COLUMNS: &str = "id, email, first_name, last_name, password_hash, is_active, \
                            is_superuser, permissions, created_at, updated_at";

/// Translates a store-level uniqueness violation on `users.email` into the
/// domain-level conflict error; anything else stays a database error.
pub fn unique_email_conflict(err: anyhow::Error, email: &str) -> ServiceError {
    match err.downcast_ref::<sqlx::Error>() {
        Some(sqlx::Error::Database(db)) if db.is_unique_violation() => {
            ServiceError::already_exists("User", email)
        }
        _ => ServiceError::from(err),
    }
}

/// Repository for user database operations.
pub struct UserRepository<'a> {
    /// Shared SQLite connection pool
    pool: &'a SqlitePool,
}

impl<'a> UserRepository<'a> {
    /// Creates a new UserRepository instance.
    ///
    /// # Arguments
    /// * `pool` - Reference to SQLite connection pool
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Creates a new user in the database.
    ///
    /// # Arguments
    /// * `user` - CreateUser DTO containing the resolved user row
    ///
    /// # Returns
    /// The newly created User with all fields populated
    pub async fn create_user(&self, user: CreateUser) -> Result<User> {
        let now = Utc::now();
        let sql = format!(
            "INSERT INTO users (id, email, first_name, last_name, password_hash, is_active, \
             is_superuser, permissions, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
             RETURNING {USER_COLUMNS}"
        );

        let user = sqlx::query_as::<_, User>(&sql)
            .bind(&user.id)
            .bind(&user.email)
            .bind(&user.first_name)
            .bind(&user.last_name)
            .bind(&user.password_hash)
            .bind(user.is_active)
            .bind(user.is_superuser)
            .bind(&user.permissions)
            .bind(now)
            .bind(now)
            .fetch_one(self.pool)
            .await?;

        Ok(user)
    }

    /// Retrieves a user by their unique identifier.
    ///
    /// # Returns
    /// `Some(User)` if found, `None` otherwise
    pub async fn get_user_by_id(&self, id: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(user)
    }

    /// Retrieves a user by their email.
    ///
    /// # Returns
    /// `Some(User)` if found, `None` otherwise
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(self.pool)
            .await?;

        Ok(user)
    }

    /// Checks if an email already exists in the system.
    pub async fn email_exists(&self, email: &str) -> Result<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE email = ?")
            .bind(email)
            .fetch_one(self.pool)
            .await?;

        Ok(count > 0)
    }

    /// Retrieves users matching the given listing filter.
    ///
    /// Search is a case-sensitive substring match on first name, last name,
    /// or email (`instr`, not `LIKE`, which is case-insensitive on ASCII).
    /// Ordering is last-modified descending when requested, creation order
    /// descending otherwise, so pagination slices deterministically.
    pub async fn list_users(&self, filter: &UserListFilter) -> Result<Vec<User>> {
        let mut sql = format!("SELECT {USER_COLUMNS} FROM users");

        if filter.search.is_some() {
            sql.push_str(
                " WHERE (instr(first_name, ?) > 0 OR instr(last_name, ?) > 0 \
                 OR instr(email, ?) > 0)",
            );
        }

        sql.push_str(if filter.order_by_updated() {
            " ORDER BY updated_at DESC"
        } else {
            " ORDER BY created_at DESC"
        });

        if filter.paginate() {
            sql.push_str(" LIMIT ? OFFSET ?");
        }

        let mut query = sqlx::query_as::<_, User>(&sql);
        if let Some(search) = &filter.search {
            query = query.bind(search).bind(search).bind(search);
        }
        if filter.paginate() {
            query = query.bind(filter.limit()).bind(filter.offset());
        }

        let users = query.fetch_all(self.pool).await?;
        Ok(users)
    }

    /// Get total count of users matching the search term (all users when
    /// no term is given).
    pub async fn count_users(&self, search: Option<&str>) -> Result<u64> {
        let count: i64 = match search {
            Some(term) => {
                sqlx::query_scalar(
                    "SELECT COUNT(*) FROM users WHERE (instr(first_name, ?) > 0 \
                     OR instr(last_name, ?) > 0 OR instr(email, ?) > 0)",
                )
                .bind(term)
                .bind(term)
                .bind(term)
                .fetch_one(self.pool)
                .await?
            }
            None => {
                sqlx::query_scalar("SELECT COUNT(*) FROM users")
                    .fetch_one(self.pool)
                    .await?
            }
        };

        Ok(count as u64)
    }

    /// Writes back a fully merged user row.
    ///
    /// The caller owns the merge; this persists every mutable column and
    /// stamps `updated_at`.
    pub async fn update_user(&self, user: &User) -> Result<User> {
        let sql = format!(
            "UPDATE users SET email = ?, first_name = ?, last_name = ?, password_hash = ?, \
             is_active = ?, is_superuser = ?, permissions = ?, updated_at = ? \
             WHERE id = ? \
             RETURNING {USER_COLUMNS}"
        );

        let user = sqlx::query_as::<_, User>(&sql)
            .bind(&user.email)
            .bind(&user.first_name)
            .bind(&user.last_name)
            .bind(&user.password_hash)
            .bind(user.is_active)
            .bind(user.is_superuser)
            .bind(&user.permissions)
            .bind(Utc::now())
            .bind(&user.id)
            .fetch_one(self.pool)
            .await?;

        Ok(user)
    }

    /// Permanently deletes a user.
    ///
    /// # Returns
    /// `true` if a row was deleted, `false` if the id was unknown
    pub async fn delete_user(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
