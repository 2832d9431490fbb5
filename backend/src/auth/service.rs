//! Core business logic for the authentication system.
//!
//! One consolidated service covers password sign-in, registration, the OAuth
//! entry point, and session resolution. All three sign-in paths funnel into
//! the same "issue a token for a verified email" step.

use crate::api::common::validation_message;
use crate::auth::models::*;
use crate::auth::oauth::{ExternalIdentity, GoogleOAuthClient};
use crate::config::Config;
use crate::database::models::{CreateUser, User, UserView};
use crate::errors::{ServiceError, ServiceResult};
use crate::repositories::user_repository::{UserRepository, unique_email_conflict};
use crate::utils::generate_random_string::generate_random_string;
use crate::utils::jwt::JwtUtils;
use crate::utils::password::{hash_password, verify_password};
use sqlx::SqlitePool;
use uuid::Uuid;
use validator::Validate;

/// Authentication service handling registration, sign-in, and session
/// resolution.
pub struct AuthService<'a> {
    pool: &'a SqlitePool,
    jwt_utils: JwtUtils,
    config: Config,
}

impl<'a> AuthService<'a> {
    /// Create a new AuthService instance from an injected configuration.
    pub fn new(pool: &'a SqlitePool, config: Config) -> ServiceResult<Self> {
        let jwt_utils = JwtUtils::new(&config)?;

        Ok(AuthService {
            pool,
            jwt_utils,
            config,
        })
    }

    /// Registers a new user and issues a session for them.
    ///
    /// The repeated password is checked before anything is persisted; a
    /// store-level duplicate email surfaces as `AlreadyExists`.
    pub async fn register(&self, request: RegisterRequest) -> ServiceResult<LoginResponse> {
        if let Err(validation_errors) = request.validate() {
            return Err(ServiceError::validation(validation_message(validation_errors)));
        }
        if request.password_repeat != request.password {
            return Err(ServiceError::validation("Passwords don't match"));
        }

        let password_hash = hash_password(&request.password)?;
        let email = request.email.clone();

        let data = CreateUser {
            id: Uuid::now_v7().to_string(),
            email: request.email,
            first_name: request.first_name,
            last_name: request.last_name,
            password_hash,
            is_active: true,
            is_superuser: false,
            permissions: String::new(),
        };

        let repo = UserRepository::new(self.pool);
        let user = repo
            .create_user(data)
            .await
            .map_err(|e| unique_email_conflict(e, &email))?;

        tracing::info!("User {} registered", user.id);
        self.issue_session(user)
    }

    /// Authenticates credentials and issues a session.
    pub async fn login(&self, request: LoginRequest) -> ServiceResult<LoginResponse> {
        if let Err(validation_errors) = request.validate() {
            return Err(ServiceError::validation(validation_message(validation_errors)));
        }

        let user = self
            .authenticate(&request.identifier, &request.password)
            .await?;

        tracing::info!("User {} logged in", user.id);
        self.issue_session(user)
    }

    /// Verifies an identifier/password pair against the store.
    ///
    /// # Errors
    /// - `NotFound` when no user matches the identifier
    /// - `PermissionDenied` when the account is inactive or the password is
    ///   wrong
    pub async fn authenticate(&self, identifier: &str, password: &str) -> ServiceResult<User> {
        let repo = UserRepository::new(self.pool);
        let user = repo
            .get_user_by_email(identifier)
            .await?
            .ok_or_else(|| ServiceError::not_found("User", identifier))?;

        if !user.is_active {
            return Err(ServiceError::permission_denied("User is not active"));
        }
        if !verify_password(password, &user.password_hash)? {
            return Err(ServiceError::permission_denied("Password is not correct"));
        }

        Ok(user)
    }

    /// Signs in through the external OAuth exchange.
    pub async fn login_with_google(&self, code: &str) -> ServiceResult<LoginResponse> {
        let oauth_config = self
            .config
            .oauth
            .clone()
            .ok_or_else(|| ServiceError::internal_error("OAuth is not configured"))?;

        let client = GoogleOAuthClient::new(oauth_config);
        let identity = client.exchange_code(code).await?;
        self.login_with_external_token(identity).await
    }

    /// Issues a session for a verified external identity, provisioning a
    /// local record on first sight.
    ///
    /// Provisioned users get a throwaway random password and an empty
    /// permission set; they sign in exclusively through the external
    /// provider until a password is set for them.
    pub async fn login_with_external_token(
        &self,
        identity: ExternalIdentity,
    ) -> ServiceResult<LoginResponse> {
        if !identity.email_verified {
            return Err(ServiceError::permission_denied(
                "External identity email is not verified",
            ));
        }

        let repo = UserRepository::new(self.pool);
        let user = match repo.get_user_by_email(&identity.email).await? {
            Some(user) => user,
            None => {
                let password_hash = hash_password(&generate_random_string(32))?;
                let data = CreateUser {
                    id: Uuid::now_v7().to_string(),
                    email: identity.email.clone(),
                    first_name: identity.first_name,
                    last_name: identity.last_name,
                    password_hash,
                    is_active: true,
                    is_superuser: false,
                    permissions: String::new(),
                };
                let user = repo
                    .create_user(data)
                    .await
                    .map_err(|e| unique_email_conflict(e, &identity.email))?;
                tracing::info!("User {} provisioned from external identity", user.id);
                user
            }
        };

        if !user.is_active {
            return Err(ServiceError::permission_denied("User is not active"));
        }

        self.issue_session(user)
    }

    /// Recovers the authenticated actor from an inbound session token.
    ///
    /// The token is a capability reference, not a cache of identity: the
    /// user is re-fetched on every call, so deactivation or deletion takes
    /// effect immediately instead of waiting for token expiry.
    pub async fn resolve_actor(&self, token: Option<&str>) -> ServiceResult<User> {
        let token = token.ok_or_else(|| ServiceError::unauthenticated("No session token"))?;
        let claims = self.jwt_utils.validate_token(token)?;

        let repo = UserRepository::new(self.pool);
        let user = repo
            .get_user_by_email(&claims.sub)
            .await?
            .ok_or_else(|| ServiceError::unauthenticated("Session token is not valid"))?;

        if !user.is_active {
            return Err(ServiceError::unauthenticated("Session token is not valid"));
        }

        Ok(user)
    }

    /// Issues a token for a verified user. Shared tail of every sign-in path.
    fn issue_session(&self, user: User) -> ServiceResult<LoginResponse> {
        let access_token = self
            .jwt_utils
            .generate_token(&user.email, self.config.jwt_expires_in_minutes)?;

        Ok(LoginResponse {
            access_token,
            expires_in: self.config.jwt_expires_in_minutes * 60,
            user: UserView::from(user),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();
        pool
    }

    fn test_config() -> Config {
        Config {
            database_url: "sqlite::memory:".to_string(),
            max_connections: 1,
            acquire_timeout_seconds: 3,
            jwt_secret: "test-secret".to_string(),
            jwt_algorithm: "HS256".to_string(),
            jwt_expires_in_minutes: 60,
            server_port: 0,
            oauth: None,
        }
    }

    fn register_request(email: &str) -> RegisterRequest {
        RegisterRequest {
            first_name: "Alice".to_string(),
            last_name: "Archer".to_string(),
            email: email.to_string(),
            password: "Abc12345".to_string(),
            password_repeat: "Abc12345".to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_issues_decodable_token() {
        let pool = test_pool().await;
        let service = AuthService::new(&pool, test_config()).unwrap();

        let response = service
            .register(register_request("alice@example.com"))
            .await
            .unwrap();
        assert_eq!(response.user.email, "alice@example.com");
        assert_eq!(response.expires_in, 60 * 60);

        let jwt = JwtUtils::new(&test_config()).unwrap();
        let claims = jwt.validate_token(&response.access_token).unwrap();
        assert_eq!(claims.sub, "alice@example.com");
    }

    #[tokio::test]
    async fn test_register_password_mismatch_creates_nothing() {
        let pool = test_pool().await;
        let service = AuthService::new(&pool, test_config()).unwrap();

        let mut request = register_request("alice@example.com");
        request.password_repeat = "wrong".to_string();

        let err = service.register(request).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation { .. }));

        let repo = UserRepository::new(&pool);
        assert!(!repo.email_exists("alice@example.com").await.unwrap());
    }

    #[tokio::test]
    async fn test_register_duplicate_email_conflicts() {
        let pool = test_pool().await;
        let service = AuthService::new(&pool, test_config()).unwrap();

        service
            .register(register_request("alice@example.com"))
            .await
            .unwrap();
        let err = service
            .register(register_request("alice@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::AlreadyExists { .. }));

        let repo = UserRepository::new(&pool);
        assert_eq!(repo.count_users(None).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_login_unknown_identifier_is_not_found() {
        let pool = test_pool().await;
        let service = AuthService::new(&pool, test_config()).unwrap();

        let err = service
            .login(LoginRequest {
                identifier: "nobody@example.com".to_string(),
                password: "Abc12345".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_login_wrong_password_is_forbidden() {
        let pool = test_pool().await;
        let service = AuthService::new(&pool, test_config()).unwrap();

        service
            .register(register_request("alice@example.com"))
            .await
            .unwrap();

        let err = service
            .login(LoginRequest {
                identifier: "alice@example.com".to_string(),
                password: "not-the-password".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::PermissionDenied { .. }));
    }

    #[tokio::test]
    async fn test_login_inactive_user_is_forbidden() {
        let pool = test_pool().await;
        let service = AuthService::new(&pool, test_config()).unwrap();

        service
            .register(register_request("alice@example.com"))
            .await
            .unwrap();
        sqlx::query("UPDATE users SET is_active = 0 WHERE email = ?")
            .bind("alice@example.com")
            .execute(&pool)
            .await
            .unwrap();

        // Correct credentials, inactive account.
        let err = service
            .login(LoginRequest {
                identifier: "alice@example.com".to_string(),
                password: "Abc12345".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::PermissionDenied { .. }));
    }

    #[tokio::test]
    async fn test_resolve_actor_round_trip() {
        let pool = test_pool().await;
        let service = AuthService::new(&pool, test_config()).unwrap();

        let response = service
            .register(register_request("alice@example.com"))
            .await
            .unwrap();

        let actor = service
            .resolve_actor(Some(&response.access_token))
            .await
            .unwrap();
        assert_eq!(actor.email, "alice@example.com");
    }

    #[tokio::test]
    async fn test_resolve_actor_rejects_missing_and_garbage_tokens() {
        let pool = test_pool().await;
        let service = AuthService::new(&pool, test_config()).unwrap();

        let err = service.resolve_actor(None).await.unwrap_err();
        assert!(matches!(err, ServiceError::Unauthenticated { .. }));

        let err = service.resolve_actor(Some("not-a-token")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Unauthenticated { .. }));
    }

    #[tokio::test]
    async fn test_resolve_actor_catches_deactivation_after_issuance() {
        let pool = test_pool().await;
        let service = AuthService::new(&pool, test_config()).unwrap();

        let response = service
            .register(register_request("alice@example.com"))
            .await
            .unwrap();
        sqlx::query("UPDATE users SET is_active = 0 WHERE email = ?")
            .bind("alice@example.com")
            .execute(&pool)
            .await
            .unwrap();

        // The token itself is still valid, but the re-fetch catches the
        // deactivated account.
        let err = service
            .resolve_actor(Some(&response.access_token))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Unauthenticated { .. }));
    }

    #[tokio::test]
    async fn test_external_identity_provisions_on_first_sight() {
        let pool = test_pool().await;
        let service = AuthService::new(&pool, test_config()).unwrap();

        let identity = ExternalIdentity {
            email: "alice@example.com".to_string(),
            first_name: "Alice".to_string(),
            last_name: "Archer".to_string(),
            email_verified: true,
        };

        let response = service
            .login_with_external_token(identity.clone())
            .await
            .unwrap();
        assert_eq!(response.user.email, "alice@example.com");

        // Second sign-in reuses the provisioned record.
        service.login_with_external_token(identity).await.unwrap();
        let repo = UserRepository::new(&pool);
        assert_eq!(repo.count_users(None).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_unverified_external_identity_is_rejected() {
        let pool = test_pool().await;
        let service = AuthService::new(&pool, test_config()).unwrap();

        let identity = ExternalIdentity {
            email: "alice@example.com".to_string(),
            first_name: "Alice".to_string(),
            last_name: "Archer".to_string(),
            email_verified: false,
        };

        let err = service.login_with_external_token(identity).await.unwrap_err();
        assert!(matches!(err, ServiceError::PermissionDenied { .. }));

        let repo = UserRepository::new(&pool);
        assert_eq!(repo.count_users(None).await.unwrap(), 0);
    }
}
