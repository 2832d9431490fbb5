//! JWT token utilities for authentication.
//!
//! Provides creation and validation of the signed, expiring session tokens
//! issued at sign-in. Tokens are self-contained: the subject (the user's
//! email) and an absolute expiry are the only claims, and there is no
//! server-side session store.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

use crate::config::Config;
use crate::errors::ServiceError;

/// JWT claims carried by a session token.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Email of the user the token was issued for
    pub sub: String,
    /// Token expiration timestamp
    pub exp: usize,
    /// Token issued at timestamp
    pub iat: usize,
}

/// Why a token failed validation.
///
/// All variants collapse to a single `Unauthenticated` error at the service
/// boundary; the distinction exists for internal reporting and tests.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("token signature invalid")]
    BadSignature,
    #[error("token claims missing or invalid")]
    BadClaims,
    #[error("token malformed")]
    Malformed,
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::InvalidSignature => TokenError::BadSignature,
            ErrorKind::Json(_) | ErrorKind::MissingRequiredClaim(_) => TokenError::BadClaims,
            _ => TokenError::Malformed,
        }
    }
}

impl From<TokenError> for ServiceError {
    fn from(err: TokenError) -> Self {
        tracing::debug!("Session token rejected: {}", err);
        ServiceError::unauthenticated("Session token is not valid")
    }
}

/// JWT token utility for creating and validating tokens.
pub struct JwtUtils {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    validation: Validation,
}

impl JwtUtils {
    /// Create a new JwtUtils instance with keys from the injected config.
    pub fn new(config: &Config) -> Result<Self, ServiceError> {
        let algorithm = Algorithm::from_str(&config.jwt_algorithm).map_err(|_| {
            ServiceError::internal_error(format!(
                "Unsupported signing algorithm: {}",
                config.jwt_algorithm
            ))
        })?;

        let encoding_key = EncodingKey::from_secret(config.jwt_secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());

        let mut validation = Validation::new(algorithm);
        validation.validate_exp = true;
        // Strict expiry: exp < now means expired, with no grace window.
        validation.leeway = 0;

        Ok(JwtUtils {
            encoding_key,
            decoding_key,
            algorithm,
            validation,
        })
    }

    /// Generate a signed token for the given subject, valid for `ttl_minutes`.
    pub fn generate_token(&self, subject: &str, ttl_minutes: i64) -> Result<String, ServiceError> {
        let now = Utc::now();
        let exp = now + Duration::minutes(ttl_minutes);

        let claims = Claims {
            sub: subject.to_string(),
            exp: exp.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        encode(&Header::new(self.algorithm), &claims, &self.encoding_key)
            .map_err(|e| ServiceError::internal_error(format!("Token generation failed: {}", e)))
    }

    /// Validate a token and return its claims.
    ///
    /// The signature is verified before any claim is trusted; a tampered
    /// payload fails regardless of how the expiry check would resolve.
    pub fn validate_token(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|token_data| token_data.claims)
            .map_err(TokenError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(secret: &str) -> Config {
        Config {
            database_url: "sqlite::memory:".to_string(),
            max_connections: 1,
            acquire_timeout_seconds: 3,
            jwt_secret: secret.to_string(),
            jwt_algorithm: "HS256".to_string(),
            jwt_expires_in_minutes: 60,
            server_port: 0,
            oauth: None,
        }
    }

    #[test]
    fn test_token_round_trip() {
        let jwt = JwtUtils::new(&test_config("top-secret")).unwrap();
        let token = jwt.generate_token("alice@example.com", 60).unwrap();

        let claims = jwt.validate_token(&token).unwrap();
        assert_eq!(claims.sub, "alice@example.com");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let jwt = JwtUtils::new(&test_config("top-secret")).unwrap();
        let token = jwt.generate_token("alice@example.com", -5).unwrap();

        assert_eq!(jwt.validate_token(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_tampered_signature_is_rejected() {
        let jwt = JwtUtils::new(&test_config("top-secret")).unwrap();
        let token = jwt.generate_token("alice@example.com", 60).unwrap();

        // Flip the last character of the signature segment.
        let mut tampered = token.clone();
        let last = tampered.pop().unwrap();
        tampered.push(if last == 'A' { 'B' } else { 'A' });

        let err = jwt.validate_token(&tampered).unwrap_err();
        assert_ne!(err, TokenError::Expired);
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let issuer = JwtUtils::new(&test_config("secret-one")).unwrap();
        let verifier = JwtUtils::new(&test_config("secret-two")).unwrap();

        let token = issuer.generate_token("alice@example.com", 60).unwrap();
        assert_eq!(
            verifier.validate_token(&token),
            Err(TokenError::BadSignature)
        );
    }

    #[test]
    fn test_missing_subject_claim_is_rejected() {
        #[derive(serde::Serialize)]
        struct BareClaims {
            exp: usize,
            iat: usize,
        }

        let config = test_config("top-secret");
        let jwt = JwtUtils::new(&config).unwrap();

        let now = Utc::now();
        let bare = BareClaims {
            exp: (now + Duration::minutes(60)).timestamp() as usize,
            iat: now.timestamp() as usize,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &bare,
            &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
        )
        .unwrap();

        assert_eq!(jwt.validate_token(&token), Err(TokenError::BadClaims));
    }
}
