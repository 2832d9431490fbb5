//! Third-party OAuth exchange client.
//!
//! Thin client for the external code-for-identity exchange. The rest of the
//! authentication flow only sees the resulting [`ExternalIdentity`]; token
//! issuance goes through the same path as password sign-in.

use crate::config::OAuthConfig;
use crate::errors::{ServiceError, ServiceResult};
use serde::Deserialize;
use std::time::Duration;

const TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";
const USERINFO_ENDPOINT: &str = "https://openidconnect.googleapis.com/v1/userinfo";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Identity attested by the external provider.
#[derive(Debug, Clone, Deserialize)]
pub struct ExternalIdentity {
    pub email: String,
    #[serde(default, rename = "given_name")]
    pub first_name: String,
    #[serde(default, rename = "family_name")]
    pub last_name: String,
    #[serde(default)]
    pub email_verified: bool,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Client for the Google authorization-code exchange.
pub struct GoogleOAuthClient {
    client: reqwest::Client,
    config: OAuthConfig,
}

impl GoogleOAuthClient {
    pub fn new(config: OAuthConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Exchanges an authorization code for the identity behind it.
    pub async fn exchange_code(&self, code: &str) -> ServiceResult<ExternalIdentity> {
        let token: TokenResponse = self
            .client
            .post(TOKEN_ENDPOINT)
            .form(&[
                ("code", code),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|e| ServiceError::external_service(format!("OAuth exchange failed: {}", e)))?
            .error_for_status()
            .map_err(|e| ServiceError::external_service(format!("OAuth exchange rejected: {}", e)))?
            .json()
            .await
            .map_err(|e| ServiceError::external_service(format!("OAuth token response invalid: {}", e)))?;

        let identity: ExternalIdentity = self
            .client
            .get(USERINFO_ENDPOINT)
            .bearer_auth(&token.access_token)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|e| ServiceError::external_service(format!("OAuth userinfo failed: {}", e)))?
            .error_for_status()
            .map_err(|e| ServiceError::external_service(format!("OAuth userinfo rejected: {}", e)))?
            .json()
            .await
            .map_err(|e| {
                ServiceError::external_service(format!("OAuth userinfo response invalid: {}", e))
            })?;

        Ok(identity)
    }
}
