//! Access-token management for linked accounts.
//!
//! The sync engine never reads tokens off the account row directly; it asks a
//! [`CredentialProvider`] for a token that is valid right now. The OAuth provider
//! refreshes expired tokens against the token endpoint and persists the result
//! before handing it out.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{error, info};
use reqwest::Client;
use serde::Deserialize;

use crate::entities::account;
use crate::repositories::AccountRepository;
use crate::storage::LocalStorage;

/// A bearer token for the remote API.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    /// The account cannot obtain a token without user interaction.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Network error during token refresh: {0}")]
    Transport(String),

    #[error("Failed to persist refreshed token: {0}")]
    Storage(String),
}

impl CredentialError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, CredentialError::Transport(_))
    }
}

/// Supplies a live access token for an account.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn ensure_fresh(&self, account: &account::Model) -> Result<AccessToken, CredentialError>;
}

/// OAuth client settings for the refresh-token grant.
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub token_url: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    refresh_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// Default lifetime assumed when the token endpoint omits `expires_in`.
const DEFAULT_EXPIRES_IN_SECS: i64 = 3600;

/// Returns the stored token if it is still valid at `now`.
///
/// An account without an expiry is treated as expired.
pub fn current_token(account: &account::Model, now: DateTime<Utc>) -> Option<AccessToken> {
    let token = account.oauth_token.as_deref().filter(|t| !t.is_empty())?;
    match account.oauth_expires_at {
        Some(expires_at) if expires_at > now => Some(AccessToken::new(token)),
        _ => None,
    }
}

/// Refreshes tokens through the OAuth token endpoint and stores them on the account.
pub struct OAuthCredentialProvider {
    client: Client,
    config: OAuthConfig,
    storage: LocalStorage,
}

impl OAuthCredentialProvider {
    pub fn new(config: OAuthConfig, storage: LocalStorage, timeout: Duration) -> Result<Self, CredentialError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CredentialError::Transport(format!("Failed to build http client: {}", e)))?;

        Ok(Self {
            client,
            config,
            storage,
        })
    }

    async fn refresh(&self, account: &account::Model) -> Result<AccessToken, CredentialError> {
        let refresh_token = account
            .oauth_refresh_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| CredentialError::Unauthorized(format!("Account '{}' has no refresh token", account.name)))?;

        info!("🔑 Refreshing access token for account '{}'", account.name);

        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ];

        let response = self
            .client
            .post(&self.config.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| CredentialError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CredentialError::Transport(e.to_string()))?;

        if !status.is_success() {
            let reason = match serde_json::from_str::<TokenErrorResponse>(&body) {
                Ok(err) => match err.error_description {
                    Some(description) => format!("{}: {}", err.error, description),
                    None => err.error,
                },
                Err(_) => format!("token endpoint returned {}", status.as_u16()),
            };
            error!("❌ Token refresh failed for account '{}': {}", account.name, reason);
            if status.is_server_error() {
                return Err(CredentialError::Transport(reason));
            }
            return Err(CredentialError::Unauthorized(reason));
        }

        let token: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| CredentialError::Unauthorized(format!("Malformed token response: {}", e)))?;

        let expires_in = token.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS);
        let expires_at = chrono::Duration::try_seconds(expires_in)
            .and_then(|lifetime| Utc::now().checked_add_signed(lifetime))
            .ok_or_else(|| CredentialError::Unauthorized(format!("Token lifetime out of range: {}s", expires_in)))?;

        AccountRepository::update_tokens(
            &self.storage.conn,
            account.clone(),
            &token.access_token,
            token.refresh_token.as_deref(),
            expires_at,
        )
        .await
        .map_err(|e| CredentialError::Storage(format!("{:#}", e)))?;

        Ok(AccessToken::new(token.access_token))
    }
}

#[async_trait]
impl CredentialProvider for OAuthCredentialProvider {
    async fn ensure_fresh(&self, account: &account::Model) -> Result<AccessToken, CredentialError> {
        if !account.is_linked() {
            return Err(CredentialError::Unauthorized(format!(
                "Account '{}' is not linked to a Google identity",
                account.name
            )));
        }

        if let Some(token) = current_token(account, Utc::now()) {
            return Ok(token);
        }

        self.refresh(account).await
    }
}
