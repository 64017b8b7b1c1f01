use crate::helpers::google_credentials::{ClientSecret, StoredToken};
use crate::helpers::google_oauth::GoogleOAuthClient;
use crate::helpers::token_cache::TokenCache;
use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use oauth2::TokenResponse;
use std::path::Path;

const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;

/// Hands out bearer tokens for the Gmail API, refreshing them when needed
pub struct GmailTokenProvider {
    account: String,
    refresh_token: String,
    oauth_client: GoogleOAuthClient,
    token_cache: TokenCache,
}

impl GmailTokenProvider {
    pub async fn new(account: &str, stored: StoredToken, oauth_client: GoogleOAuthClient) -> Self {
        let token_cache = TokenCache::new();
        if let (Some(access_token), Some(expires_at)) =
            (stored.access_token.clone(), stored.expires_at())
        {
            token_cache.store_token(account, access_token, expires_at).await;
        }

        Self {
            account: account.to_string(),
            refresh_token: stored.refresh_token,
            oauth_client,
            token_cache,
        }
    }

    pub async fn from_files(
        account: &str,
        client_secret_path: &Path,
        token_path: &Path,
    ) -> Result<Self> {
        let secret = ClientSecret::load(client_secret_path)?;
        let stored = StoredToken::load(token_path)?;
        let oauth_client = GoogleOAuthClient::new(&secret)?;
        Ok(Self::new(account, stored, oauth_client).await)
    }

    pub async fn access_token(&self) -> Result<String> {
        if let Some(access_token) = self.token_cache.get_token(&self.account).await {
            return Ok(access_token);
        }

        tracing::debug!("Refreshing Gmail access token for {}", self.account);
        let token_response = self
            .oauth_client
            .refresh_token(&self.refresh_token)
            .await
            .context("Failed to refresh Gmail access token")?;

        let access_token = token_response.access_token().secret().to_string();
        let expires_at = Utc::now() + token_lifetime(token_response.expires_in());

        self.token_cache
            .store_token(&self.account, access_token.clone(), expires_at)
            .await;

        Ok(access_token)
    }

    pub async fn invalidate(&self) {
        self.token_cache.invalidate_token(&self.account).await;
    }

    /// Cached access token, without refreshing
    pub async fn cached_token(&self) -> Option<String> {
        self.token_cache.get_token(&self.account).await
    }
}

/// Google omits `expires_in` on some responses; access tokens live an hour
fn token_lifetime(expires_in: Option<std::time::Duration>) -> Duration {
    expires_in
        .and_then(|d| Duration::from_std(d).ok())
        .unwrap_or_else(|| Duration::seconds(DEFAULT_TOKEN_LIFETIME_SECS))
}
