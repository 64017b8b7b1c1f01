use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct CachedToken {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

/// Access tokens by mailbox. A token is not handed out during the last five
/// minutes before it expires.
pub struct TokenCache {
    tokens: Arc<Mutex<HashMap<String, CachedToken>>>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self {
            tokens: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub async fn store_token(
        &self,
        account: &str,
        access_token: String,
        expires_at: DateTime<Utc>,
    ) {
        let cached = CachedToken {
            access_token,
            expires_at,
        };

        let mut tokens = self.tokens.lock().await;
        tokens.insert(account.to_string(), cached);
    }

    pub async fn get_token(&self, account: &str) -> Option<String> {
        self.get_token_at(account, Utc::now()).await
    }

    pub async fn get_token_at(&self, account: &str, now: DateTime<Utc>) -> Option<String> {
        let tokens = self.tokens.lock().await;
        if let Some(cached) = tokens.get(account) {
            if now < cached.expires_at - Duration::minutes(5) {
                return Some(cached.access_token.clone());
            }
        }
        None
    }

    pub async fn invalidate_token(&self, account: &str) {
        let mut tokens = self.tokens.lock().await;
        tokens.remove(account);
    }
}

impl Default for TokenCache {
    fn default() -> Self {
        Self::new()
    }
}
