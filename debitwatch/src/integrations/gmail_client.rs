use crate::helpers::gmail_auth::GmailTokenProvider;
use crate::integrations::mail_source::MailSource;
use crate::integrations::mime::build_raw_message;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use shared_types::{MailLabel, OutgoingEmail, RawEmailRecord};
use thiserror::Error;

const GMAIL_API_BASE: &str = "https://gmail.googleapis.com/gmail/v1/users";

#[derive(Debug, Error)]
pub enum GmailError {
    #[error("Gmail API {method} {path} returned {status}: {body}")]
    Api {
        method: Method,
        path: String,
        status: StatusCode,
        body: String,
    },
    #[error("Gmail message {0} has no internalDate")]
    MissingInternalDate(String),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListMessagesResponse {
    #[serde(default)]
    messages: Vec<MessageRef>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessageRef {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MinimalMessage {
    id: String,
    internal_date: Option<String>,
    #[serde(default)]
    snippet: String,
}

#[derive(Debug, Deserialize)]
struct ListLabelsResponse {
    #[serde(default)]
    labels: Vec<MailLabel>,
}

/// Gmail REST API v1 client for one mailbox
pub struct GmailClient {
    http: reqwest::Client,
    tokens: GmailTokenProvider,
    base_url: String,
    user_id: String,
}

impl GmailClient {
    pub fn new(tokens: GmailTokenProvider, user_id: &str) -> Result<Self> {
        Self::with_base_url(tokens, user_id, GMAIL_API_BASE)
    }

    /// `base_url` is the `.../gmail/v1/users` prefix of every request
    pub fn with_base_url(
        tokens: GmailTokenProvider,
        user_id: &str,
        base_url: &str,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("debitwatch/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            tokens,
            base_url: base_url.trim_end_matches('/').to_string(),
            user_id: user_id.to_string(),
        })
    }

    pub async fn list_labels(&self) -> Result<Vec<MailLabel>> {
        let response: ListLabelsResponse = self.get_json("labels", &[]).await?;
        Ok(response.labels)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T> {
        let response = self.execute(Method::GET, path, query, None).await?;
        Ok(response.json().await?)
    }

    async fn post_json(&self, path: &str, body: serde_json::Value) -> Result<()> {
        self.execute(Method::POST, path, &[], Some(body)).await?;
        Ok(())
    }

    async fn execute(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<serde_json::Value>,
    ) -> Result<reqwest::Response> {
        let url = format!("{}/{}/{}", self.base_url, self.user_id, path);
        let access_token = self.tokens.access_token().await?;

        let mut request = self
            .http
            .request(method.clone(), &url)
            .bearer_auth(access_token)
            .query(query);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("Gmail API {} {} failed", method, path))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::UNAUTHORIZED {
            self.tokens.invalidate().await;
        }

        let body = response.text().await.unwrap_or_default();
        Err(GmailError::Api {
            method,
            path: path.to_string(),
            status,
            body,
        }
        .into())
    }
}

#[async_trait]
impl MailSource for GmailClient {
    async fn search(&self, query: &str) -> Result<Vec<String>> {
        let mut ids = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut params = vec![("q", query)];
            if let Some(token) = page_token.as_deref() {
                params.push(("pageToken", token));
            }

            let page: ListMessagesResponse = self.get_json("messages", &params).await?;
            ids.extend(page.messages.into_iter().map(|m| m.id));

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        tracing::debug!("Gmail search matched {} messages", ids.len());
        Ok(ids)
    }

    async fn fetch(&self, id: &str) -> Result<RawEmailRecord> {
        let path = format!("messages/{}", id);
        let message: MinimalMessage = self.get_json(&path, &[("format", "minimal")]).await?;

        let received_at = message
            .internal_date
            .ok_or_else(|| GmailError::MissingInternalDate(message.id.clone()))?;

        Ok(RawEmailRecord {
            id: message.id,
            received_at,
            snippet: message.snippet,
        })
    }

    async fn mark_processed(&self, id: &str, label_id: &str) -> Result<()> {
        let path = format!("messages/{}/modify", id);
        self.post_json(&path, serde_json::json!({ "addLabelIds": [label_id] }))
            .await
    }

    async fn send(&self, email: &OutgoingEmail) -> Result<()> {
        let raw = build_raw_message(email);
        self.post_json("messages/send", serde_json::json!({ "raw": raw }))
            .await
    }
}
