use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::path::Path;

/// OAuth client as downloaded from the Google Cloud console
#[derive(Debug, Clone, Deserialize)]
pub struct ClientSecret {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default)]
    pub redirect_uris: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ClientSecretFile {
    installed: Option<ClientSecret>,
    web: Option<ClientSecret>,
}

/// Token file written by the Google quickstart flow
#[derive(Debug, Clone, Deserialize)]
pub struct StoredToken {
    pub access_token: Option<String>,
    pub refresh_token: String,
    /// Epoch milliseconds
    pub expiry_date: Option<i64>,
}

impl StoredToken {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read Gmail token at {:?}", path))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Invalid Gmail token at {:?}", path))
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expiry_date.and_then(DateTime::from_timestamp_millis)
    }
}

impl ClientSecret {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read client secret at {:?}", path))?;
        Self::from_json(&contents).with_context(|| format!("Invalid client secret at {:?}", path))
    }

    pub fn from_json(contents: &str) -> Result<Self> {
        let file: ClientSecretFile = serde_json::from_str(contents)?;
        file.installed
            .or(file.web)
            .ok_or_else(|| anyhow::anyhow!("Expected an \"installed\" or \"web\" client"))
    }

    pub fn redirect_uri(&self) -> &str {
        self.redirect_uris
            .first()
            .map(String::as_str)
            .unwrap_or("http://localhost")
    }
}
