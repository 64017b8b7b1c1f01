use serde::{Deserialize, Serialize};

/// A candidate notification as returned by the mail source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEmailRecord {
    pub id: String,
    /// Gmail `internalDate`, epoch milliseconds as text
    pub received_at: String,
    pub snippet: String,
}

/// Message handed to the mail source for delivery. `body` is HTML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingEmail {
    pub to: String,
    pub from: String,
    pub subject: String,
    pub body: String,
}

/// Gmail label as listed by the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailLabel {
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub label_type: Option<String>,
}
