use anyhow::Result;
use async_trait::async_trait;
use shared_types::{OutgoingEmail, RawEmailRecord};

/// Mailbox the pipeline reads notifications from and sends reports through
#[async_trait]
pub trait MailSource: Send + Sync {
    /// Ids of messages matching `query`, in the order the mailbox returns them
    async fn search(&self, query: &str) -> Result<Vec<String>>;

    async fn fetch(&self, id: &str) -> Result<RawEmailRecord>;

    async fn mark_processed(&self, id: &str, label_id: &str) -> Result<()>;

    async fn send(&self, email: &OutgoingEmail) -> Result<()>;
}
