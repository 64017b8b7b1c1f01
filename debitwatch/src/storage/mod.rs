pub mod memory_storage;
pub mod sqlite_storage;

pub use memory_storage::MemoryTransactionStore;
pub use sqlite_storage::SqliteTransactionStore;

use anyhow::Result;
use async_trait::async_trait;
use shared_types::{DateRange, Transaction};

#[async_trait]
pub trait TransactionStore: Send + Sync {
    async fn save(&self, transaction: &Transaction) -> Result<()>;

    /// Inclusive on both bounds, ordered by date
    async fn find_by_date_range(&self, range: &DateRange) -> Result<Vec<Transaction>>;
}
