use super::TransactionStore;
use async_trait::async_trait;
use shared_types::{DateRange, Transaction};
use tokio::sync::Mutex;

#[derive(Default)]
pub struct MemoryTransactionStore {
    transactions: Mutex<Vec<Transaction>>,
}

impl MemoryTransactionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_transactions(transactions: Vec<Transaction>) -> Self {
        Self {
            transactions: Mutex::new(transactions),
        }
    }

    pub async fn all(&self) -> Vec<Transaction> {
        self.transactions.lock().await.clone()
    }
}

#[async_trait]
impl TransactionStore for MemoryTransactionStore {
    async fn save(&self, transaction: &Transaction) -> anyhow::Result<()> {
        self.transactions.lock().await.push(*transaction);
        Ok(())
    }

    async fn find_by_date_range(&self, range: &DateRange) -> anyhow::Result<Vec<Transaction>> {
        let transactions = self.transactions.lock().await;
        let mut found: Vec<Transaction> = transactions
            .iter()
            .filter(|t| range.contains(&t.date()))
            .copied()
            .collect();
        // stable, so equal dates keep insertion order
        found.sort_by_key(|t| t.date());
        Ok(found)
    }
}
