use super::TransactionStore;
use crate::database::{transactions as db, AsyncDbConnection};
use async_trait::async_trait;
use shared_types::{DateRange, Transaction};

pub struct SqliteTransactionStore {
    conn: AsyncDbConnection,
}

impl SqliteTransactionStore {
    pub fn new(conn: AsyncDbConnection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl TransactionStore for SqliteTransactionStore {
    async fn save(&self, transaction: &Transaction) -> anyhow::Result<()> {
        let id = db::insert_transaction(self.conn.clone(), transaction).await?;
        tracing::debug!(
            "Inserted transaction {} ({} on {})",
            id,
            transaction.amount(),
            transaction.date()
        );
        Ok(())
    }

    async fn find_by_date_range(&self, range: &DateRange) -> anyhow::Result<Vec<Transaction>> {
        db::list_transactions_between(self.conn.clone(), range).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Database;
    use chrono::{FixedOffset, TimeZone};
    use shared_types::{TransactionDate, WithdrawalAmount};

    fn at(offset: FixedOffset, day: u32, hour: u32) -> TransactionDate {
        TransactionDate::new(offset.with_ymd_and_hms(2024, 3, day, hour, 0, 0).unwrap())
    }

    fn transaction(date: TransactionDate, amount: i64) -> Transaction {
        Transaction::new(date, WithdrawalAmount::new(amount).unwrap())
    }

    #[tokio::test]
    async fn test_save_and_find_inclusive() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(&dir.path().join("db").join("transactions.sqlite")).unwrap();
        let store = SqliteTransactionStore::new(db.async_connection.clone());
        let jst = FixedOffset::east_opt(9 * 3600).unwrap();

        store.save(&transaction(at(jst, 10, 12), 500)).await.unwrap();
        store.save(&transaction(at(jst, 9, 0), 300)).await.unwrap();
        store.save(&transaction(at(jst, 11, 0), 700)).await.unwrap();

        let range = DateRange::new(at(jst, 9, 0), at(jst, 10, 12));
        let found = store.find_by_date_range(&range).await.unwrap();

        assert_eq!(
            found,
            vec![transaction(at(jst, 9, 0), 300), transaction(at(jst, 10, 12), 500)]
        );
    }

    #[tokio::test]
    async fn test_offset_survives_storage() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(&dir.path().join("transactions.sqlite")).unwrap();
        let store = SqliteTransactionStore::new(db.async_connection.clone());
        let jst = FixedOffset::east_opt(9 * 3600).unwrap();

        let saved = transaction(at(jst, 10, 8), 1200);
        store.save(&saved).await.unwrap();

        let range = DateRange::new(at(jst, 10, 0), at(jst, 10, 23));
        let found = store.find_by_date_range(&range).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].date().canonical(), "2024-03-10T08:00:00.000+09:00");
    }

    #[tokio::test]
    async fn test_reopen_keeps_history() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("transactions.sqlite");
        let jst = FixedOffset::east_opt(9 * 3600).unwrap();

        {
            let db = Database::new(&path).unwrap();
            let store = SqliteTransactionStore::new(db.async_connection.clone());
            store.save(&transaction(at(jst, 1, 9), 100)).await.unwrap();
        }

        let db = Database::new(&path).unwrap();
        let store = SqliteTransactionStore::new(db.async_connection.clone());
        let range = DateRange::new(at(jst, 1, 0), at(jst, 31, 23));
        assert_eq!(store.find_by_date_range(&range).await.unwrap().len(), 1);
    }
}
