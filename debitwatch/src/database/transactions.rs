use crate::database::AsyncDbConnection;
use anyhow::{Context, Result};
use chrono::DateTime;
use rusqlite::params;
use shared_types::{DateRange, Transaction, TransactionDate, WithdrawalAmount};

pub async fn insert_transaction(conn: AsyncDbConnection, transaction: &Transaction) -> Result<i64> {
    let conn = conn.lock().await?;
    let now = chrono::Utc::now().timestamp();
    let date = transaction.date();

    let id: i64 = conn.query_row(
        "INSERT INTO transactions (occurred_at_ms, occurred_at, amount, created_at)
         VALUES (?, ?, ?, ?)
         RETURNING id",
        params![
            date.timestamp_millis(),
            date.canonical(),
            transaction.amount().value(),
            now,
        ],
        |row| row.get(0),
    )?;

    Ok(id)
}

/// Transactions with `range.start <= date <= range.end`, oldest first
pub async fn list_transactions_between(
    conn: AsyncDbConnection,
    range: &DateRange,
) -> Result<Vec<Transaction>> {
    let conn = conn.lock().await?;

    let mut stmt = conn.prepare(
        "SELECT occurred_at, amount
         FROM transactions
         WHERE occurred_at_ms >= ? AND occurred_at_ms <= ?
         ORDER BY occurred_at_ms ASC, id ASC",
    )?;

    let rows = stmt
        .query_map(
            params![range.start.timestamp_millis(), range.end.timestamp_millis()],
            |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)),
        )?
        .collect::<Result<Vec<_>, _>>()?;

    rows.into_iter()
        .map(|(occurred_at, amount)| {
            let at = DateTime::parse_from_rfc3339(&occurred_at).with_context(|| {
                format!("Stored transaction date {:?} is not RFC 3339", occurred_at)
            })?;
            let amount = WithdrawalAmount::new(amount)?;
            Ok(Transaction::new(TransactionDate::new(at), amount))
        })
        .collect()
}
