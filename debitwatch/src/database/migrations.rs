use rusqlite::Connection;

/// Run all database migrations
pub fn run_migrations(conn: &Connection) -> anyhow::Result<()> {
    // occurred_at_ms drives range queries, occurred_at keeps the original offset
    conn.execute(
        "CREATE TABLE IF NOT EXISTS transactions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            occurred_at_ms BIGINT NOT NULL,
            occurred_at VARCHAR NOT NULL,
            amount BIGINT NOT NULL CHECK (amount > 0),
            created_at BIGINT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_transactions_occurred_at_ms
         ON transactions (occurred_at_ms)",
        [],
    )?;

    Ok(())
}
