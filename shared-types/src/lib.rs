use serde::{Deserialize, Serialize};

pub mod email;
pub mod summary;
pub mod transaction;

pub use email::{MailLabel, OutgoingEmail, RawEmailRecord};
pub use summary::{AmountKind, SummaryLine, Totals, TransactionSummary};
pub use transaction::{DateRange, Transaction, TransactionDate, ValidationError, WithdrawalAmount};

/// Outcome of one pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub processed: usize,
    pub skipped: Vec<String>,
    pub summary: TransactionSummary,
}
