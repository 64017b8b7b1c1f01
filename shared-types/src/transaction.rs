use chrono::{DateTime, FixedOffset, NaiveDate, SecondsFormat};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Raised when a date or amount taken from a notification email is not usable
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("transaction date is empty")]
    EmptyDate,
    #[error("transaction date could not be parsed: {0:?}")]
    InvalidDate(String),
    #[error("no withdrawal amount found in snippet")]
    MissingAmount,
    #[error("withdrawal amount could not be parsed: {0:?}")]
    InvalidAmount(String),
    #[error("withdrawal amount must be greater than 0, got {0}")]
    NonPositiveAmount(i64),
}

/// Point in time at which a debit was notified.
///
/// Raw values are either Gmail's `internalDate` (epoch milliseconds as text)
/// or an RFC 3339 timestamp. Two dates are equal when they denote the same
/// instant, whatever their offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TransactionDate(DateTime<FixedOffset>);

impl TransactionDate {
    pub fn new(at: DateTime<FixedOffset>) -> Self {
        Self(at)
    }

    pub fn parse(raw: &str, offset: FixedOffset) -> Result<Self, ValidationError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ValidationError::EmptyDate);
        }

        if raw.bytes().all(|b| b.is_ascii_digit()) {
            let millis: i64 = raw
                .parse()
                .map_err(|_| ValidationError::InvalidDate(raw.to_string()))?;
            let at = DateTime::from_timestamp_millis(millis)
                .ok_or_else(|| ValidationError::InvalidDate(raw.to_string()))?;
            return Ok(Self(at.with_timezone(&offset)));
        }

        DateTime::parse_from_rfc3339(raw)
            .map(|at| Self(at.with_timezone(&offset)))
            .map_err(|_| ValidationError::InvalidDate(raw.to_string()))
    }

    pub fn value(&self) -> DateTime<FixedOffset> {
        self.0
    }

    pub fn timestamp_millis(&self) -> i64 {
        self.0.timestamp_millis()
    }

    pub fn calendar_date(&self) -> NaiveDate {
        self.0.date_naive()
    }

    /// RFC 3339 with millisecond precision, e.g. `2024-05-03T09:15:00.000+09:00`
    pub fn canonical(&self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::Millis, false)
    }
}

impl fmt::Display for TransactionDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d %H:%M:%S"))
    }
}

/// Strictly positive amount withdrawn, in yen
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct WithdrawalAmount(i64);

impl WithdrawalAmount {
    pub fn new(amount: i64) -> Result<Self, ValidationError> {
        if amount <= 0 {
            return Err(ValidationError::NonPositiveAmount(amount));
        }
        Ok(Self(amount))
    }

    /// Parses decimal digits as found in a snippet. Leading zeros are accepted.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ValidationError::MissingAmount);
        }
        let amount: i64 = raw
            .parse()
            .map_err(|_| ValidationError::InvalidAmount(raw.to_string()))?;
        Self::new(amount)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl TryFrom<i64> for WithdrawalAmount {
    type Error = ValidationError;

    fn try_from(amount: i64) -> Result<Self, Self::Error> {
        Self::new(amount)
    }
}

impl From<WithdrawalAmount> for i64 {
    fn from(amount: WithdrawalAmount) -> Self {
        amount.0
    }
}

impl fmt::Display for WithdrawalAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A debit: one date and one amount, nothing else
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Transaction {
    date: TransactionDate,
    amount: WithdrawalAmount,
}

impl Transaction {
    pub fn new(date: TransactionDate, amount: WithdrawalAmount) -> Self {
        Self { date, amount }
    }

    pub fn date(&self) -> TransactionDate {
        self.date
    }

    pub fn amount(&self) -> WithdrawalAmount {
        self.amount
    }
}

/// Inclusive query range over transaction dates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: TransactionDate,
    pub end: TransactionDate,
}

impl DateRange {
    pub fn new(start: TransactionDate, end: TransactionDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: &TransactionDate) -> bool {
        self.start <= *date && *date <= self.end
    }
}
