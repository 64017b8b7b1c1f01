use crate::debit_notification::{capture_amount, default_regex};
use anyhow::{bail, Result};
use chrono::FixedOffset;
use regex::Regex;
use shared_types::{RawEmailRecord, Transaction, TransactionDate, ValidationError, WithdrawalAmount};

pub struct DebitNotificationExtractor {
    regex: Regex,
    offset: FixedOffset,
}

impl DebitNotificationExtractor {
    /// Uses the built-in amount phrase. Dates are normalized to `offset`.
    pub fn new(offset: FixedOffset) -> Self {
        Self {
            regex: default_regex().clone(),
            offset,
        }
    }

    /// The first capture group of `pattern` must be the amount digits
    pub fn with_pattern(pattern: &str, offset: FixedOffset) -> Result<Self> {
        let regex =
            Regex::new(pattern).map_err(|e| anyhow::anyhow!("Invalid amount pattern: {}", e))?;

        // captures_len counts the implicit whole-match group
        if regex.captures_len() < 2 {
            bail!("Amount pattern {:?} has no capture group for the amount", pattern);
        }

        Ok(Self { regex, offset })
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    pub fn extract_amount<'a>(&self, snippet: &'a str) -> Option<&'a str> {
        capture_amount(&self.regex, snippet)
    }

    pub fn build_transaction(
        &self,
        raw_timestamp: &str,
        snippet: &str,
    ) -> Result<Transaction, ValidationError> {
        let date = TransactionDate::parse(raw_timestamp, self.offset)?;
        let amount = self
            .extract_amount(snippet)
            .ok_or(ValidationError::MissingAmount)
            .and_then(WithdrawalAmount::parse)?;

        Ok(Transaction::new(date, amount))
    }

    pub fn build_from_record(
        &self,
        record: &RawEmailRecord,
    ) -> Result<Transaction, ValidationError> {
        self.build_transaction(&record.received_at, &record.snippet)
    }
}
