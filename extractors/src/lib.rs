//! Extractors Crate
//!
//! This crate turns bank notification emails into validated transactions.
//!
//! # Architecture
//!
//! - **Types**: `Transaction`, `TransactionDate` and friends live in the `shared-types` crate
//! - **Implementations**: Concrete extractors are implemented in this crate
//!
//! # Available Extractors
//!
//! - `DebitNotificationExtractor`: Extracts the withdrawal amount and date from
//!   Rakuten Bank debit card notifications
//!
//! # Example
//!
//! ```rust,ignore
//! use extractors::DebitNotificationExtractor;
//!
//! let extractor = DebitNotificationExtractor::new(offset);
//! let transaction = extractor.build_from_record(&record)?;
//! ```

pub mod debit_notification;

pub use debit_notification::{extract_amount, DebitNotificationExtractor, DEBIT_AMOUNT_PATTERN};
