use crate::config::{AppConfig, InvalidRecordPolicy};
use crate::helpers::clock::Clock;
use crate::integrations::MailSource;
use crate::reports::{SummaryRanges, SummaryRenderer, TransactionAggregator};
use crate::storage::TransactionStore;
use anyhow::{Context, Result};
use extractors::DebitNotificationExtractor;
use shared_types::{OutgoingEmail, RunReport, TransactionSummary};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub query: String,
    pub processed_label_id: String,
    pub recipient: String,
    pub sender: String,
    pub summary_subject: String,
    pub on_invalid_record: InvalidRecordPolicy,
}

impl PipelineSettings {
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Ok(Self {
            query: config.gmail.query.clone(),
            processed_label_id: config.processed_label_id()?.to_string(),
            recipient: config.recipient()?.to_string(),
            sender: config.notification.sender.clone(),
            summary_subject: config.notification.summary_subject.clone(),
            on_invalid_record: config.pipeline.on_invalid_record,
        })
    }
}

enum RecordOutcome {
    Saved,
    Skipped,
}

pub struct TransactionPipeline {
    mail: Arc<dyn MailSource>,
    store: Arc<dyn TransactionStore>,
    clock: Arc<dyn Clock>,
    extractor: DebitNotificationExtractor,
    settings: PipelineSettings,
}

impl TransactionPipeline {
    pub fn new(
        mail: Arc<dyn MailSource>,
        store: Arc<dyn TransactionStore>,
        clock: Arc<dyn Clock>,
        extractor: DebitNotificationExtractor,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            mail,
            store,
            clock,
            extractor,
            settings,
        }
    }

    /// Imports every matching notification, then mails the summary.
    ///
    /// Messages are handled one at a time in the order the mailbox returns
    /// them. A message is labelled only after its transaction is saved.
    pub async fn run(&self) -> Result<RunReport> {
        let ids = self
            .mail
            .search(&self.settings.query)
            .await
            .with_context(|| format!("Failed to search messages with {:?}", self.settings.query))?;

        let mut processed = 0;
        let mut skipped = Vec::new();

        if ids.is_empty() {
            tracing::info!("No new debit notifications");
        } else {
            tracing::info!("Found {} debit notifications", ids.len());
        }

        for id in &ids {
            match self.process_message(id).await? {
                RecordOutcome::Saved => processed += 1,
                RecordOutcome::Skipped => skipped.push(id.clone()),
            }
        }

        let summary = self.summarize().await?;

        let email = OutgoingEmail {
            to: self.settings.recipient.clone(),
            from: self.settings.sender.clone(),
            subject: self.settings.summary_subject.clone(),
            body: SummaryRenderer::to_html(&summary),
        };
        self.mail
            .send(&email)
            .await
            .with_context(|| format!("Failed to send summary to {}", email.to))?;
        tracing::info!("Sent transaction summary to {}", email.to);

        Ok(RunReport {
            processed,
            skipped,
            summary,
        })
    }

    async fn process_message(&self, id: &str) -> Result<RecordOutcome> {
        let record = self
            .mail
            .fetch(id)
            .await
            .with_context(|| format!("Failed to fetch message {}", id))?;

        let transaction = match self.extractor.build_from_record(&record) {
            Ok(transaction) => transaction,
            Err(e) => match self.settings.on_invalid_record {
                InvalidRecordPolicy::Abort => {
                    return Err(anyhow::Error::new(e)
                        .context(format!("Message {} is not a valid debit notification", id)));
                }
                InvalidRecordPolicy::Skip => {
                    tracing::warn!("Skipping message {}: {}", id, e);
                    return Ok(RecordOutcome::Skipped);
                }
            },
        };

        self.store
            .save(&transaction)
            .await
            .with_context(|| format!("Failed to save transaction from message {}", id))?;
        tracing::info!("Saved {}円 withdrawal on {}", transaction.amount(), transaction.date());

        self.mail
            .mark_processed(id, &self.settings.processed_label_id)
            .await
            .with_context(|| format!("Failed to label message {}", id))?;
        tracing::info!("Labelled message {} as processed", id);

        Ok(RecordOutcome::Saved)
    }

    /// Aggregates the stored history as of the clock's current time
    pub async fn summarize(&self) -> Result<TransactionSummary> {
        summarize_store(self.store.as_ref(), self.clock.as_ref()).await
    }
}

/// Month, today and yesterday figures of `store`, with the month's lines
pub async fn summarize_store(
    store: &dyn TransactionStore,
    clock: &dyn Clock,
) -> Result<TransactionSummary> {
    let ranges = SummaryRanges::at(clock.now())?;
    tracing::debug!(
        "Summary ranges: month {}..{}, today {}..{}, yesterday {}",
        ranges.month.start.canonical(),
        ranges.month.end.canonical(),
        ranges.today.start.canonical(),
        ranges.today.end.canonical(),
        ranges.yesterday.start.canonical()
    );

    let month = store.find_by_date_range(&ranges.month).await?;
    let today = store.find_by_date_range(&ranges.today).await?;
    let yesterday = store.find_by_date_range(&ranges.yesterday).await?;

    SummaryRenderer::render(
        TransactionAggregator::sum_and_count(&month).context("Failed to total this month")?,
        TransactionAggregator::sum_and_count(&today).context("Failed to total today")?,
        TransactionAggregator::sum_and_count(&yesterday).context("Failed to total yesterday")?,
        &month,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helpers::clock::FixedClock;
    use crate::storage::MemoryTransactionStore;
    use async_trait::async_trait;
    use chrono::{FixedOffset, TimeZone};
    use shared_types::{
        RawEmailRecord, Totals, Transaction, TransactionDate, ValidationError, WithdrawalAmount,
    };
    use tokio::sync::Mutex;

    const LABEL: &str = "Label_42";

    #[derive(Default)]
    struct FakeMailbox {
        records: Vec<RawEmailRecord>,
        labelled: Mutex<Vec<(String, String)>>,
        sent: Mutex<Vec<OutgoingEmail>>,
        /// Labelling this message id fails
        fail_label: Option<&'static str>,
        fail_send: bool,
    }

    impl FakeMailbox {
        fn with_records(records: Vec<RawEmailRecord>) -> Self {
            Self {
                records,
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl MailSource for FakeMailbox {
        async fn search(&self, _query: &str) -> Result<Vec<String>> {
            Ok(self.records.iter().map(|r| r.id.clone()).collect())
        }

        async fn fetch(&self, id: &str) -> Result<RawEmailRecord> {
            self.records
                .iter()
                .find(|r| r.id == id)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("no message {}", id))
        }

        async fn mark_processed(&self, id: &str, label_id: &str) -> Result<()> {
            if self.fail_label == Some(id) {
                anyhow::bail!("labels.modify returned 500");
            }
            self.labelled
                .lock()
                .await
                .push((id.to_string(), label_id.to_string()));
            Ok(())
        }

        async fn send(&self, email: &OutgoingEmail) -> Result<()> {
            if self.fail_send {
                anyhow::bail!("messages.send returned 503");
            }
            self.sent.lock().await.push(email.clone());
            Ok(())
        }
    }

    /// Rejects transactions of one amount and stores the rest
    struct FailingStore {
        fail_on_amount: i64,
        inner: MemoryTransactionStore,
    }

    #[async_trait]
    impl TransactionStore for FailingStore {
        async fn save(&self, transaction: &Transaction) -> Result<()> {
            if transaction.amount().value() == self.fail_on_amount {
                anyhow::bail!("database is locked");
            }
            self.inner.save(transaction).await
        }

        async fn find_by_date_range(
            &self,
            range: &shared_types::DateRange,
        ) -> Result<Vec<Transaction>> {
            self.inner.find_by_date_range(range).await
        }
    }

    fn jst() -> FixedOffset {
        FixedOffset::east_opt(9 * 3600).unwrap()
    }

    fn record(id: &str, day: u32, hour: u32, snippet: &str) -> RawEmailRecord {
        let millis = jst()
            .with_ymd_and_hms(2024, 3, day, hour, 0, 0)
            .unwrap()
            .timestamp_millis();
        RawEmailRecord {
            id: id.to_string(),
            received_at: millis.to_string(),
            snippet: snippet.to_string(),
        }
    }

    fn notification(id: &str, day: u32, hour: u32, amount: i64) -> RawEmailRecord {
        record(
            id,
            day,
            hour,
            &format!("デビットカードご利用のお知らせ 口座引落分：{}円 ご利用先", amount),
        )
    }

    fn settings(policy: InvalidRecordPolicy) -> PipelineSettings {
        PipelineSettings {
            query: "subject:デビットカード -label:processed".to_string(),
            processed_label_id: LABEL.to_string(),
            recipient: "owner@example.com".to_string(),
            sender: "me".to_string(),
            summary_subject: "本日の取引概要".to_string(),
            on_invalid_record: policy,
        }
    }

    fn pipeline(
        mailbox: Arc<FakeMailbox>,
        store: Arc<dyn TransactionStore>,
        policy: InvalidRecordPolicy,
    ) -> TransactionPipeline {
        let clock = FixedClock(jst().with_ymd_and_hms(2024, 3, 10, 21, 0, 0).unwrap());
        TransactionPipeline::new(
            mailbox,
            store,
            Arc::new(clock),
            DebitNotificationExtractor::new(jst()),
            settings(policy),
        )
    }

    fn mixed_batch() -> Vec<RawEmailRecord> {
        vec![
            notification("m1", 10, 8, 1200),
            record("m2", 10, 9, "ご利用ありがとうございます"),
            notification("m3", 10, 12, 800),
        ]
    }

    #[tokio::test]
    async fn test_run_saves_labels_and_sends_summary() {
        let mailbox = Arc::new(FakeMailbox::with_records(vec![
            notification("m1", 10, 8, 1200),
            notification("m2", 10, 12, 300),
        ]));
        let store = Arc::new(MemoryTransactionStore::new());

        let report = pipeline(mailbox.clone(), store.clone(), InvalidRecordPolicy::Abort)
            .run()
            .await
            .unwrap();

        assert_eq!(report.processed, 2);
        assert!(report.skipped.is_empty());
        assert_eq!(report.summary.today, Totals { count: 2, total: 1500 });
        assert_eq!(store.all().await.len(), 2);

        let labelled = mailbox.labelled.lock().await;
        assert_eq!(
            *labelled,
            vec![
                ("m1".to_string(), LABEL.to_string()),
                ("m2".to_string(), LABEL.to_string())
            ]
        );

        let sent = mailbox.sent.lock().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "owner@example.com");
        assert_eq!(sent[0].subject, "本日の取引概要");
        assert!(sent[0].body.contains("1500 + 0 = 1500"));
    }

    #[tokio::test]
    async fn test_abort_stops_at_first_invalid_record() {
        let mailbox = Arc::new(FakeMailbox::with_records(mixed_batch()));
        let store = Arc::new(MemoryTransactionStore::new());

        let err = pipeline(mailbox.clone(), store.clone(), InvalidRecordPolicy::Abort)
            .run()
            .await
            .unwrap_err();

        assert_eq!(
            err.downcast_ref::<ValidationError>(),
            Some(&ValidationError::MissingAmount)
        );
        assert!(err.to_string().contains("m2"));

        assert_eq!(store.all().await.len(), 1);
        assert_eq!(mailbox.labelled.lock().await.len(), 1);
        assert!(mailbox.sent.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_skip_leaves_invalid_record_unlabelled() {
        let mailbox = Arc::new(FakeMailbox::with_records(mixed_batch()));
        let store = Arc::new(MemoryTransactionStore::new());

        let report = pipeline(mailbox.clone(), store.clone(), InvalidRecordPolicy::Skip)
            .run()
            .await
            .unwrap();

        assert_eq!(report.processed, 2);
        assert_eq!(report.skipped, vec!["m2".to_string()]);
        assert_eq!(store.all().await.len(), 2);

        let labelled: Vec<String> = mailbox
            .labelled
            .lock()
            .await
            .iter()
            .map(|(id, _)| id.clone())
            .collect();
        assert_eq!(labelled, vec!["m1".to_string(), "m3".to_string()]);
        assert_eq!(mailbox.sent.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn test_no_messages_still_sends_summary() {
        let mailbox = Arc::new(FakeMailbox::default());
        let store = Arc::new(MemoryTransactionStore::new());

        let report = pipeline(mailbox.clone(), store, InvalidRecordPolicy::Abort)
            .run()
            .await
            .unwrap();

        assert_eq!(report.processed, 0);
        assert_eq!(report.summary.month, Totals::default());
        assert_eq!(mailbox.sent.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn test_summary_includes_earlier_history() {
        let at = |day: u32, hour: u32, amount: i64| {
            Transaction::new(
                TransactionDate::new(jst().with_ymd_and_hms(2024, 3, day, hour, 0, 0).unwrap()),
                WithdrawalAmount::new(amount).unwrap(),
            )
        };
        let store = Arc::new(MemoryTransactionStore::with_transactions(vec![
            at(9, 0, 400),
            at(9, 15, 100),
            at(2, 10, 2000),
            // previous month
            Transaction::new(
                TransactionDate::new(jst().with_ymd_and_hms(2024, 2, 29, 10, 0, 0).unwrap()),
                WithdrawalAmount::new(9999).unwrap(),
            ),
        ]));
        let mailbox = Arc::new(FakeMailbox::with_records(vec![notification(
            "m1", 10, 8, 500,
        )]));

        let summary = pipeline(mailbox, store, InvalidRecordPolicy::Abort)
            .run()
            .await
            .unwrap()
            .summary;

        assert_eq!(summary.month, Totals { count: 4, total: 3000 });
        assert_eq!(summary.today, Totals { count: 1, total: 500 });
        // only the 00:00:00.000 instant counts as yesterday
        assert_eq!(summary.yesterday, Totals { count: 1, total: 400 });
        assert_eq!(summary.month_before_yesterday, 2600);
        assert_eq!(summary.lines.first().map(|l| l.amount), Some(2000));
    }

    #[tokio::test]
    async fn test_summarize_does_not_touch_mailbox() {
        let mailbox = Arc::new(FakeMailbox::with_records(vec![notification(
            "m1", 10, 8, 500,
        )]));
        let store = Arc::new(MemoryTransactionStore::new());

        let summary = pipeline(mailbox.clone(), store, InvalidRecordPolicy::Abort)
            .summarize()
            .await
            .unwrap();

        assert_eq!(summary.month.count, 0);
        assert!(mailbox.labelled.lock().await.is_empty());
        assert!(mailbox.sent.lock().await.is_empty());
    }

    fn labelled_ids(labelled: &[(String, String)]) -> Vec<&str> {
        labelled.iter().map(|(id, _)| id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_failed_save_leaves_message_unlabelled() {
        let mailbox = Arc::new(FakeMailbox::with_records(vec![
            notification("m1", 10, 8, 1200),
            notification("m2", 10, 9, 666),
            notification("m3", 10, 12, 800),
        ]));
        let store = Arc::new(FailingStore {
            fail_on_amount: 666,
            inner: MemoryTransactionStore::new(),
        });

        let err = pipeline(mailbox.clone(), store.clone(), InvalidRecordPolicy::Skip)
            .run()
            .await
            .unwrap_err();

        assert!(err.to_string().contains("Failed to save transaction from message m2"));
        assert_eq!(store.inner.all().await.len(), 1);
        assert_eq!(labelled_ids(&mailbox.labelled.lock().await), vec!["m1"]);
        assert!(mailbox.sent.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_failed_label_stops_the_run() {
        let mailbox = Arc::new(FakeMailbox {
            records: vec![
                notification("m1", 10, 8, 1200),
                notification("m2", 10, 9, 300),
                notification("m3", 10, 12, 800),
            ],
            fail_label: Some("m2"),
            ..Default::default()
        });
        let store = Arc::new(MemoryTransactionStore::new());

        let err = pipeline(mailbox.clone(), store.clone(), InvalidRecordPolicy::Abort)
            .run()
            .await
            .unwrap_err();

        assert!(err.to_string().contains("Failed to label message m2"));
        // m2 is stored but keeps matching the search until it is labelled
        assert_eq!(store.all().await.len(), 2);
        assert_eq!(labelled_ids(&mailbox.labelled.lock().await), vec!["m1"]);
        assert!(mailbox.sent.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_failed_summary_send_is_an_error() {
        let mailbox = Arc::new(FakeMailbox {
            records: vec![notification("m1", 10, 8, 1200)],
            fail_send: true,
            ..Default::default()
        });
        let store = Arc::new(MemoryTransactionStore::new());

        let err = pipeline(mailbox.clone(), store.clone(), InvalidRecordPolicy::Abort)
            .run()
            .await
            .unwrap_err();

        assert!(err.to_string().contains("Failed to send summary to owner@example.com"));
        assert_eq!(store.all().await.len(), 1);
        assert_eq!(labelled_ids(&mailbox.labelled.lock().await), vec!["m1"]);
    }

    #[tokio::test]
    async fn test_overflowing_month_total_fails_instead_of_wrapping() {
        let max = i64::MAX.to_string();
        let mailbox = Arc::new(FakeMailbox::with_records(vec![
            notification("m1", 10, 8, i64::MAX),
            record("m2", 10, 9, &format!("口座引落分：{}円", max)),
        ]));
        let store = Arc::new(MemoryTransactionStore::new());

        let err = pipeline(mailbox.clone(), store.clone(), InvalidRecordPolicy::Abort)
            .run()
            .await
            .unwrap_err();

        assert!(format!("{:#}", err).contains("Failed to total this month"));
        assert_eq!(store.all().await.len(), 2);
        assert!(mailbox.sent.lock().await.is_empty());

        let clock = FixedClock(jst().with_ymd_and_hms(2024, 3, 10, 21, 0, 0).unwrap());
        assert!(summarize_store(store.as_ref(), &clock).await.is_err());
    }
}
