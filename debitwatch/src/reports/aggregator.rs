use anyhow::Result;
use chrono::{DateTime, Datelike, FixedOffset, Months, NaiveDate, NaiveTime, TimeZone};
use shared_types::{DateRange, Totals, Transaction, TransactionDate};

pub struct TransactionAggregator;

impl TransactionAggregator {
    pub fn sum_and_count(transactions: &[Transaction]) -> Result<Totals> {
        Totals::from_amounts(transactions.iter().map(|t| t.amount().value())).ok_or_else(|| {
            anyhow::anyhow!(
                "Total of {} transactions does not fit in a 64-bit amount",
                transactions.len()
            )
        })
    }
}

/// Query ranges of one summary, all in the offset of `now`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryRanges {
    /// First day 00:00:00.000 through last day 23:59:59.999
    pub month: DateRange,
    /// 00:00:00.000 through 23:59:59.999
    pub today: DateRange,
    /// Only the instant yesterday 00:00:00.000; start and end are equal
    pub yesterday: DateRange,
}

impl SummaryRanges {
    pub fn at(now: DateTime<FixedOffset>) -> Result<Self> {
        let offset = *now.offset();
        let today = now.date_naive();

        let first_of_month = today
            .with_day(1)
            .ok_or_else(|| anyhow::anyhow!("No first day for {}", today))?;
        let last_of_month = first_of_month
            .checked_add_months(Months::new(1))
            .and_then(|d| d.pred_opt())
            .ok_or_else(|| anyhow::anyhow!("No last day of month for {}", today))?;
        let yesterday = today
            .pred_opt()
            .ok_or_else(|| anyhow::anyhow!("No day before {}", today))?;

        let yesterday_start = start_of_day(yesterday, offset)?;

        Ok(Self {
            month: DateRange::new(
                start_of_day(first_of_month, offset)?,
                end_of_day(last_of_month, offset)?,
            ),
            today: DateRange::new(
                start_of_day(today, offset)?,
                end_of_day(today, offset)?,
            ),
            yesterday: DateRange::new(yesterday_start, yesterday_start),
        })
    }
}

fn start_of_day(date: NaiveDate, offset: FixedOffset) -> Result<TransactionDate> {
    let time = NaiveTime::from_hms_milli_opt(0, 0, 0, 0)
        .ok_or_else(|| anyhow::anyhow!("Invalid start of day time"))?;
    at_time(date, time, offset)
}

fn end_of_day(date: NaiveDate, offset: FixedOffset) -> Result<TransactionDate> {
    let time = NaiveTime::from_hms_milli_opt(23, 59, 59, 999)
        .ok_or_else(|| anyhow::anyhow!("Invalid end of day time"))?;
    at_time(date, time, offset)
}

fn at_time(date: NaiveDate, time: NaiveTime, offset: FixedOffset) -> Result<TransactionDate> {
    offset
        .from_local_datetime(&date.and_time(time))
        .single()
        .map(TransactionDate::new)
        .ok_or_else(|| anyhow::anyhow!("{} {} does not exist in {}", date, time, offset))
}
