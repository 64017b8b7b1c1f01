use serde::{Deserialize, Serialize};

/// Count and sum of a set of amounts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub count: usize,
    pub total: i64,
}

impl Totals {
    /// `None` when the total does not fit in an `i64`
    pub fn from_amounts<I>(amounts: I) -> Option<Self>
    where
        I: IntoIterator<Item = i64>,
    {
        amounts
            .into_iter()
            .try_fold(Totals::default(), |acc, amount| {
                Some(Totals {
                    count: acc.count + 1,
                    total: acc.total.checked_add(amount)?,
                })
            })
    }
}

/// Whether a listed amount reads as money in or money out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AmountKind {
    Credit,
    Debit,
}

impl AmountKind {
    pub fn of(amount: i64) -> Self {
        if amount <= 0 {
            AmountKind::Credit
        } else {
            AmountKind::Debit
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryLine {
    pub date: String,
    pub amount: i64,
    pub kind: AmountKind,
}

/// Report mailed after every run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionSummary {
    pub month: Totals,
    pub today: Totals,
    pub yesterday: Totals,
    /// Month total without yesterday's share
    pub month_before_yesterday: i64,
    pub lines: Vec<SummaryLine>,
}
