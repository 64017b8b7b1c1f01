use crate::reports::escape_html;
use anyhow::Result;
use shared_types::{AmountKind, SummaryLine, Totals, Transaction, TransactionSummary};

const CREDIT_COLOR: &str = "#4CAF50";
const DEBIT_COLOR: &str = "#F44336";

pub struct SummaryRenderer;

impl SummaryRenderer {
    pub fn render(
        month: Totals,
        today: Totals,
        yesterday: Totals,
        transactions: &[Transaction],
    ) -> Result<TransactionSummary> {
        let lines = transactions
            .iter()
            .map(|t| {
                let amount = t.amount().value();
                SummaryLine {
                    date: t.date().to_string(),
                    amount,
                    kind: AmountKind::of(amount),
                }
            })
            .collect();

        let month_before_yesterday = month.total.checked_sub(yesterday.total).ok_or_else(|| {
            anyhow::anyhow!(
                "Month total {} minus yesterday's {} overflows",
                month.total,
                yesterday.total
            )
        })?;

        Ok(TransactionSummary {
            month,
            today,
            yesterday,
            month_before_yesterday,
            lines,
        })
    }

    pub fn to_html(summary: &TransactionSummary) -> String {
        let mut html = String::new();
        html.push_str(
            r#"<!DOCTYPE html>
<html lang="ja">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>Transaction Summary</title>
</head>
<body style="font-family: Arial, sans-serif; padding: 20px; background-color: #f9f9f9; color: #333;">
  <div style="background-color: white; padding: 20px; border-radius: 10px; box-shadow: 0 2px 4px rgba(0,0,0,0.1);">
    <h2 style="color: #4CAF50;">取引概要</h2>
"#,
        );

        for (label, value) in narrative(summary) {
            html.push_str(&format!(
                "    <p style=\"margin-bottom: 10px;\"><strong>{}：</strong><span style=\"color: #555;\">{}</span></p>\n",
                label,
                escape_html(&value)
            ));
        }

        html.push_str(
            r#"    <table style="width: 90%; border-collapse: collapse;">
      <tr style="background-color: #4CAF50; color: white;">
        <th style="padding: 8px; border: 1px solid #ddd;">Date</th>
        <th style="padding: 8px; border: 1px solid #ddd;">Amount</th>
      </tr>
"#,
        );

        for line in &summary.lines {
            let color = match line.kind {
                AmountKind::Credit => CREDIT_COLOR,
                AmountKind::Debit => DEBIT_COLOR,
            };
            html.push_str(&format!(
                "      <tr>\n        <td style=\"padding: 8px; border: 1px solid #ddd;\">{}</td>\n        <td style=\"padding: 8px; border: 1px solid #ddd; color: {};\">{}</td>\n      </tr>\n",
                escape_html(&line.date),
                color,
                line.amount
            ));
        }

        html.push_str("    </table>\n  </div>\n</body>\n</html>\n");
        html
    }

    pub fn to_text(summary: &TransactionSummary) -> String {
        let mut text = String::from("取引概要\n");
        for (label, value) in narrative(summary) {
            text.push_str(&format!("{}：{}\n", label, value));
        }

        if !summary.lines.is_empty() {
            text.push('\n');
            for line in &summary.lines {
                let kind = match line.kind {
                    AmountKind::Credit => "入金",
                    AmountKind::Debit => "出金",
                };
                text.push_str(&format!("{}  {:>10}円  {}\n", line.date, line.amount, kind));
            }
        }

        text
    }
}

fn narrative(summary: &TransactionSummary) -> Vec<(&'static str, String)> {
    vec![
        (
            "前日の総額＋昨日の金額",
            format!(
                "{} + {} = {}",
                summary.month_before_yesterday, summary.yesterday.total, summary.month.total
            ),
        ),
        ("今月の取引", format!("{}件", summary.month.count)),
        ("今月の総額", format!("{}円", summary.month.total)),
        ("本日の取引", format!("{}件", summary.today.count)),
        ("本日の総額", format!("{}円", summary.today.total)),
        ("昨日の取引", format!("{}件", summary.yesterday.count)),
        ("昨日の総額", format!("{}円", summary.yesterday.total)),
    ]
}
