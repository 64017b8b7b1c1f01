pub mod aggregator;
pub mod error_report;
pub mod renderer;

pub use aggregator::{SummaryRanges, TransactionAggregator};
pub use error_report::ErrorReport;
pub use renderer::SummaryRenderer;

pub(crate) fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
