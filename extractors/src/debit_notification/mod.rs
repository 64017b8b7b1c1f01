mod extractor;

pub use extractor::DebitNotificationExtractor;

use regex::Regex;
use std::sync::OnceLock;

/// Phrase used by the bank for the debited amount, e.g. `口座引落分：1200円`.
///
/// The colon is the fullwidth U+FF1A. Digits are ASCII only, `\d` would also
/// match fullwidth digits.
pub const DEBIT_AMOUNT_PATTERN: &str = r"口座引落分：([0-9]+)円";

fn default_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(DEBIT_AMOUNT_PATTERN).expect("pattern is a valid regex"))
}

/// Returns the digits of the first amount phrase in `snippet`, if any
pub fn extract_amount(snippet: &str) -> Option<&str> {
    capture_amount(default_regex(), snippet)
}

fn capture_amount<'a>(regex: &Regex, snippet: &'a str) -> Option<&'a str> {
    regex
        .captures(snippet)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}
