use crate::integrations::gmail_client::GmailError;
use crate::reports::escape_html;
use shared_types::{OutgoingEmail, ValidationError};

/// Mail sent to the operator when a run fails
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorReport {
    pub subject: String,
    pub body: String,
}

impl ErrorReport {
    pub fn from_error(error: &anyhow::Error) -> Self {
        let headline = format!("[{}:{}]", error_kind(error), error);

        let mut causes = String::new();
        for cause in error.chain() {
            causes.push_str(&format!("    <li>{}</li>\n", escape_html(&cause.to_string())));
        }

        let body = format!(
            r#"<html>
<head>
<style>
  body {{
    font-family: 'Courier New', Courier, monospace;
  }}
  .error-message {{
    color: red;
  }}
  .stack-trace {{
    white-space: pre-wrap;
  }}
</style>
</head>
<body>
  <h2 class="error-message">自動明細アプリでエラーが発生しました{}</h2>
  <ul class="stack-trace">
{}  </ul>
</body>
</html>
"#,
            escape_html(&headline),
            causes
        );

        Self {
            subject: format!("エラーが発生しました{}", flatten(&headline)),
            body,
        }
    }

    pub fn into_email(self, to: &str, from: &str) -> OutgoingEmail {
        OutgoingEmail {
            to: to.to_string(),
            from: from.to_string(),
            subject: self.subject,
            body: self.body,
        }
    }
}

fn error_kind(error: &anyhow::Error) -> &'static str {
    if error.chain().any(|e| e.is::<ValidationError>()) {
        "ValidationError"
    } else if error.chain().any(|e| e.is::<GmailError>()) {
        "GmailError"
    } else if error.chain().any(|e| e.is::<rusqlite::Error>()) {
        "DatabaseError"
    } else {
        "Error"
    }
}

fn flatten(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
