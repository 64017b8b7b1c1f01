use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use base64::Engine;
use shared_types::OutgoingEmail;

const LINE_LENGTH: usize = 76;
/// Longest text per encoded word: 45 bytes encode to 60 base64 characters,
/// which with the `=?UTF-8?B?` and `?=` delimiters stays within 75.
const ENCODED_WORD_BYTES: usize = 45;

/// Builds an RFC 2822 HTML message and encodes it as the `raw` field of
/// Gmail's `messages.send`.
pub fn build_raw_message(email: &OutgoingEmail) -> String {
    URL_SAFE.encode(build_message(email))
}

pub fn build_message(email: &OutgoingEmail) -> String {
    let body = STANDARD.encode(email.body.as_bytes());

    let mut message = String::new();
    message.push_str(&format!("To: {}\r\n", header_value(&email.to)));
    message.push_str(&format!("From: {}\r\n", header_value(&email.from)));
    message.push_str(&format!(
        "Subject: {}\r\n",
        encode_subject(&header_value(&email.subject))
    ));
    message.push_str("MIME-Version: 1.0\r\n");
    message.push_str("Content-Type: text/html; charset=\"UTF-8\"\r\n");
    message.push_str("Content-Transfer-Encoding: base64\r\n");
    message.push_str("\r\n");

    for line in body.as_bytes().chunks(LINE_LENGTH) {
        // base64 output is ASCII
        message.push_str(&String::from_utf8_lossy(line));
        message.push_str("\r\n");
    }

    message
}

/// RFC 2047 `B` encoded word
pub fn encode_word(text: &str) -> String {
    format!("=?UTF-8?B?{}?=", STANDARD.encode(text.as_bytes()))
}

/// Encoded words of at most 75 characters, folded onto continuation lines.
/// Words only break between characters.
pub fn encode_subject(text: &str) -> String {
    let mut words = Vec::new();
    let mut start = 0;
    let mut end = 0;

    for (index, c) in text.char_indices() {
        let next = index + c.len_utf8();
        if next - start > ENCODED_WORD_BYTES {
            words.push(encode_word(&text[start..end]));
            start = end;
        }
        end = next;
    }
    if start < end || words.is_empty() {
        words.push(encode_word(&text[start..end]));
    }

    words.join("\r\n ")
}

fn header_value(value: &str) -> String {
    value
        .chars()
        .map(|c| if c == '\r' || c == '\n' { ' ' } else { c })
        .collect::<String>()
        .trim()
        .to_string()
}
