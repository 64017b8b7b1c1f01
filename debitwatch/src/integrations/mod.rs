pub mod gmail_client;
pub mod mail_source;
pub mod mime;

pub use gmail_client::GmailClient;
pub use mail_source::MailSource;
