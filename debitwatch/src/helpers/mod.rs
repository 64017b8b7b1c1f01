pub mod clock;
pub mod gmail_auth;
pub mod google_credentials;
pub mod google_oauth;
pub mod token_cache;
