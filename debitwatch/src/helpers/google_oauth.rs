use crate::helpers::google_credentials::ClientSecret;
use anyhow::Result;
use oauth2::basic::BasicClient;
use oauth2::{AuthUrl, ClientId, RedirectUrl, RefreshToken, TokenUrl};

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

pub type GoogleTokenResponse =
    oauth2::StandardTokenResponse<oauth2::EmptyExtraTokenFields, oauth2::basic::BasicTokenType>;

pub struct GoogleOAuthClient {
    client: BasicClient,
}

impl GoogleOAuthClient {
    pub fn new(secret: &ClientSecret) -> Result<Self> {
        let client = BasicClient::new(
            ClientId::new(secret.client_id.clone()),
            Some(oauth2::ClientSecret::new(secret.client_secret.clone())),
            AuthUrl::new(GOOGLE_AUTH_URL.to_string())?,
            Some(TokenUrl::new(GOOGLE_TOKEN_URL.to_string())?),
        )
        .set_redirect_uri(RedirectUrl::new(secret.redirect_uri().to_string())?);

        Ok(Self { client })
    }

    pub async fn refresh_token(&self, refresh_token: &str) -> Result<GoogleTokenResponse> {
        let token = self
            .client
            .exchange_refresh_token(&RefreshToken::new(refresh_token.to_string()))
            .request_async(oauth2::reqwest::async_http_client)
            .await?;

        Ok(token)
    }
}
