//! Access token acquisition
//!
//! A token is fetched once, before any worker starts, and baked into the
//! storage client.

use crate::api::TokenResponse;
use crate::error::{CliError, Result};
use async_trait::async_trait;
use reqwest::Client;
use tracing::info;

/// Source of a bearer token for the storage service
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    async fn refresh_token(&self) -> Result<String>;
}

/// A token supplied directly through `ACCESS_TOKEN`
#[derive(Debug, Clone)]
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait]
impl TokenRefresher for StaticToken {
    async fn refresh_token(&self) -> Result<String> {
        Ok(self.0.clone())
    }
}

/// OAuth2 client-credentials grant
#[derive(Debug, Clone)]
pub struct ClientCredentials {
    pub token_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub scope: Option<String>,
}

#[async_trait]
impl TokenRefresher for ClientCredentials {
    async fn refresh_token(&self) -> Result<String> {
        let mut form = vec![
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
        ];
        if let Some(scope) = &self.scope {
            form.push(("scope", scope.as_str()));
        }

        let response = Client::new()
            .post(&self.token_url)
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CliError::auth(format!(
                "token endpoint {} responded with {}",
                self.token_url, status
            )));
        }

        let token: TokenResponse = response.json().await?;
        info!(expires_in = ?token.expires_in, "Obtained access token");
        Ok(token.access_token)
    }
}

/// Pick a token source from environment variables
///
/// `ACCESS_TOKEN` wins; otherwise `TOKEN_URL`, `CLIENT_ID` and
/// `CLIENT_SECRET` (plus optional `TOKEN_SCOPE`) configure a
/// client-credentials grant.
pub fn refresher_from_env() -> Result<Box<dyn TokenRefresher>> {
    refresher_from_lookup(|key| std::env::var(key).ok())
}

pub fn refresher_from_lookup<F>(lookup: F) -> Result<Box<dyn TokenRefresher>>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(token) = lookup("ACCESS_TOKEN").filter(|t| !t.is_empty()) {
        return Ok(Box::new(StaticToken::new(token)));
    }

    match (lookup("TOKEN_URL"), lookup("CLIENT_ID"), lookup("CLIENT_SECRET")) {
        (Some(token_url), Some(client_id), Some(client_secret)) => {
            Ok(Box::new(ClientCredentials {
                token_url,
                client_id,
                client_secret,
                scope: lookup("TOKEN_SCOPE"),
            }))
        },
        _ => Err(CliError::auth(
            "no credentials configured; set ACCESS_TOKEN, or TOKEN_URL, CLIENT_ID and CLIENT_SECRET",
        )),
    }
}
