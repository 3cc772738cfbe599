//! Authorization code → access token exchange against GitHub's token endpoint.
//!
//! GitHub answers a bad or expired code with HTTP 200 and an
//! `{error, error_description}` body, so the status alone does not tell success
//! from denial. The body is always inspected.
//!
//! A code is single-use: [`TokenExchangeClient::exchange`] sends exactly one
//! request and never retries.

use oauth2::{ClientId, ClientSecret, RedirectUrl, TokenUrl};
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::config::OAuthConfig;
use super::error::{AuthError, MISSING_CODE};

#[derive(Serialize)]
struct TokenRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    code: &'a str,
    redirect_uri: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

/// Trades authorization codes for access tokens. Holds the client secret; only
/// constructed in trusted contexts.
#[derive(Debug, Clone)]
pub struct TokenExchangeClient {
    http: Client,
    token_url: TokenUrl,
    client_id: ClientId,
    client_secret: ClientSecret,
    redirect_url: RedirectUrl,
}

impl TokenExchangeClient {
    pub fn new(http: Client, config: &OAuthConfig) -> Self {
        Self {
            http,
            token_url: config.token_url.clone(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            redirect_url: config.redirect_url.clone(),
        }
    }

    /// Exchange `code` for an access token.
    pub async fn exchange(&self, code: &str) -> Result<String, AuthError> {
        let code = code.trim();
        if code.is_empty() {
            return Err(AuthError::MalformedCallback(MISSING_CODE));
        }

        let body = TokenRequest {
            client_id: self.client_id.as_str(),
            client_secret: self.client_secret.secret(),
            code,
            redirect_uri: self.redirect_url.as_str(),
        };

        tracing::debug!(token_url = %self.token_url.as_str(), "Exchanging authorization code");

        let response = self
            .http
            .post(self.token_url.url().clone())
            .header(ACCEPT, "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| AuthError::ExchangeFailed(format!("token request failed: {e}")))?;

        parse_token_response(response).await
    }
}

async fn parse_token_response(response: reqwest::Response) -> Result<String, AuthError> {
    let status = response.status();
    if !status.is_success() {
        return Err(AuthError::ExchangeFailed(format!(
            "token endpoint returned status {}",
            status.as_u16()
        )));
    }

    let body = response
        .text()
        .await
        .map_err(|e| AuthError::ExchangeFailed(format!("token response read failed: {e}")))?;

    let token: TokenResponse = serde_json::from_str(&body)
        .map_err(|e| AuthError::ExchangeFailed(format!("token response is not JSON: {e}")))?;

    if let Some(error) = token.error.filter(|e| !e.is_empty()) {
        tracing::warn!(error = %error, "GitHub rejected the authorization code");
        return Err(AuthError::OAuthDenied {
            error,
            description: token.error_description.filter(|d| !d.is_empty()),
        });
    }

    token
        .access_token
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or(AuthError::MissingToken)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockGitHub, MockResponse};
    use serde_json::json;

    fn client_for(mock: &MockGitHub) -> TokenExchangeClient {
        let config = mock.oauth_config();
        TokenExchangeClient::new(Client::new(), &config)
    }

    #[tokio::test]
    async fn test_exchange_returns_token() {
        let mock = MockGitHub::builder().start().await;

        let token = client_for(&mock).exchange("good-code").await.unwrap();

        assert_eq!(token, crate::testing::TOKEN_FIXTURE);
        assert_eq!(mock.token_calls(), 1);

        // Request carries the credentials and the exact redirect URI
        let sent = mock.last_token_request().unwrap();
        assert_eq!(sent["client_id"], "test-client-id");
        assert_eq!(sent["client_secret"], "test-client-secret");
        assert_eq!(sent["code"], "good-code");
        assert_eq!(sent["redirect_uri"], "http://localhost:3000/auth/callback");
    }

    #[tokio::test]
    async fn test_provider_error_is_denial() {
        let mock = MockGitHub::builder()
            .token(MockResponse::ok(json!({
                "error": "bad_verification_code",
                "error_description": "The code passed is incorrect or expired.",
                "error_uri": "https://docs.github.com"
            })))
            .start()
            .await;

        let err = client_for(&mock).exchange("stale").await.unwrap_err();

        match err {
            AuthError::OAuthDenied { error, description } => {
                assert_eq!(error, "bad_verification_code");
                assert_eq!(
                    description.as_deref(),
                    Some("The code passed is incorrect or expired.")
                );
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_token_fails() {
        let mock = MockGitHub::builder()
            .token(MockResponse::ok(json!({ "token_type": "bearer" })))
            .start()
            .await;

        let err = client_for(&mock).exchange("code").await.unwrap_err();

        assert!(matches!(err, AuthError::MissingToken));
    }

    #[tokio::test]
    async fn test_non_success_status_fails() {
        let mock = MockGitHub::builder()
            .token(MockResponse::status(502, json!({ "message": "bad gateway" })))
            .start()
            .await;

        let err = client_for(&mock).exchange("code").await.unwrap_err();

        assert!(matches!(err, AuthError::ExchangeFailed(_)));
        assert_eq!(mock.token_calls(), 1);
    }

    #[tokio::test]
    async fn test_empty_code_never_hits_network() {
        let mock = MockGitHub::builder().start().await;

        let err = client_for(&mock).exchange("  ").await.unwrap_err();

        assert_eq!(err.code(), MISSING_CODE);
        assert_eq!(mock.token_calls(), 0);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_fails() {
        let mut config = MockGitHub::builder().start().await.oauth_config();
        config.token_url = TokenUrl::new(crate::testing::closed_port_url("token")).unwrap();

        let err = TokenExchangeClient::new(Client::new(), &config)
            .exchange("code")
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::ExchangeFailed(_)));
    }
}
