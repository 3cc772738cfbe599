//! # GitHub OAuth 2.0 implementation
//!
//! Implements the GitHub Authorization Code flow for a browser application whose
//! secret lives only on the relay.
//!
//! [`GitHubOAuth`] is the server-side handler. It wraps an [`OAuthConfig`], a
//! [`TokenExchangeClient`] and a [`ProfileResolver`] sharing one HTTP client.
//!
//! ## Flow
//!
//! 1. **[`AuthorizationRequest::url`](super::AuthorizationRequest::url)**: the
//!    browser navigates here with a fresh random `state` it has remembered locally.
//! 2. GitHub redirects to the relay's `/auth/callback` with `code` and `state`.
//! 3. **[`login`](GitHubOAuth::login)**: called by the relay. It:
//!    - Exchanges the code for an access token (one attempt, never retried).
//!    - Fetches the profile from `/user`; if no email is public, falls back to
//!      `/user/emails` and picks the primary address.
//!    - Returns the [`Session`] the relay hands back to the browser.
//!
//! Every outbound call shares the configured timeout and does not follow redirects.

use reqwest::Client;

use super::config::OAuthConfig;
use super::error::AuthError;
use super::profile::ProfileResolver;
use super::token::TokenExchangeClient;
use crate::{Session, UserProfile};

/// GitHub OAuth handler.
#[derive(Debug, Clone)]
pub struct GitHubOAuth {
    tokens: TokenExchangeClient,
    profiles: ProfileResolver,
}

impl GitHubOAuth {
    pub fn new(config: OAuthConfig) -> Result<Self, AuthError> {
        let http = build_http_client(&config)?;
        Ok(Self {
            tokens: TokenExchangeClient::new(http.clone(), &config),
            profiles: ProfileResolver::from_config(http, &config)?,
        })
    }

    pub async fn exchange_code(&self, code: &str) -> Result<String, AuthError> {
        self.tokens.exchange(code).await
    }

    pub async fn resolve_profile(&self, token: &str) -> Result<UserProfile, AuthError> {
        self.profiles.resolve(token).await
    }

    /// Exchange the authorization code and resolve the account behind it.
    pub async fn login(&self, code: &str) -> Result<Session, AuthError> {
        let token = self.exchange_code(code).await?;
        let user = self.resolve_profile(&token).await?;
        tracing::info!(login = %user.login, id = user.id, "GitHub login completed");
        Ok(Session::new(user, token))
    }
}

fn build_http_client(config: &OAuthConfig) -> Result<Client, AuthError> {
    let builder = Client::builder().user_agent(config.user_agent.clone());

    #[cfg(not(target_arch = "wasm32"))]
    let builder = builder
        .timeout(config.timeout)
        .redirect(reqwest::redirect::Policy::none());

    builder
        .build()
        .map_err(|e| AuthError::Configuration(format!("failed to build HTTP client: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockGitHub, MockResponse, TOKEN_FIXTURE};
    use serde_json::json;
    use std::time::{Duration, Instant};

    #[tokio::test]
    async fn test_login_builds_session() {
        let mock = MockGitHub::builder().start().await;
        let oauth = GitHubOAuth::new(mock.oauth_config()).unwrap();

        let session = oauth.login("good-code").await.unwrap();

        assert_eq!(session.user.id, 583231);
        assert_eq!(session.access_token, TOKEN_FIXTURE);
        assert_eq!(mock.token_calls(), 1);
        assert_eq!(mock.user_calls(), 1);
    }

    #[tokio::test]
    async fn test_denied_exchange_skips_profile() {
        let mock = MockGitHub::builder()
            .token(MockResponse::ok(json!({ "error": "bad_verification_code" })))
            .start()
            .await;
        let oauth = GitHubOAuth::new(mock.oauth_config()).unwrap();

        let err = oauth.login("stale").await.unwrap_err();

        assert!(matches!(err, AuthError::OAuthDenied { .. }));
        assert_eq!(mock.token_calls(), 1);
        assert_eq!(mock.user_calls(), 0);
    }

    #[tokio::test]
    async fn test_slow_token_endpoint_times_out_once() {
        let mock = MockGitHub::builder()
            .token(
                MockResponse::ok(json!({ "access_token": TOKEN_FIXTURE }))
                    .delayed(Duration::from_secs(3)),
            )
            .start()
            .await;
        let mut config = mock.oauth_config();
        config.timeout = Duration::from_secs(1);
        let oauth = GitHubOAuth::new(config).unwrap();

        let started = Instant::now();
        let err = oauth.login("good-code").await.unwrap_err();

        assert!(matches!(err, AuthError::ExchangeFailed(_)), "{err:?}");
        assert!(started.elapsed() < Duration::from_secs(3));
        assert_eq!(mock.token_calls(), 1);
        assert_eq!(mock.user_calls(), 0);
    }

    #[tokio::test]
    async fn test_slow_profile_endpoint_times_out() {
        let mock = MockGitHub::builder()
            .user(MockResponse::ok(crate::testing::user_fixture()).delayed(Duration::from_secs(3)))
            .start()
            .await;
        let mut config = mock.oauth_config();
        config.timeout = Duration::from_secs(1);
        let oauth = GitHubOAuth::new(config).unwrap();

        let started = Instant::now();
        let err = oauth.login("good-code").await.unwrap_err();

        assert!(matches!(err, AuthError::ProfileFetchFailed(_)), "{err:?}");
        assert!(started.elapsed() < Duration::from_secs(3));
        assert_eq!(mock.token_calls(), 1);
        assert_eq!(mock.user_calls(), 1);
    }
}
