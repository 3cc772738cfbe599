//! OAuth configuration validated from [`Settings`].

use std::time::Duration;

use oauth2::{AuthUrl, ClientId, ClientSecret, RedirectUrl, Scope, TokenUrl};
use url::Url;

use super::error::AuthError;
use super::authorize::{is_placeholder, parse_scopes};
use crate::settings::{GitHubSettings, HttpSettings};

/// GitHub OAuth app configuration, checked once at startup.
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub client_id: ClientId,
    pub client_secret: ClientSecret,
    pub auth_url: AuthUrl,
    pub token_url: TokenUrl,
    pub redirect_url: RedirectUrl,
    /// REST API root, always ending in `/`.
    pub api_base: Url,
    pub scopes: Vec<Scope>,
    pub user_agent: String,
    pub timeout: Duration,
}

impl OAuthConfig {
    pub fn from_settings(github: &GitHubSettings, http: &HttpSettings) -> Result<Self, AuthError> {
        if is_placeholder(&github.client_id) {
            return Err(AuthError::Configuration(
                "GITHUB_CLIENT_ID is not set".to_string(),
            ));
        }
        if is_placeholder(&github.client_secret) {
            return Err(AuthError::Configuration(
                "GITHUB_CLIENT_SECRET is not set".to_string(),
            ));
        }
        if http.timeout_secs == 0 {
            return Err(AuthError::Configuration(
                "HTTP timeout must be at least one second".to_string(),
            ));
        }

        Ok(Self {
            client_id: ClientId::new(github.client_id.trim().to_string()),
            client_secret: ClientSecret::new(github.client_secret.trim().to_string()),
            auth_url: AuthUrl::new(github.auth_url.clone())
                .map_err(|e| invalid_url("auth_url", e))?,
            token_url: TokenUrl::new(github.token_url.clone())
                .map_err(|e| invalid_url("token_url", e))?,
            redirect_url: RedirectUrl::new(github.redirect_uri.clone())
                .map_err(|e| invalid_url("redirect_uri", e))?,
            api_base: api_base(&github.api_base)?,
            scopes: parse_scopes(&github.scope),
            user_agent: http.user_agent.clone(),
            timeout: Duration::from_secs(http.timeout_secs),
        })
    }
}

fn api_base(raw: &str) -> Result<Url, AuthError> {
    let mut url = Url::parse(raw).map_err(|e| invalid_url("api_base", e))?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn invalid_url(field: &str, e: url::ParseError) -> AuthError {
    AuthError::Configuration(format!("invalid {field}: {e}"))
}
