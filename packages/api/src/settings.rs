//! # Process settings
//!
//! Everything the relay needs is read once at startup into [`Settings`] and passed
//! down explicitly; nothing below this module reads the environment.
//!
//! Sources, lowest priority first:
//!
//! 1. built-in defaults (GitHub's public endpoints, local development origins)
//! 2. `relay.toml` in the working directory, if present
//! 3. environment variables (a `.env` file is loaded first via `dotenvy`)
//!
//! | Key | Environment variable |
//! |-----|----------------------|
//! | `github.client_id` | `GITHUB_CLIENT_ID` |
//! | `github.client_secret` | `GITHUB_CLIENT_SECRET` |
//! | `github.redirect_uri` | `GITHUB_REDIRECT_URI` |
//! | `github.auth_url` | `GITHUB_AUTH_URL` |
//! | `github.token_url` | `GITHUB_TOKEN_URL` |
//! | `github.api_base` | `GITHUB_API_BASE` |
//! | `github.scope` | `GITHUB_SCOPE` |
//! | `relay.app_origin` | `RELAY_APP_ORIGIN` |
//! | `relay.mode` | `RELAY_MODE` (`redirect` or `json`) |
//! | `relay.bind` | `RELAY_BIND` |
//! | `http.timeout_secs` | `HTTP_TIMEOUT_SECS` |
//! | `http.user_agent` | `HTTP_USER_AGENT` |
//!
//! Loading only checks shape. Credentials and URLs are validated when the
//! settings are turned into an [`OAuthConfig`](crate::auth::OAuthConfig).

use std::fmt;

use config::{Config, ConfigError, File, FileFormat};
use serde::Deserialize;
use thiserror::Error;

use crate::relay::RelayMode;

pub const CONFIG_FILE: &str = "relay.toml";

const ENV_KEYS: &[(&str, &str)] = &[
    ("github.client_id", "GITHUB_CLIENT_ID"),
    ("github.client_secret", "GITHUB_CLIENT_SECRET"),
    ("github.redirect_uri", "GITHUB_REDIRECT_URI"),
    ("github.auth_url", "GITHUB_AUTH_URL"),
    ("github.token_url", "GITHUB_TOKEN_URL"),
    ("github.api_base", "GITHUB_API_BASE"),
    ("github.scope", "GITHUB_SCOPE"),
    ("relay.app_origin", "RELAY_APP_ORIGIN"),
    ("relay.mode", "RELAY_MODE"),
    ("relay.bind", "RELAY_BIND"),
    ("http.timeout_secs", "HTTP_TIMEOUT_SECS"),
    ("http.user_agent", "HTTP_USER_AGENT"),
];

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] ConfigError),
}

#[derive(Clone, Deserialize)]
pub struct GitHubSettings {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub auth_url: String,
    pub token_url: String,
    pub api_base: String,
    pub scope: String,
}

impl fmt::Debug for GitHubSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitHubSettings")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[redacted]")
            .field("redirect_uri", &self.redirect_uri)
            .field("auth_url", &self.auth_url)
            .field("token_url", &self.token_url)
            .field("api_base", &self.api_base)
            .field("scope", &self.scope)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RelaySettings {
    /// Where the relay sends the browser back to, e.g. "https://app.example.com/".
    pub app_origin: String,
    pub mode: RelayMode,
    pub bind: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpSettings {
    /// Applies to each outbound call to GitHub.
    pub timeout_secs: u64,
    pub user_agent: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub github: GitHubSettings,
    pub relay: RelaySettings,
    pub http: HttpSettings,
}

impl Settings {
    /// Load from defaults, `relay.toml`, and the process environment.
    pub fn load() -> Result<Self, SettingsError> {
        dotenvy::dotenv().ok();
        Self::from_sources(Some(CONFIG_FILE), |name| std::env::var(name).ok())
    }

    /// Load with an explicit config file and variable lookup.
    pub fn from_sources(
        file: Option<&str>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, SettingsError> {
        let mut builder = Config::builder()
            .set_default("github.client_id", "")?
            .set_default("github.client_secret", "")?
            .set_default("github.redirect_uri", "http://localhost:3000/auth/callback")?
            .set_default("github.auth_url", "https://github.com/login/oauth/authorize")?
            .set_default(
                "github.token_url",
                "https://github.com/login/oauth/access_token",
            )?
            .set_default("github.api_base", "https://api.github.com")?
            .set_default("github.scope", "user:email")?
            .set_default("relay.app_origin", "http://localhost:5173")?
            .set_default("relay.mode", "redirect")?
            .set_default("relay.bind", "127.0.0.1:3000")?
            .set_default("http.timeout_secs", 10)?
            .set_default("http.user_agent", "github-login-relay")?;

        if let Some(file) = file {
            builder = builder.add_source(
                File::with_name(file)
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        for (key, var) in ENV_KEYS {
            let value = lookup(var).filter(|v| !v.trim().is_empty());
            builder = builder.set_override_option(*key, value)?;
        }

        Ok(builder.build()?.try_deserialize()?)
    }
}
