//! Resolve the signed-in GitHub account behind an access token.
//!
//! The `/user` payload only carries an email when the account makes one public.
//! Otherwise the primary address comes from `/user/emails`, which is best-effort:
//! email is cosmetic, so a failure there leaves it empty instead of failing login.

use chrono::{DateTime, Utc};
use reqwest::header::ACCEPT;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use url::Url;

use super::config::OAuthConfig;
use super::error::AuthError;
use crate::UserProfile;

const GITHUB_JSON: &str = "application/vnd.github+json";

/// GitHub user info from API.
#[derive(Debug, Deserialize)]
struct GitHubUser {
    id: i64,
    login: String,
    name: Option<String>,
    email: Option<String>,
    avatar_url: Option<String>,
    html_url: Option<String>,
    bio: Option<String>,
    public_repos: Option<u32>,
    followers: Option<u32>,
    following: Option<u32>,
    created_at: Option<DateTime<Utc>>,
}

impl GitHubUser {
    fn into_profile(self) -> UserProfile {
        let name = self
            .name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| self.login.clone());

        UserProfile {
            id: self.id,
            login: self.login,
            name,
            email: self.email.unwrap_or_default(),
            avatar_url: self.avatar_url.unwrap_or_default(),
            html_url: self.html_url.unwrap_or_default(),
            bio: self.bio.unwrap_or_default(),
            public_repos: self.public_repos.unwrap_or(0),
            followers: self.followers.unwrap_or(0),
            following: self.following.unwrap_or(0),
            created_at: self.created_at,
        }
    }
}

/// GitHub email info from API.
#[derive(Debug, Deserialize)]
struct GitHubEmail {
    email: String,
    #[serde(default)]
    primary: bool,
}

#[derive(Debug, Clone)]
pub struct ProfileResolver {
    http: Client,
    user_url: Url,
    emails_url: Url,
}

impl ProfileResolver {
    pub fn new(http: Client, user_url: Url, emails_url: Url) -> Self {
        Self {
            http,
            user_url,
            emails_url,
        }
    }

    pub fn from_config(http: Client, config: &OAuthConfig) -> Result<Self, AuthError> {
        let join = |path: &str| {
            config
                .api_base
                .join(path)
                .map_err(|e| AuthError::Configuration(format!("invalid api_base: {e}")))
        };
        Ok(Self::new(http, join("user")?, join("user/emails")?))
    }

    fn get(&self, url: &Url, token: &str) -> RequestBuilder {
        self.http
            .get(url.clone())
            .bearer_auth(token)
            .header(ACCEPT, GITHUB_JSON)
    }

    /// Fetch the profile, filling in the primary email when it is not public.
    pub async fn resolve(&self, token: &str) -> Result<UserProfile, AuthError> {
        let mut profile = self.fetch_user(token).await?.into_profile();

        if profile.email.trim().is_empty() {
            profile.email = match self.fetch_primary_email(token).await {
                Ok(email) => email.unwrap_or_default(),
                Err(e) => {
                    tracing::warn!(login = %profile.login, "{}", e);
                    String::new()
                }
            };
        }

        Ok(profile)
    }

    async fn fetch_user(&self, token: &str) -> Result<GitHubUser, AuthError> {
        let response = self
            .get(&self.user_url, token)
            .send()
            .await
            .map_err(|e| AuthError::ProfileFetchFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuthError::ProfileFetchFailed(format!(
                "GitHub user API returned status {}",
                status.as_u16()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AuthError::ProfileFetchFailed(format!("unreadable profile: {e}")))
    }

    /// The address flagged primary, if any. Never guesses among the others.
    async fn fetch_primary_email(&self, token: &str) -> Result<Option<String>, AuthError> {
        let response = self
            .get(&self.emails_url, token)
            .send()
            .await
            .map_err(|e| AuthError::EmailFetchFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuthError::EmailFetchFailed(format!(
                "GitHub emails API returned status {}",
                status.as_u16()
            )));
        }

        let emails: Vec<GitHubEmail> = response
            .json()
            .await
            .map_err(|e| AuthError::EmailFetchFailed(format!("unreadable email list: {e}")))?;

        Ok(emails.into_iter().find(|e| e.primary).map(|e| e.email))
    }
}
