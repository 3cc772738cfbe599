//! # Session models
//!
//! The two values a successful GitHub login produces, shared by the relay
//! (which builds them) and the client (which persists them).
//!
//! | Struct | Represents |
//! |--------|-----------|
//! | [`UserProfile`] | The resolved GitHub account. Field names follow the GitHub REST API (`avatar_url`, `html_url`, `public_repos`, ...) so the JSON the relay emits reads like the provider's own payload. |
//! | [`Session`] | A profile paired with the bearer token that fetched it. Only ever created after a successful exchange and always persisted as a pair. |
//!
//! Optional provider fields are normalised on the way in: `email` is the empty
//! string until a primary address is known, `name` falls back to `login`, and the
//! counters default to zero.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A GitHub account as seen by the application.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Stable numeric account id.
    pub id: i64,
    /// Unique handle, e.g. "octocat".
    pub login: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    /// Empty until resolved.
    #[serde(default, deserialize_with = "null_as_default")]
    pub email: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub avatar_url: String,
    /// Link to the account's profile page.
    #[serde(default, deserialize_with = "null_as_default")]
    pub html_url: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub bio: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub public_repos: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub followers: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub following: u32,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// GitHub sends `null` for unset profile fields.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// An authenticated user and the access token issued for them.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub user: UserProfile,
    pub access_token: String,
}

impl Session {
    pub fn new(user: UserProfile, access_token: impl Into<String>) -> Self {
        Self {
            user,
            access_token: access_token.into(),
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("user", &self.user)
            .field("access_token", &"[redacted]")
            .finish()
    }
}
