//! # Relay decision core
//!
//! The relay sits at the OAuth redirect URI. For each callback it decides, without
//! touching HTTP framework types, what the browser should receive:
//!
//! ```text
//! provider error param? ── yes ──▶ Failure(<provider code>)
//!         │ no
//! code present? ────────── no ───▶ Failure(missing_code)
//!         │ yes
//! token exchange ───────── err ──▶ Failure(api_error)
//!         │ ok
//! profile resolution ───── err ──▶ Failure(api_error)
//!         │ ok
//!      Success(session)
//! ```
//!
//! A [`RelayOutcome`] renders in either [`RelayMode`]: a 302 back to the
//! application origin carrying the result in the query string, or a JSON body for
//! programmatic callers. The web layer picks one from configuration and adds the
//! HTTP plumbing (method checks, CORS, panic capture).
//!
//! The incoming `state` is passed through untouched; the browser, which remembers
//! what it sent, is the one that verifies it.

use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{json, Value};
use url::Url;

use crate::auth::{AuthError, GitHubOAuth, MISSING_CODE, SERVER_ERROR};
use crate::Session;

/// How the relay hands results back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelayMode {
    /// 302 to the application origin with the result in the query string.
    #[default]
    Redirect,
    /// JSON body with CORS headers, for programmatic callers.
    Json,
}

/// Query parameters GitHub sends to the redirect URI.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RelayOutcome {
    Success {
        session: Session,
        state: Option<String>,
    },
    Failure {
        code: String,
        description: String,
        status: StatusCode,
        state: Option<String>,
    },
}

impl RelayOutcome {
    pub fn from_error(err: &AuthError, state: Option<String>) -> Self {
        Self::Failure {
            code: err.code().to_string(),
            description: err.description(),
            status: err.status(),
            state,
        }
    }

    /// Catch-all for faults outside the flow itself.
    pub fn server_error(description: impl Into<String>) -> Self {
        Self::Failure {
            code: SERVER_ERROR.to_string(),
            description: description.into(),
            status: StatusCode::INTERNAL_SERVER_ERROR,
            state: None,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Success { .. } => StatusCode::OK,
            Self::Failure { status, .. } => *status,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// `app_origin` with the outcome appended as query parameters.
    ///
    /// - success: `auth=success&user=<json>&token=<token>[&state=..]`
    /// - failure: `error=<code>&error_description=<text>[&state=..]`
    pub fn redirect_url(&self, app_origin: &Url) -> Url {
        let mut url = app_origin.clone();
        match self {
            Self::Success { session, state } => {
                let user = match serde_json::to_string(&session.user) {
                    Ok(user) => user,
                    Err(e) => {
                        tracing::error!("Failed to encode user for redirect: {}", e);
                        return Self::server_error("failed to encode user").redirect_url(app_origin);
                    }
                };
                let mut query = url.query_pairs_mut();
                query
                    .append_pair("auth", "success")
                    .append_pair("user", &user)
                    .append_pair("token", &session.access_token);
                if let Some(state) = state {
                    query.append_pair("state", state);
                }
            }
            Self::Failure {
                code,
                description,
                state,
                ..
            } => {
                let mut query = url.query_pairs_mut();
                query
                    .append_pair("error", code)
                    .append_pair("error_description", description);
                if let Some(state) = state {
                    query.append_pair("state", state);
                }
            }
        }
        url
    }

    /// Body for [`RelayMode::Json`].
    pub fn json_body(&self) -> Value {
        match self {
            Self::Success { session, state } => json!({
                "success": true,
                "user": session.user,
                "access_token": session.access_token,
                "state": state,
            }),
            Self::Failure {
                code,
                description,
                state,
                ..
            } => json!({
                "success": false,
                "error": code,
                "error_description": description,
                "state": state,
            }),
        }
    }
}

/// Run one callback through exchange and profile resolution.
pub async fn handle_callback(oauth: &GitHubOAuth, params: CallbackParams) -> RelayOutcome {
    let state = params.state.filter(|s| !s.is_empty());

    // GitHub redirects here with `error` when the user declines.
    if let Some(error) = params.error.filter(|e| !e.is_empty()) {
        tracing::warn!(error = %error, "GitHub returned an authorization error");
        return RelayOutcome::Failure {
            description: params.error_description.unwrap_or_default(),
            code: error,
            status: StatusCode::BAD_REQUEST,
            state,
        };
    }

    let Some(code) = params.code.filter(|c| !c.trim().is_empty()) else {
        tracing::error!("GitHub callback missing code");
        return RelayOutcome::from_error(&AuthError::MalformedCallback(MISSING_CODE), state);
    };

    match oauth.login(&code).await {
        Ok(session) => RelayOutcome::Success { session, state },
        Err(e) => {
            tracing::error!(code = e.code(), "GitHub login failed: {}", e);
            RelayOutcome::from_error(&e, state)
        }
    }
}
