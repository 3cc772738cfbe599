//! Failure taxonomy for the login flow.

#[cfg(feature = "server")]
use reqwest::StatusCode;
use thiserror::Error;

/// Code a relay redirect carries when the `code` parameter is absent.
pub const MISSING_CODE: &str = "missing_code";
/// Code the client reports when a relay success redirect lacks `user` or `token`.
pub const MISSING_PAYLOAD: &str = "missing_payload";
/// Code for any failure talking to GitHub after a code was received.
pub const API_ERROR: &str = "api_error";
/// Code for faults nothing else accounts for.
pub const SERVER_ERROR: &str = "server_error";

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    /// Missing or placeholder credentials, unparsable endpoints. Raised before any
    /// network call.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// GitHub answered the token request with `{error, error_description}`.
    #[error("GitHub denied the authorization: {error}")]
    OAuthDenied {
        error: String,
        description: Option<String>,
    },

    /// Transport failure, non-2xx, or an unreadable body from the token endpoint.
    #[error("token exchange failed: {0}")]
    ExchangeFailed(String),

    /// A 2xx token response with neither a token nor an error. Reported as 400:
    /// GitHub accepted the request but issued nothing for this code, so the
    /// caller has to start over with a new one.
    #[error("no access token issued")]
    MissingToken,

    #[error("failed to fetch GitHub profile: {0}")]
    ProfileFetchFailed(String),

    /// Never fatal; the profile keeps an empty email.
    #[error("failed to fetch GitHub emails: {0}")]
    EmailFetchFailed(String),

    /// The callback URL lacks what it should carry. Holds the wire code,
    /// [`MISSING_CODE`] or [`MISSING_PAYLOAD`].
    #[error("malformed callback: {0}")]
    MalformedCallback(&'static str),

    /// The callback's `state` is not the one this client sent.
    #[error("login state mismatch; start the login again")]
    StateMismatch,

    /// The client could not persist the session or the pending `state`.
    #[error("session storage failed: {0}")]
    Storage(String),
}

impl AuthError {
    /// Short machine-readable code used in relay redirects and JSON bodies.
    pub fn code(&self) -> &str {
        match self {
            Self::Configuration(_) => "config_error",
            Self::OAuthDenied { .. }
            | Self::ExchangeFailed(_)
            | Self::MissingToken
            | Self::ProfileFetchFailed(_) => API_ERROR,
            Self::EmailFetchFailed(_) => "email_error",
            Self::MalformedCallback(code) => *code,
            Self::StateMismatch => "state_mismatch",
            Self::Storage(_) => "storage_error",
        }
    }

    /// Human-readable detail for `error_description`.
    pub fn description(&self) -> String {
        match self {
            Self::OAuthDenied { error, description } => {
                description.clone().unwrap_or_else(|| error.clone())
            }
            other => other.to_string(),
        }
    }

    /// HTTP status for the JSON response mode.
    #[cfg(feature = "server")]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::OAuthDenied { .. }
            | Self::MissingToken
            | Self::MalformedCallback(_)
            | Self::StateMismatch => StatusCode::BAD_REQUEST,
            Self::Configuration(_)
            | Self::ExchangeFailed(_)
            | Self::ProfileFetchFailed(_)
            | Self::EmailFetchFailed(_)
            | Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_denial_surfaces_description() {
        let err = AuthError::OAuthDenied {
            error: "bad_verification_code".into(),
            description: Some("The code passed is incorrect or expired.".into()),
        };
        assert_eq!(err.code(), API_ERROR);
        assert_eq!(err.description(), "The code passed is incorrect or expired.");
    }

    #[test]
    fn test_denial_without_description_uses_error() {
        let err = AuthError::OAuthDenied {
            error: "bad_verification_code".into(),
            description: None,
        };
        assert_eq!(err.description(), "bad_verification_code");
        assert!(err.to_string().contains("bad_verification_code"));
    }

    #[test]
    fn test_malformed_callback_code_passes_through() {
        let err = AuthError::MalformedCallback(MISSING_CODE);
        assert_eq!(err.code(), "missing_code");
    }

    #[cfg(feature = "server")]
    #[test]
    fn test_caller_faults_are_bad_requests() {
        let denied = AuthError::OAuthDenied {
            error: "bad_verification_code".into(),
            description: None,
        };
        assert_eq!(denied.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AuthError::MalformedCallback(MISSING_CODE).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AuthError::StateMismatch.status(), StatusCode::BAD_REQUEST);
    }

    #[cfg(feature = "server")]
    #[test]
    fn test_upstream_faults_are_server_errors() {
        assert_eq!(
            AuthError::ExchangeFailed("timeout".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AuthError::ProfileFetchFailed("status 500".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(AuthError::MissingToken.status(), StatusCode::BAD_REQUEST);
        assert_eq!(AuthError::MissingToken.code(), API_ERROR);
    }
}
