//! Browser-side OAuth configuration. Holds no secret.

use api::auth::{
    is_placeholder, parse_scopes, AuthError, AuthUrl, AuthorizationRequest, ClientId, RedirectUrl,
};

pub const GITHUB_AUTHORIZE_URL: &str = "https://github.com/login/oauth/authorize";
pub const DEFAULT_SCOPE: &str = "user:email";

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub client_id: String,
    /// The relay's callback URL, registered with the GitHub OAuth app.
    pub redirect_uri: String,
    pub scope: String,
    pub auth_url: String,
}

impl ClientConfig {
    pub fn new(client_id: impl Into<String>, redirect_uri: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            redirect_uri: redirect_uri.into(),
            scope: DEFAULT_SCOPE.to_string(),
            auth_url: GITHUB_AUTHORIZE_URL.to_string(),
        }
    }

    /// A new authorization request with a fresh `state`.
    pub fn authorization_request(&self) -> Result<AuthorizationRequest, AuthError> {
        if is_placeholder(&self.client_id) {
            return Err(AuthError::Configuration(
                "GitHub client id is not configured".to_string(),
            ));
        }

        let auth_url = AuthUrl::new(self.auth_url.clone())
            .map_err(|e| AuthError::Configuration(format!("invalid auth_url: {e}")))?;
        let redirect_url = RedirectUrl::new(self.redirect_uri.clone())
            .map_err(|e| AuthError::Configuration(format!("invalid redirect_uri: {e}")))?;

        Ok(AuthorizationRequest::new(
            ClientId::new(self.client_id.trim().to_string()),
            auth_url,
            redirect_url,
            parse_scopes(&self.scope),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_client_id_is_refused() {
        for id in ["", "your_client_id", "<client id>", "changeme"] {
            let err = ClientConfig::new(id, "http://localhost:3000/auth/callback")
                .authorization_request()
                .unwrap_err();
            assert_eq!(err.code(), "config_error", "client id {id:?}");
        }
    }

    #[test]
    fn test_request_uses_defaults() {
        let request = ClientConfig::new("Iv1.abc", "http://localhost:3000/auth/callback")
            .authorization_request()
            .unwrap();
        let url = request.url();

        assert!(url.as_str().starts_with(GITHUB_AUTHORIZE_URL));
        assert!(url
            .query_pairs()
            .any(|(k, v)| k == "scope" && v == DEFAULT_SCOPE));
    }

    #[test]
    fn test_bad_redirect_uri_is_refused() {
        let err = ClientConfig::new("Iv1.abc", "/relative")
            .authorization_request()
            .unwrap_err();
        assert!(err.to_string().contains("redirect_uri"));
    }
}
