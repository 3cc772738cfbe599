//! The browser-safe half of the flow: building GitHub's authorization URL.
//!
//! Nothing here needs the client secret or an HTTP client, so it stays available
//! without the `server` feature.

use oauth2::basic::BasicClient;
use oauth2::{AuthUrl, ClientId, CsrfToken, RedirectUrl, Scope};
use url::Url;

/// Values shipped in sample configs that must never reach GitHub.
const PLACEHOLDERS: &[&str] = &[
    "changeme",
    "placeholder",
    "your_client_id",
    "your_client_secret",
    "your_github_client_id",
    "your_github_client_secret",
    "github client_id",
    "github client_secret",
    "xxx",
];

/// Parameters of one trip to GitHub's authorization page.
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    pub client_id: ClientId,
    pub auth_url: AuthUrl,
    pub redirect_url: RedirectUrl,
    pub scopes: Vec<Scope>,
    pub state: CsrfToken,
}

impl AuthorizationRequest {
    /// Create a request with a fresh random `state`.
    pub fn new(
        client_id: ClientId,
        auth_url: AuthUrl,
        redirect_url: RedirectUrl,
        scopes: Vec<Scope>,
    ) -> Self {
        Self {
            client_id,
            auth_url,
            redirect_url,
            scopes,
            state: CsrfToken::new_random(),
        }
    }

    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = CsrfToken::new(state.into());
        self
    }

    pub fn state(&self) -> &str {
        self.state.secret()
    }

    /// The authorization URL the browser should navigate to.
    pub fn url(&self) -> Url {
        let client = BasicClient::new(self.client_id.clone())
            .set_auth_uri(self.auth_url.clone())
            .set_redirect_uri(self.redirect_url.clone());

        let state = self.state.clone();
        let (url, _) = client
            .authorize_url(move || state)
            .add_scopes(self.scopes.clone())
            .url();
        url
    }
}

/// Split a space- or comma-separated scope list.
pub fn parse_scopes(scope: &str) -> Vec<Scope> {
    scope
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(|s| Scope::new(s.to_string()))
        .collect()
}

/// Whether a credential is unset or still a sample value.
pub fn is_placeholder(value: &str) -> bool {
    let value = value.trim();
    if value.is_empty() || value.starts_with('<') {
        return true;
    }
    let lower = value.to_ascii_lowercase();
    lower.starts_with("your_")
        || lower.starts_with("your-")
        || PLACEHOLDERS.iter().any(|p| *p == lower)
}
