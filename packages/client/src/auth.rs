//! # Login orchestration in the browser
//!
//! [`AuthOrchestrator`] starts logins and reconciles whatever the page URL carries
//! on load with the persisted session. On load the URL falls into exactly one of
//! these cases, checked in this order:
//!
//! | URL carries | Result |
//! |-------------|--------|
//! | `error` (relay failure or GitHub denial) | logged out, message shown, no exchange |
//! | `auth=success&user=..&token=..` | session persisted, logged in |
//! | raw `code` | direct exchange if enabled, otherwise an error |
//! | none of the above | whatever the session store holds |
//!
//! In every callback case the login parameters are stripped from the visible URL
//! so a reload does not replay them, and the pending `state` is consumed. A
//! callback is only accepted when its `state` matches the one saved by
//! [`initiate_login`](AuthOrchestrator::initiate_login).
//!
//! A callback that arrives while no login is pending is dropped without touching
//! the stored session, so a crafted link cannot sign the user out.
//!
//! Raw `code` exchange needs the client secret and is compiled in only with the
//! `direct-exchange` feature.

#[cfg(any(test, feature = "direct-exchange"))]
use api::auth::GitHubOAuth;
use api::auth::{AuthError, MISSING_PAYLOAD};
use store::{KeyValueStore, Session, SessionStore, UserProfile};
use url::Url;

use crate::config::ClientConfig;
use crate::location::Location;

/// Query parameters owned by the login flow.
const CALLBACK_PARAMS: &[&str] = &[
    "auth",
    "user",
    "token",
    "state",
    "code",
    "error",
    "error_description",
    "error_uri",
];

/// What the UI renders from.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthState {
    pub session: Option<Session>,
    /// True only until the first reconciliation finishes.
    pub loading: bool,
    /// User-facing message from the last failed login.
    pub error: Option<String>,
}

impl Default for AuthState {
    fn default() -> Self {
        Self {
            session: None,
            loading: true,
            error: None,
        }
    }
}

impl AuthState {
    fn logged_in(session: Session) -> Self {
        Self {
            session: Some(session),
            loading: false,
            error: None,
        }
    }

    fn logged_out(error: Option<String>) -> Self {
        Self {
            session: None,
            loading: false,
            error,
        }
    }

    pub fn is_logged_in(&self) -> bool {
        self.session.is_some()
    }

    pub fn user(&self) -> Option<&UserProfile> {
        self.session.as_ref().map(|s| &s.user)
    }
}

/// Login parameters found in a page URL.
#[derive(Debug, Clone, PartialEq)]
pub enum Callback {
    None,
    Error {
        error: String,
        description: Option<String>,
        state: Option<String>,
    },
    RelaySuccess {
        user: Option<String>,
        token: Option<String>,
        state: Option<String>,
    },
    Code {
        code: String,
        state: Option<String>,
    },
}

/// Classify the login parameters in `url`.
pub fn parse_callback(url: &Url) -> Callback {
    let mut auth = None;
    let mut user = None;
    let mut token = None;
    let mut state = None;
    let mut code = None;
    let mut error = None;
    let mut description = None;

    for (key, value) in url.query_pairs() {
        let value = Some(value.into_owned()).filter(|v| !v.is_empty());
        match key.as_ref() {
            "auth" => auth = value,
            "user" => user = value,
            "token" => token = value,
            "state" => state = value,
            "code" => code = value,
            "error" => error = value,
            "error_description" => description = value,
            _ => {}
        }
    }

    if let Some(error) = error {
        Callback::Error {
            error,
            description,
            state,
        }
    } else if auth.as_deref() == Some("success") {
        Callback::RelaySuccess { user, token, state }
    } else if let Some(code) = code {
        Callback::Code { code, state }
    } else {
        Callback::None
    }
}

/// `url` without the login parameters, keeping everything else.
pub fn strip_callback_params(url: &Url) -> Url {
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !CALLBACK_PARAMS.contains(&key.as_ref()))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let mut stripped = url.clone();
    if kept.is_empty() {
        stripped.set_query(None);
    } else {
        stripped.query_pairs_mut().clear().extend_pairs(kept);
    }
    stripped
}

pub struct AuthOrchestrator<S: KeyValueStore, L: Location> {
    config: ClientConfig,
    store: SessionStore<S>,
    location: L,
    #[cfg(any(test, feature = "direct-exchange"))]
    direct: Option<GitHubOAuth>,
}

impl<S: KeyValueStore, L: Location> AuthOrchestrator<S, L> {
    pub fn new(config: ClientConfig, store: SessionStore<S>, location: L) -> Self {
        Self {
            config,
            store,
            location,
            #[cfg(any(test, feature = "direct-exchange"))]
            direct: None,
        }
    }

    /// Accept raw `code` callbacks and exchange them from this process.
    ///
    /// `oauth` carries the client secret, so this only belongs in hosts that keep
    /// it private. Browser builds should leave it off and go through the relay.
    #[cfg(any(test, feature = "direct-exchange"))]
    pub fn with_direct_exchange(mut self, oauth: GitHubOAuth) -> Self {
        self.direct = Some(oauth);
        self
    }

    pub fn store(&self) -> &SessionStore<S> {
        &self.store
    }

    /// Remember a fresh `state` and navigate to GitHub's authorization page.
    pub fn initiate_login(&self) -> Result<Url, AuthError> {
        let request = self.config.authorization_request()?;
        self.store
            .save_pending_state(request.state())
            .map_err(|e| AuthError::Storage(e.to_string()))?;

        let url = request.url();
        tracing::info!("Redirecting to GitHub for authorization");
        self.location.assign(url.as_str());
        Ok(url)
    }

    /// Reconcile the current URL with the stored session.
    pub async fn on_load(&self) -> AuthState {
        let current = match Url::parse(&self.location.href()) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!("Unparsable page URL: {}", e);
                return self.refresh();
            }
        };

        let callback = parse_callback(&current);
        if callback == Callback::None {
            return self.refresh();
        }

        let pending = match self.store.take_pending_state() {
            Ok(pending) => pending,
            Err(e) => {
                tracing::warn!("Failed to read pending login state: {}", e);
                None
            }
        };
        self.location
            .replace_state(strip_callback_params(&current).as_str());

        let Some(pending) = pending else {
            tracing::warn!("No login in progress, ignoring callback parameters");
            let mut state = self.refresh();
            state.error = Some(AuthError::StateMismatch.description());
            return state;
        };

        let result = match callback {
            Callback::Error {
                error, description, ..
            } => {
                tracing::warn!(error = %error, "Login returned an error");
                Err(description.unwrap_or(error))
            }
            Callback::RelaySuccess { user, token, state } => self
                .accept_relay(user, token, state, pending)
                .map_err(|e| e.description()),
            Callback::Code { code, state } => self
                .exchange_directly(&code, state, pending)
                .await
                .map_err(|e| e.description()),
            Callback::None => return self.refresh(),
        };

        match result {
            Ok(session) => AuthState::logged_in(session),
            Err(message) => {
                if let Err(e) = self.store.clear() {
                    tracing::warn!("Failed to clear session: {}", e);
                }
                AuthState::logged_out(Some(message))
            }
        }
    }

    /// Clear the stored session.
    pub fn logout(&self) -> AuthState {
        if let Err(e) = self.store.clear() {
            tracing::warn!("Failed to clear session: {}", e);
        }
        tracing::info!("Logged out");
        AuthState::logged_out(None)
    }

    /// Re-read the stored session, e.g. after another tab changed it.
    pub fn refresh(&self) -> AuthState {
        match self.store.load() {
            Some(session) => AuthState::logged_in(session),
            None => AuthState::logged_out(None),
        }
    }

    fn accept_relay(
        &self,
        user: Option<String>,
        token: Option<String>,
        state: Option<String>,
        pending: String,
    ) -> Result<Session, AuthError> {
        verify_state(state, &pending)?;

        let (Some(user), Some(token)) = (user, token) else {
            return Err(AuthError::MalformedCallback(MISSING_PAYLOAD));
        };
        let user: UserProfile = serde_json::from_str(&user).map_err(|e| {
            tracing::warn!("Relay sent an unreadable user: {}", e);
            AuthError::MalformedCallback(MISSING_PAYLOAD)
        })?;

        self.persist(Session::new(user, token))
    }

    #[cfg(any(test, feature = "direct-exchange"))]
    async fn exchange_directly(
        &self,
        code: &str,
        state: Option<String>,
        pending: String,
    ) -> Result<Session, AuthError> {
        let Some(oauth) = &self.direct else {
            return Err(direct_exchange_disabled());
        };
        verify_state(state, &pending)?;

        let session = oauth.login(code).await?;
        self.persist(session)
    }

    #[cfg(not(any(test, feature = "direct-exchange")))]
    async fn exchange_directly(
        &self,
        _code: &str,
        _state: Option<String>,
        _pending: String,
    ) -> Result<Session, AuthError> {
        Err(direct_exchange_disabled())
    }

    fn persist(&self, session: Session) -> Result<Session, AuthError> {
        self.store
            .save(&session)
            .map_err(|e| AuthError::Storage(e.to_string()))?;
        tracing::info!(login = %session.user.login, "Signed in");
        Ok(session)
    }
}

fn direct_exchange_disabled() -> AuthError {
    tracing::warn!("Ignoring raw authorization code; direct exchange is disabled");
    AuthError::Configuration(
        "direct code exchange is disabled; configure the relay as redirect URI".to_string(),
    )
}

fn verify_state(returned: Option<String>, pending: &str) -> Result<(), AuthError> {
    match returned {
        Some(returned) if returned == pending => Ok(()),
        _ => {
            tracing::warn!("Login state mismatch, rejecting callback");
            Err(AuthError::StateMismatch)
        }
    }
}
