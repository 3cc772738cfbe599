//! # Session store: the logged-in pair on top of a key-value backend
//!
//! [`SessionStore`] persists a [`Session`] as two entries under a stable
//! namespace and reads them back as a unit. All storage goes through the
//! [`KeyValueStore`] trait, so the same logic runs against browser local storage,
//! a file on disk, or an in-memory map in tests.
//!
//! ## Keys
//!
//! | Key | Value |
//! |-----|-------|
//! | [`USER_KEY`] (`github_user`) | [`UserProfile`] serialised as JSON text |
//! | [`TOKEN_KEY`] (`github_token`) | the access token, plain text |
//! | [`STATE_KEY`] (`github_oauth_state`) | the `state` of the login currently in flight |
//!
//! A namespace (see [`SessionStore::with_namespace`]) prefixes every key as
//! `"<namespace>:<key>"`.
//!
//! ## Pair consistency
//!
//! A session with a user but no token, or the reverse, is not a session:
//! [`load`](SessionStore::load) reports `None` whenever either half is missing or
//! the user fails to parse.
//!
//! Per-key backends (browser local storage) give no isolation between a reader
//! and a writer in another tab, so both sides follow a protocol:
//!
//! - `save` removes the token, writes the user, then writes the token.
//! - `clear` removes the token before the user.
//! - `load` reads the token, then the user, then the token again, and accepts
//!   the pair only when both token reads agree.
//!
//! Any write that overlaps the user read removes the token first, so the two
//! token reads differ and the load reports "no session" instead of a torn pair.
//! Backends whose batches are atomic (memory, file) never hit that case.

use thiserror::Error;

use crate::models::{Session, UserProfile};

pub const USER_KEY: &str = "github_user";
pub const TOKEN_KEY: &str = "github_token";
pub const STATE_KEY: &str = "github_oauth_state";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode stored data: {0}")]
    Encode(String),

    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
}

/// Synchronous string key-value storage.
///
/// Batch methods apply their entries in the order given. Implementations that
/// can make a batch atomic should.
pub trait KeyValueStore {
    fn get_many(&self, keys: &[&str]) -> Result<Vec<Option<String>>, StoreError>;
    fn set_many(&self, entries: &[(&str, &str)]) -> Result<(), StoreError>;
    fn remove_many(&self, keys: &[&str]) -> Result<(), StoreError>;

    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.get_many(&[key])?.into_iter().next().flatten())
    }
}

/// Persists the logged-in [`Session`] and the pending login `state`.
#[derive(Clone, Debug)]
pub struct SessionStore<S: KeyValueStore> {
    backend: S,
    namespace: Option<String>,
}

impl<S: KeyValueStore> SessionStore<S> {
    pub fn new(backend: S) -> Self {
        Self {
            backend,
            namespace: None,
        }
    }

    /// Scope every key under `namespace`, e.g. one store per deployed app.
    pub fn with_namespace(backend: S, namespace: impl Into<String>) -> Self {
        Self {
            backend,
            namespace: Some(namespace.into()),
        }
    }

    fn key(&self, name: &str) -> String {
        match &self.namespace {
            Some(ns) => format!("{ns}:{name}"),
            None => name.to_string(),
        }
    }

    /// Write the user and token as one logical unit.
    pub fn save(&self, session: &Session) -> Result<(), StoreError> {
        let user_key = self.key(USER_KEY);
        let token_key = self.key(TOKEN_KEY);
        let user_json = serde_json::to_string(&session.user)
            .map_err(|e| StoreError::Encode(e.to_string()))?;

        self.backend.remove_many(&[&token_key])?;
        self.backend.set_many(&[
            (&user_key, &user_json),
            (&token_key, &session.access_token),
        ])?;

        tracing::debug!(login = %session.user.login, "Session saved");
        Ok(())
    }

    /// Read the stored session. A missing, unreadable, or concurrently
    /// rewritten half means no session.
    pub fn load(&self) -> Option<Session> {
        let user_key = self.key(USER_KEY);
        let token_key = self.key(TOKEN_KEY);

        let values = match self.backend.get_many(&[&token_key, &user_key, &token_key]) {
            Ok(values) => values,
            Err(e) => {
                tracing::warn!("Failed to read session: {}", e);
                return None;
            }
        };
        let mut values = values.into_iter();
        let token = values.next().flatten().filter(|t| !t.is_empty())?;
        let user_json = values.next().flatten()?;
        let token_after = values.next().flatten();

        if token_after.as_deref() != Some(token.as_str()) {
            tracing::debug!("Session changed while reading, treating as absent");
            return None;
        }

        match serde_json::from_str::<UserProfile>(&user_json) {
            Ok(user) => Some(Session::new(user, token)),
            Err(e) => {
                tracing::warn!("Stored user is unreadable, ignoring session: {}", e);
                None
            }
        }
    }

    /// Remove both halves of the session.
    pub fn clear(&self) -> Result<(), StoreError> {
        let user_key = self.key(USER_KEY);
        let token_key = self.key(TOKEN_KEY);
        self.backend.remove_many(&[&token_key, &user_key])
    }

    pub fn is_active(&self) -> bool {
        self.load().is_some()
    }

    /// Remember the `state` sent with an authorization request.
    pub fn save_pending_state(&self, state: &str) -> Result<(), StoreError> {
        let key = self.key(STATE_KEY);
        self.backend.set_many(&[(&key, state)])
    }

    /// Read and forget the pending `state`. Each value verifies one callback.
    pub fn take_pending_state(&self) -> Result<Option<String>, StoreError> {
        let key = self.key(STATE_KEY);
        let state = self.backend.get(&key)?;
        if state.is_some() {
            self.backend.remove_many(&[&key])?;
        }
        Ok(state)
    }
}
