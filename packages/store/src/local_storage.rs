//! # Browser local storage: web-side persistence
//!
//! [`LocalStorageStore`] is the [`KeyValueStore`] used on the **web platform**.
//! Entries live in `window.localStorage`, where other tabs of the same origin can
//! read them and receive `storage` events when they change.
//!
//! Local storage has no transactions. Batches are read and applied entry by entry
//! in the order given; [`crate::SessionStore`] orders its writes and re-checks the
//! token around the user read so that a reader in another tab never accepts a
//! user paired with someone else's token.
//!
//! A missing `window` or disabled storage (private browsing, sandboxed iframe)
//! surfaces as [`StoreError::Unavailable`].

use web_sys::Storage;

use crate::session::{KeyValueStore, StoreError};

/// `window.localStorage`-backed KeyValueStore for the web platform.
#[derive(Clone, Debug, Default)]
pub struct LocalStorageStore;

impl LocalStorageStore {
    pub fn new() -> Self {
        Self
    }

    fn storage(&self) -> Result<Storage, StoreError> {
        let window =
            web_sys::window().ok_or_else(|| StoreError::Unavailable("no window".into()))?;
        window
            .local_storage()
            .map_err(|e| StoreError::Unavailable(format!("{e:?}")))?
            .ok_or_else(|| StoreError::Unavailable("localStorage disabled".into()))
    }
}

impl KeyValueStore for LocalStorageStore {
    fn get_many(&self, keys: &[&str]) -> Result<Vec<Option<String>>, StoreError> {
        let storage = self.storage()?;
        keys.iter()
            .map(|key| {
                storage
                    .get_item(key)
                    .map_err(|e| StoreError::Unavailable(format!("{e:?}")))
            })
            .collect()
    }

    fn set_many(&self, entries: &[(&str, &str)]) -> Result<(), StoreError> {
        let storage = self.storage()?;
        for (key, value) in entries {
            storage
                .set_item(key, value)
                .map_err(|e| StoreError::Unavailable(format!("{e:?}")))?;
        }
        Ok(())
    }

    fn remove_many(&self, keys: &[&str]) -> Result<(), StoreError> {
        let storage = self.storage()?;
        for key in keys {
            storage
                .remove_item(key)
                .map_err(|e| StoreError::Unavailable(format!("{e:?}")))?;
        }
        Ok(())
    }
}
