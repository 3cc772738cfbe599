//! # Filesystem-backed key-value store
//!
//! [`FileStore`] is a [`KeyValueStore`] that keeps every entry in a single TOML
//! file. It is used by native clients (CLI, desktop) to remember the session
//! across restarts.
//!
//! ## Layout
//!
//! ```text
//! <base_dir>/
//! └── session.toml       # flat table of string keys to string values
//! ```
//!
//! Each batch rewrites the whole table into `session.toml.tmp` and renames it over
//! `session.toml`, so a reader sees either the previous or the next table, never a
//! partly written one. Writers inside one process are serialised by a lock.
//!
//! ## Platform data directories
//!
//! [`FileStore::in_data_dir`] resolves a platform-appropriate base via
//! [`dirs::data_dir()`]:
//!
//! | Platform | Path |
//! |----------|------|
//! | macOS | `~/Library/Application Support/<app>/` |
//! | Linux | `~/.local/share/<app>/` |
//! | Windows | `C:\Users\<user>\AppData\Roaming\<app>\` |

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::session::{KeyValueStore, StoreError};

const FILE_NAME: &str = "session.toml";

/// Filesystem-backed KeyValueStore for native persistence.
#[derive(Clone, Debug)]
pub struct FileStore {
    base: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl FileStore {
    pub fn new(base: PathBuf) -> Self {
        Self {
            base,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Store under the platform data directory, e.g. `~/.local/share/<app>/`.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn in_data_dir(app: &str) -> Option<Self> {
        dirs::data_dir().map(|dir| Self::new(dir.join(app)))
    }

    pub fn path(&self) -> PathBuf {
        self.base.join(FILE_NAME)
    }

    /// Delete the store directory and everything in it.
    pub fn delete(base: &Path) {
        let _ = std::fs::remove_dir_all(base);
    }

    fn read_table(&self) -> Result<BTreeMap<String, String>, StoreError> {
        let content = match std::fs::read_to_string(self.path()) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(e.into()),
        };
        match toml::from_str(&content) {
            Ok(table) => Ok(table),
            Err(e) => {
                // A corrupt file holds no usable session; start over.
                tracing::warn!(path = %self.path().display(), "Discarding unreadable store: {}", e);
                Ok(BTreeMap::new())
            }
        }
    }

    fn write_table(&self, table: &BTreeMap<String, String>) -> Result<(), StoreError> {
        std::fs::create_dir_all(&self.base)?;
        let content =
            toml::to_string_pretty(table).map_err(|e| StoreError::Encode(e.to_string()))?;

        let tmp = self.base.join(format!("{FILE_NAME}.tmp"));
        std::fs::write(&tmp, content)?;
        std::fs::rename(&tmp, self.path())?;
        Ok(())
    }

    fn update(
        &self,
        apply: impl FnOnce(&mut BTreeMap<String, String>),
    ) -> Result<(), StoreError> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut table = self.read_table()?;
        apply(&mut table);
        self.write_table(&table)
    }
}

impl KeyValueStore for FileStore {
    fn get_many(&self, keys: &[&str]) -> Result<Vec<Option<String>>, StoreError> {
        let table = self.read_table()?;
        Ok(keys.iter().map(|k| table.get(*k).cloned()).collect())
    }

    fn set_many(&self, entries: &[(&str, &str)]) -> Result<(), StoreError> {
        self.update(|table| {
            for (key, value) in entries {
                table.insert(key.to_string(), value.to_string());
            }
        })
    }

    fn remove_many(&self, keys: &[&str]) -> Result<(), StoreError> {
        self.update(|table| {
            for key in keys {
                table.remove(*key);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Session, UserProfile};
    use crate::session::SessionStore;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "session_store_{}_{}",
            name,
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_file_store_roundtrip() {
        let dir = temp_dir("roundtrip");

        let user: UserProfile = serde_json::from_value(serde_json::json!({
            "id": 1,
            "login": "octocat",
            "name": "Mona \"The\" Octocat",
            "bio": "line one\nline two"
        }))
        .unwrap();
        let session = Session::new(user, "gho_file");

        SessionStore::new(FileStore::new(dir.clone()))
            .save(&session)
            .unwrap();

        // Re-open from same directory
        let reopened = SessionStore::new(FileStore::new(dir.clone()));
        assert_eq!(reopened.load(), Some(session));

        reopened.clear().unwrap();
        assert!(!SessionStore::new(FileStore::new(dir.clone())).is_active());

        FileStore::delete(&dir);
    }

    #[test]
    fn test_missing_file_reads_empty() {
        let dir = temp_dir("missing");
        let store = FileStore::new(dir.clone());

        assert_eq!(store.get_many(&["a", "b"]).unwrap(), vec![None, None]);
        assert!(!dir.exists());
    }

    #[test]
    fn test_corrupt_file_is_discarded() {
        let dir = temp_dir("corrupt");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(FILE_NAME), "this is = = not toml").unwrap();

        let store = FileStore::new(dir.clone());
        assert_eq!(store.get("github_token").unwrap(), None);

        store.set_many(&[("k", "v")]).unwrap();
        assert_eq!(store.get("k").unwrap(), Some("v".to_string()));
        assert!(!dir.join(format!("{FILE_NAME}.tmp")).exists());

        FileStore::delete(&dir);
    }
}
