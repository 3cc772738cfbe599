use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::session::{KeyValueStore, StoreError};

/// In-memory KeyValueStore for testing and native fallback.
///
/// Clones share the same map. Every batch runs under one lock, so readers never
/// see half of a `set_many`.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl KeyValueStore for MemoryStore {
    fn get_many(&self, keys: &[&str]) -> Result<Vec<Option<String>>, StoreError> {
        let entries = self.lock();
        Ok(keys.iter().map(|k| entries.get(*k).cloned()).collect())
    }

    fn set_many(&self, pairs: &[(&str, &str)]) -> Result<(), StoreError> {
        let mut entries = self.lock();
        for (key, value) in pairs {
            entries.insert(key.to_string(), value.to_string());
        }
        Ok(())
    }

    fn remove_many(&self, keys: &[&str]) -> Result<(), StoreError> {
        let mut entries = self.lock();
        for key in keys {
            entries.remove(*key);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_many_preserves_order() {
        let store = MemoryStore::new();
        store.set_many(&[("a", "1"), ("b", "2")]).unwrap();

        let values = store.get_many(&["b", "missing", "a"]).unwrap();
        assert_eq!(
            values,
            vec![Some("2".to_string()), None, Some("1".to_string())]
        );
    }

    #[test]
    fn test_clones_share_entries() {
        let store = MemoryStore::new();
        let other = store.clone();

        store.set_many(&[("k", "v")]).unwrap();
        assert_eq!(other.get("k").unwrap(), Some("v".to_string()));

        other.remove_many(&["k"]).unwrap();
        assert_eq!(store.get("k").unwrap(), None);
    }
}
