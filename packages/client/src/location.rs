//! The page address the orchestrator reads and rewrites.

use std::sync::{Arc, Mutex};

pub trait Location {
    /// The full current URL.
    fn href(&self) -> String;

    /// Full-page navigation.
    fn assign(&self, url: &str);

    /// Rewrite the visible URL without reloading or adding a history entry.
    fn replace_state(&self, url: &str);
}

/// In-memory location for tests and non-browser hosts.
#[derive(Clone, Debug, Default)]
pub struct MemoryLocation {
    inner: Arc<Mutex<MemoryLocationInner>>,
}

#[derive(Debug, Default)]
struct MemoryLocationInner {
    href: String,
    assigned: Vec<String>,
}

impl MemoryLocation {
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(MemoryLocationInner {
                href: href.into(),
                assigned: Vec::new(),
            })),
        }
    }

    /// Every URL passed to [`Location::assign`], oldest first.
    pub fn assigned(&self) -> Vec<String> {
        self.lock().assigned.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryLocationInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Location for MemoryLocation {
    fn href(&self) -> String {
        self.lock().href.clone()
    }

    fn assign(&self, url: &str) {
        let mut inner = self.lock();
        inner.assigned.push(url.to_string());
        inner.href = url.to_string();
    }

    fn replace_state(&self, url: &str) {
        self.lock().href = url.to_string();
    }
}

/// `window.location` and `window.history`.
#[cfg(all(target_arch = "wasm32", feature = "web"))]
#[derive(Clone, Debug, Default)]
pub struct BrowserLocation;

#[cfg(all(target_arch = "wasm32", feature = "web"))]
impl Location for BrowserLocation {
    fn href(&self) -> String {
        web_sys::window()
            .and_then(|window| window.location().href().ok())
            .unwrap_or_default()
    }

    fn assign(&self, url: &str) {
        if let Some(window) = web_sys::window() {
            if let Err(e) = window.location().assign(url) {
                tracing::error!("Failed to navigate: {:?}", e);
            }
        }
    }

    fn replace_state(&self, url: &str) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let result = window.history().and_then(|history| {
            history.replace_state_with_url(&wasm_bindgen::JsValue::NULL, "", Some(url))
        });
        if let Err(e) = result {
            tracing::warn!("Failed to rewrite URL: {:?}", e);
        }
    }
}
