//! Process-wide registry of external SDK script loads
//!
//! Each script URL is loaded at most once. Every consumer gets a clone of the
//! same shared completion future, so several components can wait for the same
//! SDK without overwriting each other's ready callback.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use futures::future::{BoxFuture, FutureExt, Shared};

/// Completion signal for one script load. Resolves to the load error, if any.
pub type ScriptLoad = Shared<BoxFuture<'static, Result<(), Arc<str>>>>;

#[derive(Clone, Default)]
pub struct ScriptRegistry {
    scripts: Arc<Mutex<HashMap<String, ScriptLoad>>>,
}

impl ScriptRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn global() -> &'static ScriptRegistry {
        static GLOBAL: OnceLock<ScriptRegistry> = OnceLock::new();
        GLOBAL.get_or_init(ScriptRegistry::new)
    }

    /// Start loading `url` unless someone already did, and return its completion signal.
    ///
    /// `load` only runs for the first request of a given URL.
    pub fn ensure_loaded<F>(&self, url: &str, load: F) -> ScriptLoad
    where
        F: FnOnce() -> BoxFuture<'static, Result<(), String>>,
    {
        let mut scripts = self.scripts.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(existing) = scripts.get(url) {
            tracing::trace!(url, "SDK script already requested");
            return existing.clone();
        }

        tracing::info!(url, "Loading SDK script");
        let pending = load()
            .map(|result| result.map_err(Arc::<str>::from))
            .boxed()
            .shared();
        scripts.insert(url.to_string(), pending.clone());
        pending
    }

    #[cfg(test)]
    pub fn is_requested(&self, url: &str) -> bool {
        self.scripts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(url)
    }

    /// True once the load for `url` finished successfully
    #[cfg(test)]
    pub fn is_loaded(&self, url: &str) -> bool {
        self.scripts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(url)
            .and_then(|load| load.peek().cloned())
            .is_some_and(|result| result.is_ok())
    }
}
