//! In-memory mirror of the stored server configuration.
//!
//! The cache is what the rest of the process reads as the live
//! configuration. It is only ever filled from storage
//! ([`ConfigRepository::reload`](super::ConfigRepository::reload)); direct
//! edits through [`ConfigCache::update`] must be followed by
//! [`ConfigRepository::persist_cache`](super::ConfigRepository::persist_cache).

use tokio::sync::RwLock;

use crate::domain::{NewPlayerTemplate, ServerConfig};

/// Process-wide configuration cache.
#[derive(Debug, Default)]
pub struct ConfigCache {
    current: RwLock<Option<ServerConfig>>,
}

impl ConfigCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of the cached configuration, if loaded.
    pub async fn get(&self) -> Option<ServerConfig> {
        self.current.read().await.clone()
    }

    /// Returns `true` once the cache has been filled.
    pub async fn is_loaded(&self) -> bool {
        self.current.read().await.is_some()
    }

    /// Whether logins must present a password. `false` until loaded.
    pub async fn password_required(&self) -> bool {
        self.current
            .read()
            .await
            .as_ref()
            .is_some_and(|config| config.password_required)
    }

    /// The live new-player template, if loaded.
    pub async fn new_player_template(&self) -> Option<NewPlayerTemplate> {
        self.current
            .read()
            .await
            .as_ref()
            .map(|config| config.new_player_details.clone())
    }

    /// Replaces the whole cached configuration.
    pub async fn replace(&self, config: ServerConfig) {
        *self.current.write().await = Some(config);
    }

    /// Mutates the cached configuration in place.
    ///
    /// Returns `None` without calling `f` when nothing is loaded.
    pub async fn update<R>(&self, f: impl FnOnce(&mut ServerConfig) -> R) -> Option<R> {
        self.current.write().await.as_mut().map(f)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn empty_cache_defaults_to_no_password() {
        let cache = ConfigCache::new();
        assert!(!cache.is_loaded().await);
        assert!(!cache.password_required().await);
        assert!(cache.new_player_template().await.is_none());
    }

    #[tokio::test]
    async fn update_is_noop_until_loaded() {
        let cache = ConfigCache::new();
        let touched = cache.update(|config| config.port = 1).await;
        assert!(touched.is_none());
    }

    #[tokio::test]
    async fn replace_then_update_in_place() {
        let cache = ConfigCache::new();
        cache.replace(ServerConfig::seed(8097, true)).await;
        assert!(cache.password_required().await);

        cache
            .update(|config| {
                config
                    .global_variables
                    .insert("weather".to_string(), json!("rain"));
            })
            .await;

        let config = cache.get().await;
        assert_eq!(
            config.and_then(|c| c.global_variables.get("weather").cloned()),
            Some(json!("rain"))
        );
    }
}
