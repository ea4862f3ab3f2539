//! Shared config handle with atomic replacement.
//!
//! `arc-swap` gives lock-free reads from compile tasks while the engine's
//! set-operation swaps in a new effective config.

use arc_swap::ArcSwap;
use std::sync::Arc;

use super::Config;

pub struct ConfigHandle(ArcSwap<Config>);

impl ConfigHandle {
    pub fn new(config: Config) -> Self {
        Self(ArcSwap::from_pointee(config))
    }

    /// Current effective config.
    #[inline]
    pub fn load(&self) -> Arc<Config> {
        self.0.load_full()
    }

    /// Replace the config atomically; `version` is carried over from the
    /// previous config. Returns the new effective config.
    pub fn store(&self, mut config: Config) -> Arc<Config> {
        config.version = self.load().version.clone();
        let arc = Arc::new(config);
        self.0.store(Arc::clone(&arc));
        arc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_returns_new_effective_config() {
        let handle = ConfigHandle::new(Config::default());
        let mut next = Config::default();
        next.title = "changed".into();
        let effective = handle.store(next);
        assert_eq!(effective.title, "changed");
        assert_eq!(handle.load().title, "changed");
    }

    #[test]
    fn version_is_immutable_after_creation() {
        let handle = ConfigHandle::new(Config::default());
        let mut next = Config::default();
        next.version = "99".into();
        let effective = handle.store(next);
        assert_eq!(effective.version, Config::default().version);
    }
}
