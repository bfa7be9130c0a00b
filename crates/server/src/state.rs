//! Application state shared across handlers.

use std::sync::Arc;

use lumly_core::{CooldownSweeper, KvStore, QueueInspector, UsageLimiter};

use crate::config::ServerConfig;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// store handle and the cooldown-queue components, all constructed once at
/// process start around the same store and [`lumly_core::LimitConfig`].
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    store: Arc<dyn KvStore>,
    limiter: UsageLimiter,
    sweeper: CooldownSweeper,
    inspector: QueueInspector,
}

impl AppState {
    /// Create a new application state around an injected store.
    #[must_use]
    pub fn new(config: ServerConfig, store: Arc<dyn KvStore>) -> Self {
        let limiter = UsageLimiter::new(Arc::clone(&store), config.limits);
        let sweeper = CooldownSweeper::new(Arc::clone(&store), config.limits);
        let inspector = QueueInspector::new(Arc::clone(&store), config.limits);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                limiter,
                sweeper,
                inspector,
            }),
        }
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Get a reference to the key-value store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn KvStore> {
        &self.inner.store
    }

    /// Get a reference to the usage limiter.
    #[must_use]
    pub fn limiter(&self) -> &UsageLimiter {
        &self.inner.limiter
    }

    /// Get a reference to the cooldown sweeper.
    #[must_use]
    pub fn sweeper(&self) -> &CooldownSweeper {
        &self.inner.sweeper
    }

    /// Get a reference to the queue inspector.
    #[must_use]
    pub fn inspector(&self) -> &QueueInspector {
        &self.inner.inspector
    }
}
