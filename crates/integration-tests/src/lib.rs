//! Integration test support for the Lumly usage-limit service.
//!
//! Provides an in-memory application state plus a fault-injecting store
//! wrapper, so the full HTTP surface and the cooldown cycle can be driven
//! without Redis.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::HashSet;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use lumly_core::{KvStore, LimitConfig, MemoryStore, StoreError};
use lumly_server::config::ServerConfig;
use lumly_server::state::AppState;
use secrecy::SecretString;

/// Bearer secret wired into test states.
pub const TEST_SWEEP_SECRET: &str = "gT7#kP2$wM9@dR4!qZ8&vB1*nX5^hJ3c";

/// Build a server config suitable for in-process tests.
///
/// # Panics
///
/// Panics if the loopback literal fails to parse (it cannot).
#[must_use]
#[allow(clippy::missing_panics_doc, clippy::unwrap_used)]
pub fn test_config(limits: LimitConfig) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".parse::<IpAddr>().unwrap(),
        port: 0,
        redis_url: SecretString::from("redis://unused-in-tests"),
        sweep_secret: SecretString::from(TEST_SWEEP_SECRET),
        limits,
        store_timeout: Duration::from_millis(500),
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.0,
    }
}

/// Build an application state over the given store.
#[must_use]
pub fn test_state(store: Arc<dyn KvStore>, limits: LimitConfig) -> AppState {
    AppState::new(test_config(limits), store)
}

/// Build an application state over a fresh in-memory store.
#[must_use]
pub fn memory_state(limits: LimitConfig) -> (Arc<MemoryStore>, AppState) {
    let store = Arc::new(MemoryStore::new());
    let state = test_state(Arc::clone(&store) as Arc<dyn KvStore>, limits);
    (store, state)
}

/// Store wrapper that fails reads for a chosen set of keys.
///
/// Used to verify the fail-soft batch policy: one customer's store failure
/// must not block the rest of a sweep or inspection.
pub struct FlakyStore {
    inner: Arc<dyn KvStore>,
    poisoned: HashSet<String>,
}

impl FlakyStore {
    /// Wrap `inner`, failing any `get` for a key in `poisoned`.
    #[must_use]
    pub fn new(inner: Arc<dyn KvStore>, poisoned: impl IntoIterator<Item = String>) -> Self {
        Self {
            inner,
            poisoned: poisoned.into_iter().collect(),
        }
    }
}

#[async_trait]
impl KvStore for FlakyStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        if self.poisoned.contains(key) {
            return Err(StoreError::Unavailable(format!("injected failure for {key}")));
        }
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.inner.set(key, value).await
    }

    async fn incr(&self, key: &str) -> Result<i64, StoreError> {
        self.inner.incr(key).await
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.inner.delete(key).await
    }

    async fn keys(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        self.inner.keys(prefix).await
    }
}
