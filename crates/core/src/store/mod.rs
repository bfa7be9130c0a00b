//! Key-value storage capability.
//!
//! All persistent state (usage counters and limit markers) lives behind the
//! [`KvStore`] trait. Production injects a Redis-backed implementation;
//! tests inject [`MemoryStore`]. Components receive an `Arc<dyn KvStore>`
//! at construction - there is no lazily-initialized global client.

mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use thiserror::Error;

/// Errors from the key-value store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be reached or a call timed out.
    ///
    /// Never interpreted as "key absent" - absence is `Ok(None)`.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The store returned a value that cannot be interpreted
    /// (e.g. a non-numeric usage counter).
    #[error("invalid value for key {key}: {reason}")]
    InvalidValue { key: String, reason: String },
}

/// Abstract key-value store.
///
/// The contract mirrors the small slice of Redis the system needs:
///
/// - per-key operations are serialized by the backend, and [`incr`] is
///   atomic with respect to concurrent callers for the same key
/// - [`keys`] enumerates current keys with a given prefix; it reflects
///   store state at call time and makes no snapshot guarantee
/// - absent keys read as `None` and delete of an absent key is a no-op
///
/// Implementations are expected to bound every call with a timeout and
/// surface a timed-out call as [`StoreError::Unavailable`]; retry is left
/// to the caller's next invocation.
///
/// [`incr`]: KvStore::incr
/// [`keys`]: KvStore::keys
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Read the value at `key`, or `None` if absent.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write `value` at `key`, overwriting any existing value.
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Atomically increment the integer at `key` by 1 and return the new
    /// value. An absent key is treated as 0.
    async fn incr(&self, key: &str) -> Result<i64, StoreError>;

    /// Delete `key`. Idempotent.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Enumerate all keys starting with `prefix`.
    async fn keys(&self, prefix: &str) -> Result<Vec<String>, StoreError>;
}
