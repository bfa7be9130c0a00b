//! Per-customer usage counter.

use std::sync::Arc;

use tracing::instrument;

use crate::store::{KvStore, StoreError};
use crate::types::CustomerId;

/// Key prefix for usage counters.
pub const COUNTER_KEY_PREFIX: &str = "generations:";

/// Per-customer count of consumed generation actions.
///
/// Unknown customers start at 0; there is no explicit "create". The counter
/// is only ever incremented by the consumption path and reset to 0 by the
/// sweeper (or a manual admin reset).
#[derive(Clone)]
pub struct UsageCounter {
    store: Arc<dyn KvStore>,
}

impl UsageCounter {
    /// Create a counter over the given store.
    #[must_use]
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// Atomically increment the customer's count and return the new value.
    ///
    /// Uses the store's atomic increment - concurrent generation requests
    /// from the same customer must not lose updates, so a read-then-write
    /// here would be a bug.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store is unavailable; the caller must
    /// not assume the increment happened.
    #[instrument(skip(self), fields(customer = %customer_id))]
    pub async fn increment(&self, customer_id: &CustomerId) -> Result<u32, StoreError> {
        let new_count = self.store.incr(&counter_key(customer_id)).await?;
        Ok(clamp_count(new_count))
    }

    /// Read the customer's current count, 0 if absent.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store is unavailable or holds a
    /// non-numeric value. Unavailability is never reported as 0.
    #[instrument(skip(self), fields(customer = %customer_id))]
    pub async fn get(&self, customer_id: &CustomerId) -> Result<u32, StoreError> {
        let key = counter_key(customer_id);
        match self.store.get(&key).await? {
            None => Ok(0),
            Some(raw) => {
                let count = raw.parse::<i64>().map_err(|e| StoreError::InvalidValue {
                    key,
                    reason: e.to_string(),
                })?;
                Ok(clamp_count(count))
            }
        }
    }

    /// Reset the customer's count to 0.
    ///
    /// Idempotent: resetting an already-zero (or absent) counter is a
    /// no-op in effect, which keeps overlapping sweeps safe.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store is unavailable.
    #[instrument(skip(self), fields(customer = %customer_id))]
    pub async fn reset(&self, customer_id: &CustomerId) -> Result<(), StoreError> {
        self.store.set(&counter_key(customer_id), "0").await
    }
}

/// Build the store key for a customer's counter.
#[must_use]
pub fn counter_key(customer_id: &CustomerId) -> String {
    format!("{COUNTER_KEY_PREFIX}{customer_id}")
}

/// Clamp a stored count into the u32 domain (negative values read as 0).
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn clamp_count(count: i64) -> u32 {
    count.clamp(0, i64::from(u32::MAX)) as u32
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn counter() -> UsageCounter {
        UsageCounter::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_unknown_customer_reads_zero() {
        let counter = counter();
        assert_eq!(counter.get(&CustomerId::new("nobody")).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_increment_is_monotonic() {
        // N increments with no reset yields N
        let counter = counter();
        let c1 = CustomerId::new("c1");
        for expected in 1..=5 {
            assert_eq!(counter.increment(&c1).await.unwrap(), expected);
        }
        assert_eq!(counter.get(&c1).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_customers_are_independent() {
        let counter = counter();
        let c1 = CustomerId::new("c1");
        let c2 = CustomerId::new("c2");

        counter.increment(&c1).await.unwrap();
        counter.increment(&c1).await.unwrap();
        counter.increment(&c2).await.unwrap();

        assert_eq!(counter.get(&c1).await.unwrap(), 2);
        assert_eq!(counter.get(&c2).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_reset_returns_to_zero() {
        let counter = counter();
        let c1 = CustomerId::new("c1");

        counter.increment(&c1).await.unwrap();
        counter.reset(&c1).await.unwrap();
        assert_eq!(counter.get(&c1).await.unwrap(), 0);

        // Counting resumes from zero afterwards
        assert_eq!(counter.increment(&c1).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_reset_absent_customer_is_noop() {
        let counter = counter();
        let ghost = CustomerId::new("ghost");
        counter.reset(&ghost).await.unwrap();
        assert_eq!(counter.get(&ghost).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_non_numeric_counter_is_invalid_value() {
        let store = Arc::new(MemoryStore::new());
        store.set("generations:c1", "four").await.unwrap();

        let counter = UsageCounter::new(store);
        let err = counter.get(&CustomerId::new("c1")).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidValue { .. }));
    }
}
