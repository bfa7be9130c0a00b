//! Consumption-path orchestration: counter increment and threshold check.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::instrument;

use crate::config::LimitConfig;
use crate::marker::LimitError;
use crate::markers::MarkerStore;
use crate::store::KvStore;
use crate::types::CustomerId;
use crate::usage::UsageCounter;

/// Outcome of a consumption event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Consumption {
    /// The action was allowed and counted.
    ///
    /// `limit_reached` is true when this consumption exhausted the quota;
    /// the customer is now in cooldown for subsequent requests.
    Allowed {
        used: u32,
        limit: u32,
        limit_reached: bool,
    },

    /// The customer is in cooldown; nothing was counted.
    ///
    /// Carries enough detail for the calling surface to show an accurate
    /// "try again later" message rather than a generic failure.
    InCooldown {
        used: u32,
        limit: u32,
        /// Time since the limit was hit. `None` when the stored marker was
        /// unreadable - the customer is still in cooldown (the marker
        /// exists), we just cannot say for how long.
        elapsed_ms: Option<i64>,
    },
}

/// Quota enforcement for the consumption path.
///
/// Combines the [`UsageCounter`] and [`MarkerStore`]: each consumption
/// event increments the counter, and the increment that first reaches the
/// quota writes the limit-reached marker.
#[derive(Clone)]
pub struct UsageLimiter {
    counter: UsageCounter,
    markers: MarkerStore,
    config: LimitConfig,
}

impl UsageLimiter {
    /// Create a limiter over the given store.
    #[must_use]
    pub fn new(store: Arc<dyn KvStore>, config: LimitConfig) -> Self {
        Self {
            counter: UsageCounter::new(Arc::clone(&store)),
            markers: MarkerStore::new(store),
            config,
        }
    }

    /// Handle one consumption event for a customer.
    ///
    /// If the customer is in cooldown the event is rejected without
    /// touching the counter. Otherwise the counter is incremented
    /// atomically, and if the new count reaches the quota a marker stamped
    /// with `now` is written.
    ///
    /// # Errors
    ///
    /// Store failures on this path are hard failures - the caller must not
    /// assume the action was counted.
    #[instrument(skip(self, now), fields(customer = %customer_id))]
    pub async fn consume(
        &self,
        customer_id: &CustomerId,
        now: DateTime<Utc>,
    ) -> Result<Consumption, LimitError> {
        // Marker existence, not counter value, decides cooldown: the counter
        // may legitimately sit at the quota after a sweep raced this call.
        match self.markers.get(customer_id).await {
            Ok(Some(marker)) => {
                return Ok(Consumption::InCooldown {
                    used: marker.total_used,
                    limit: marker.total_limit,
                    elapsed_ms: Some(marker.elapsed_ms(now)),
                });
            }
            Ok(None) => {}
            Err(LimitError::MalformedMarker { customer_id, reason }) => {
                // An unreadable marker still means "in cooldown"; the next
                // sweep will count and eventually clear it.
                tracing::warn!(customer = %customer_id, reason = %reason, "Marker unreadable on consume path");
                let used = self.counter.get(&customer_id).await?;
                return Ok(Consumption::InCooldown {
                    used,
                    limit: self.config.quota,
                    elapsed_ms: None,
                });
            }
            Err(e @ LimitError::Storage(_)) => return Err(e),
        }

        let used = self.counter.increment(customer_id).await?;

        let limit_reached = used >= self.config.quota;
        if limit_reached {
            self.markers
                .mark_reached(customer_id, used, self.config.quota, now)
                .await?;
        }

        Ok(Consumption::Allowed {
            used,
            limit: self.config.quota,
            limit_reached,
        })
    }

    /// Read-only view of a customer's current standing.
    ///
    /// # Errors
    ///
    /// Returns [`LimitError`] if the counter or marker cannot be read.
    #[instrument(skip(self, now), fields(customer = %customer_id))]
    pub async fn status(
        &self,
        customer_id: &CustomerId,
        now: DateTime<Utc>,
    ) -> Result<Consumption, LimitError> {
        if let Some(marker) = self.markers.get(customer_id).await? {
            return Ok(Consumption::InCooldown {
                used: marker.total_used,
                limit: marker.total_limit,
                elapsed_ms: Some(marker.elapsed_ms(now)),
            });
        }

        let used = self.counter.get(customer_id).await?;
        Ok(Consumption::Allowed {
            used,
            limit: self.config.quota,
            limit_reached: false,
        })
    }

    /// The quota/cooldown configuration this limiter enforces.
    #[must_use]
    pub const fn config(&self) -> &LimitConfig {
        &self.config
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn limiter(store: &Arc<MemoryStore>) -> UsageLimiter {
        UsageLimiter::new(
            Arc::clone(store) as Arc<dyn KvStore>,
            LimitConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_consumption_below_quota_is_allowed() {
        let store = Arc::new(MemoryStore::new());
        let limiter = limiter(&store);
        let c1 = CustomerId::new("c1");

        for expected in 1..4 {
            let outcome = limiter.consume(&c1, Utc::now()).await.unwrap();
            assert_eq!(
                outcome,
                Consumption::Allowed {
                    used: expected,
                    limit: 4,
                    limit_reached: false,
                }
            );
        }

        // No marker yet below the quota
        let markers = MarkerStore::new(store as Arc<dyn KvStore>);
        assert!(!markers.exists(&c1).await.unwrap());
    }

    #[tokio::test]
    async fn test_fourth_consumption_writes_marker() {
        // 4 events with quota 4 -> marker with totalUsed = 4
        let store = Arc::new(MemoryStore::new());
        let limiter = limiter(&store);
        let c1 = CustomerId::new("c1");
        let now = Utc::now();

        for _ in 0..3 {
            limiter.consume(&c1, now).await.unwrap();
        }
        let outcome = limiter.consume(&c1, now).await.unwrap();
        assert_eq!(
            outcome,
            Consumption::Allowed {
                used: 4,
                limit: 4,
                limit_reached: true,
            }
        );

        let markers = MarkerStore::new(store as Arc<dyn KvStore>);
        let marker = markers.get(&c1).await.unwrap().unwrap();
        assert_eq!(marker.total_used, 4);
        assert_eq!(marker.total_limit, 4);
        assert_eq!(marker.timestamp, now);
    }

    #[tokio::test]
    async fn test_consumption_in_cooldown_is_rejected() {
        let store = Arc::new(MemoryStore::new());
        let limiter = limiter(&store);
        let c1 = CustomerId::new("c1");
        let hit_at = Utc::now();

        for _ in 0..4 {
            limiter.consume(&c1, hit_at).await.unwrap();
        }

        let later = hit_at + chrono::Duration::minutes(10);
        let outcome = limiter.consume(&c1, later).await.unwrap();
        assert_eq!(
            outcome,
            Consumption::InCooldown {
                used: 4,
                limit: 4,
                elapsed_ms: Some(600_000),
            }
        );

        // The rejected attempt must not have advanced the counter
        let counter = UsageCounter::new(store as Arc<dyn KvStore>);
        assert_eq!(counter.get(&c1).await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_rejection_does_not_refresh_marker_timestamp() {
        let store = Arc::new(MemoryStore::new());
        let limiter = limiter(&store);
        let c1 = CustomerId::new("c1");
        let hit_at = Utc::now();

        for _ in 0..4 {
            limiter.consume(&c1, hit_at).await.unwrap();
        }
        limiter
            .consume(&c1, hit_at + chrono::Duration::minutes(30))
            .await
            .unwrap();

        let markers = MarkerStore::new(store as Arc<dyn KvStore>);
        let marker = markers.get(&c1).await.unwrap().unwrap();
        assert_eq!(marker.timestamp, hit_at);
    }

    #[tokio::test]
    async fn test_malformed_marker_still_blocks() {
        let store = Arc::new(MemoryStore::new());
        store.set("limit-reached:c1", "{oops").await.unwrap();
        store.set("generations:c1", "4").await.unwrap();

        let limiter = limiter(&store);
        let outcome = limiter
            .consume(&CustomerId::new("c1"), Utc::now())
            .await
            .unwrap();
        assert_eq!(
            outcome,
            Consumption::InCooldown {
                used: 4,
                limit: 4,
                elapsed_ms: None,
            }
        );
    }

    #[tokio::test]
    async fn test_status_never_mutates() {
        let store = Arc::new(MemoryStore::new());
        let limiter = limiter(&store);
        let c1 = CustomerId::new("c1");

        limiter.consume(&c1, Utc::now()).await.unwrap();
        let before = limiter.status(&c1, Utc::now()).await.unwrap();
        let after = limiter.status(&c1, Utc::now()).await.unwrap();

        assert_eq!(before, after);
        assert_eq!(
            before,
            Consumption::Allowed {
                used: 1,
                limit: 4,
                limit_reached: false,
            }
        );
    }
}
