//! Cooldown sweeper: the only state transition in the system.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::instrument;

use crate::config::LimitConfig;
use crate::markers::MarkerStore;
use crate::store::{KvStore, StoreError};
use crate::types::CustomerId;
use crate::usage::UsageCounter;

/// Counts from one sweep, for observability.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepSummary {
    /// Markers enumerated.
    pub checked: usize,
    /// Customers reset (counter zeroed, marker removed).
    pub reset: usize,
    /// Entries that failed (unreadable marker, or reset/remove error).
    pub failed: usize,
}

/// Resets customers whose cooldown window has elapsed.
///
/// The sweeper has no internal timer; it is a pure function of `now` and
/// store state, triggered by an external scheduler and safe to invoke at
/// any cadence, including concurrently with itself: re-resetting an
/// already-zero counter and removing an already-removed marker are both
/// no-ops.
#[derive(Clone)]
pub struct CooldownSweeper {
    counter: UsageCounter,
    markers: MarkerStore,
    config: LimitConfig,
}

impl CooldownSweeper {
    /// Create a sweeper over the given store.
    #[must_use]
    pub fn new(store: Arc<dyn KvStore>, config: LimitConfig) -> Self {
        Self {
            counter: UsageCounter::new(Arc::clone(&store)),
            markers: MarkerStore::new(store),
            config,
        }
    }

    /// Run one sweep over all current markers.
    ///
    /// For each marker whose age at `now` has reached the cooldown: reset
    /// the counter, then remove the marker - in that order, so a failure
    /// between the two steps leaves the marker in place and the next sweep
    /// repeats the (idempotent) reset. Per-entry failures are logged and
    /// counted; they never abort the remaining entries.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] only if the marker enumeration itself fails;
    /// everything past that point fails soft into `SweepSummary::failed`.
    #[instrument(skip(self, now))]
    pub async fn sweep(&self, now: DateTime<Utc>) -> Result<SweepSummary, StoreError> {
        let entries = self.markers.list().await?;

        let mut summary = SweepSummary {
            checked: entries.len(),
            ..SweepSummary::default()
        };

        for entry in entries {
            let marker = match entry.marker {
                Ok(marker) => marker,
                Err(e) => {
                    tracing::warn!(customer = %entry.customer_id, error = %e, "Skipping unreadable marker");
                    summary.failed += 1;
                    continue;
                }
            };

            if now - marker.timestamp < self.config.cooldown {
                continue;
            }

            match self.reset_customer(&entry.customer_id).await {
                Ok(()) => {
                    tracing::info!(
                        customer = %entry.customer_id,
                        waited_ms = marker.elapsed_ms(now),
                        "Cooldown elapsed, usage reset"
                    );
                    summary.reset += 1;
                }
                Err(e) => {
                    tracing::error!(customer = %entry.customer_id, error = %e, "Reset failed");
                    summary.failed += 1;
                }
            }
        }

        Ok(summary)
    }

    /// Reset one customer: counter to 0, then marker removed.
    ///
    /// Also used for manual admin resets, where the cooldown check is
    /// deliberately skipped.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if either step fails.
    pub async fn reset_customer(&self, customer_id: &CustomerId) -> Result<(), StoreError> {
        self.counter.reset(customer_id).await?;
        self.markers.remove(customer_id).await
    }
}
