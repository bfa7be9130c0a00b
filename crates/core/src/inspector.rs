//! Read-only diagnostic view over the cooldown queue.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::instrument;

use crate::config::LimitConfig;
use crate::markers::MarkerStore;
use crate::store::{KvStore, StoreError};
use crate::types::CustomerId;

/// One customer currently in cooldown.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueEntry {
    pub customer_id: CustomerId,
    pub timestamp: DateTime<Utc>,
    pub total_used: u32,
    pub total_limit: u32,
    pub elapsed_ms: i64,
    pub ready_for_reset: bool,
}

/// Snapshot of the cooldown queue.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueReport {
    /// Readable markers, one per customer in cooldown.
    pub entries: Vec<QueueEntry>,
    /// Total readable markers.
    pub queue_length: usize,
    /// Customers the next sweep would reset.
    pub ready_for_reset: usize,
    /// Customers still inside their cooldown window.
    pub waiting_count: usize,
    /// Markers that could not be read or parsed.
    pub malformed: usize,
}

/// Pure read over the marker store; never mutates counters or markers.
///
/// Shares its [`LimitConfig`] with the sweeper, so `ready_for_reset` is an
/// exact prediction of what the next sweep will do at the same instant.
#[derive(Clone)]
pub struct QueueInspector {
    markers: MarkerStore,
    config: LimitConfig,
}

impl QueueInspector {
    /// Create an inspector over the given store.
    #[must_use]
    pub fn new(store: Arc<dyn KvStore>, config: LimitConfig) -> Self {
        Self {
            markers: MarkerStore::new(store),
            config,
        }
    }

    /// Produce a snapshot of the queue at `now`.
    ///
    /// Unreadable entries are counted under `malformed` and logged; they
    /// never abort the report.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] only if the marker enumeration itself fails.
    #[instrument(skip(self, now))]
    pub async fn inspect(&self, now: DateTime<Utc>) -> Result<QueueReport, StoreError> {
        let raw_entries = self.markers.list().await?;

        let mut entries = Vec::with_capacity(raw_entries.len());
        let mut malformed = 0;

        for entry in raw_entries {
            let marker = match entry.marker {
                Ok(marker) => marker,
                Err(e) => {
                    tracing::warn!(customer = %entry.customer_id, error = %e, "Unreadable marker in queue");
                    malformed += 1;
                    continue;
                }
            };

            entries.push(QueueEntry {
                ready_for_reset: now - marker.timestamp >= self.config.cooldown,
                elapsed_ms: marker.elapsed_ms(now),
                customer_id: entry.customer_id,
                timestamp: marker.timestamp,
                total_used: marker.total_used,
                total_limit: marker.total_limit,
            });
        }

        // Oldest first: the entries closest to reset surface at the top
        entries.sort_by_key(|e| e.timestamp);

        let ready_for_reset = entries.iter().filter(|e| e.ready_for_reset).count();
        Ok(QueueReport {
            queue_length: entries.len(),
            ready_for_reset,
            waiting_count: entries.len() - ready_for_reset,
            malformed,
            entries,
        })
    }
}
