//! Limit-reached marker store.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::instrument;

use crate::marker::{LimitError, LimitMarker, MARKER_KEY_PREFIX, customer_from_key, marker_key};
use crate::store::{KvStore, StoreError};
use crate::types::CustomerId;

/// One enumerated marker entry.
///
/// The per-entry result carries either the parsed marker or that entry's
/// own failure (unreadable or malformed), so batch callers can fail soft:
/// one bad record never aborts the rest of the enumeration.
pub struct MarkerEntry {
    pub customer_id: CustomerId,
    pub marker: Result<LimitMarker, LimitError>,
}

/// Store of timestamped "customer hit the limit" records.
///
/// One record per customer at `limit-reached:<customerId>`; existence of a
/// record means the customer is currently in cooldown.
#[derive(Clone)]
pub struct MarkerStore {
    store: Arc<dyn KvStore>,
}

impl MarkerStore {
    /// Create a marker store over the given key-value store.
    #[must_use]
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// Record that a customer hit the limit, stamped with the given
    /// wall-clock time. Overwrites any existing marker (last-write-wins).
    ///
    /// # Errors
    ///
    /// Returns [`LimitError::Storage`] if the write fails.
    #[instrument(skip(self, now), fields(customer = %customer_id, used = used_count))]
    pub async fn mark_reached(
        &self,
        customer_id: &CustomerId,
        used_count: u32,
        limit: u32,
        now: DateTime<Utc>,
    ) -> Result<(), LimitError> {
        let marker = LimitMarker::new(now, used_count, limit);
        let json = marker.to_json(customer_id)?;
        self.store.set(&marker_key(customer_id), &json).await?;
        tracing::info!(customer = %customer_id, used = used_count, limit, "Customer entered cooldown");
        Ok(())
    }

    /// Whether a marker currently exists for the customer.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the read fails - unavailability must not
    /// be mistaken for "not in cooldown".
    pub async fn exists(&self, customer_id: &CustomerId) -> Result<bool, StoreError> {
        Ok(self.store.get(&marker_key(customer_id)).await?.is_some())
    }

    /// Read and parse the customer's marker, `None` if absent.
    ///
    /// # Errors
    ///
    /// Returns [`LimitError::Storage`] on read failure or
    /// [`LimitError::MalformedMarker`] if the stored value fails to parse.
    pub async fn get(&self, customer_id: &CustomerId) -> Result<Option<LimitMarker>, LimitError> {
        match self.store.get(&marker_key(customer_id)).await? {
            None => Ok(None),
            Some(raw) => Ok(Some(LimitMarker::parse(customer_id, &raw)?)),
        }
    }

    /// Enumerate all current markers.
    ///
    /// Reflects store state at call time. Each entry carries its own
    /// parse/read result; an entry whose key vanished between enumeration
    /// and read (a concurrent sweep got there first) is skipped.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] only if the key enumeration itself fails.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<MarkerEntry>, StoreError> {
        let keys = self.store.keys(MARKER_KEY_PREFIX).await?;

        let mut entries = Vec::with_capacity(keys.len());
        for key in keys {
            let Some(customer_id) = customer_from_key(&key) else {
                continue;
            };
            match self.store.get(&key).await {
                Ok(None) => {} // removed concurrently
                Ok(Some(raw)) => entries.push(MarkerEntry {
                    marker: LimitMarker::parse(&customer_id, &raw),
                    customer_id,
                }),
                Err(e) => entries.push(MarkerEntry {
                    customer_id,
                    marker: Err(e.into()),
                }),
            }
        }
        Ok(entries)
    }

    /// Delete the customer's marker. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the delete fails.
    #[instrument(skip(self), fields(customer = %customer_id))]
    pub async fn remove(&self, customer_id: &CustomerId) -> Result<(), StoreError> {
        self.store.delete(&marker_key(customer_id)).await
    }
}
