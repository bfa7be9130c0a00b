//! Limit-reached marker record and limit-layer errors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::store::StoreError;
use crate::types::CustomerId;

/// Key prefix for limit-reached markers.
pub const MARKER_KEY_PREFIX: &str = "limit-reached:";

/// Errors from the usage-limit layer.
#[derive(Debug, Error)]
pub enum LimitError {
    /// The underlying key-value store failed.
    #[error(transparent)]
    Storage(#[from] StoreError),

    /// A stored marker failed to parse.
    ///
    /// Data-integrity anomaly: batch operations skip the entry and count
    /// it separately instead of aborting.
    #[error("malformed marker for customer {customer_id}: {reason}")]
    MalformedMarker {
        customer_id: CustomerId,
        reason: String,
    },
}

/// A timestamped record indicating a customer is currently in cooldown.
///
/// Stored as JSON at `limit-reached:<customerId>`. A marker exists for a
/// customer if and only if that customer has hit the quota and has not yet
/// been reset; at most one marker per customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LimitMarker {
    /// Wall-clock time the customer hit the quota (ISO-8601).
    pub timestamp: DateTime<Utc>,
    /// Usage count observed when the limit was reached.
    pub total_used: u32,
    /// The quota in force when the limit was reached.
    pub total_limit: u32,
}

impl LimitMarker {
    /// Create a marker stamped with the given wall-clock time.
    #[must_use]
    pub const fn new(timestamp: DateTime<Utc>, total_used: u32, total_limit: u32) -> Self {
        Self {
            timestamp,
            total_used,
            total_limit,
        }
    }

    /// Parse a raw store value into a marker.
    ///
    /// This is the only path from untyped store blobs into the typed
    /// record; nothing downstream ever sees raw JSON.
    ///
    /// # Errors
    ///
    /// Returns [`LimitError::MalformedMarker`] if the value is not valid
    /// JSON or is missing required fields.
    pub fn parse(customer_id: &CustomerId, raw: &str) -> Result<Self, LimitError> {
        serde_json::from_str(raw).map_err(|e| LimitError::MalformedMarker {
            customer_id: customer_id.clone(),
            reason: e.to_string(),
        })
    }

    /// Serialize the marker for storage.
    ///
    /// # Errors
    ///
    /// Returns [`LimitError::MalformedMarker`] if serialization fails
    /// (practically unreachable for this record shape).
    pub fn to_json(&self, customer_id: &CustomerId) -> Result<String, LimitError> {
        serde_json::to_string(self).map_err(|e| LimitError::MalformedMarker {
            customer_id: customer_id.clone(),
            reason: e.to_string(),
        })
    }

    /// Milliseconds elapsed since the marker was written, clamped at 0.
    #[must_use]
    pub fn elapsed_ms(&self, now: DateTime<Utc>) -> i64 {
        (now - self.timestamp).num_milliseconds().max(0)
    }
}

/// Build the store key for a customer's marker.
#[must_use]
pub fn marker_key(customer_id: &CustomerId) -> String {
    format!("{MARKER_KEY_PREFIX}{customer_id}")
}

/// Extract the customer id from a marker store key.
///
/// Returns `None` for keys outside the marker namespace.
#[must_use]
pub fn customer_from_key(key: &str) -> Option<CustomerId> {
    key.strip_prefix(MARKER_KEY_PREFIX)
        .map(CustomerId::from)
}
