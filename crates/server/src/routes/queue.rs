//! Cooldown-queue route handlers: sweep trigger, inspection, manual reset.

use axum::{
    Json,
    extract::{Path, State},
};
use chrono::Utc;
use lumly_core::{CustomerId, QueueReport, SweepSummary};
use serde_json::{Value, json};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Run one sweep over the cooldown queue.
///
/// Triggered by the external scheduler (observed cadence: every 20
/// minutes) and safe to invoke manually or concurrently - duplicate
/// sweeps are no-ops.
#[instrument(skip(state))]
pub async fn sweep(State(state): State<AppState>) -> Result<Json<SweepSummary>> {
    let summary = state.sweeper().sweep(Utc::now()).await?;
    tracing::info!(
        checked = summary.checked,
        reset = summary.reset,
        failed = summary.failed,
        "Sweep complete"
    );
    Ok(Json(summary))
}

/// Inspect the cooldown queue without mutating anything.
#[instrument(skip(state))]
pub async fn inspect(State(state): State<AppState>) -> Result<Json<QueueReport>> {
    let report = state.inspector().inspect(Utc::now()).await?;
    Ok(Json(report))
}

/// Manually reset one customer: counter to 0, marker removed.
///
/// Operator escape hatch for support cases; skips the cooldown check.
#[instrument(skip(state), fields(customer = %customer_id))]
pub async fn reset(
    State(state): State<AppState>,
    Path(customer_id): Path<CustomerId>,
) -> Result<Json<Value>> {
    if customer_id.is_blank() {
        return Err(AppError::BadRequest("customerId must not be blank".to_string()));
    }

    state.sweeper().reset_customer(&customer_id).await?;
    tracing::info!(customer = %customer_id, "Manual usage reset");
    Ok(Json(json!({ "reset": true, "customerId": customer_id })))
}
