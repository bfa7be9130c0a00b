//! Usage route handlers: the consumption event and the status check.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use lumly_core::{Consumption, CustomerId};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Consumption event payload.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsumeRequest {
    pub customer_id: CustomerId,
}

/// Response body for consume and status.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageResponse {
    pub allowed: bool,
    pub rate_limited: bool,
    pub used: u32,
    pub limit: u32,
    /// Present only while in cooldown with a readable marker.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_ms: Option<i64>,
}

impl UsageResponse {
    fn from_consumption(outcome: &Consumption) -> Self {
        match *outcome {
            Consumption::Allowed { used, limit, .. } => Self {
                allowed: true,
                rate_limited: false,
                used,
                limit,
                elapsed_ms: None,
            },
            Consumption::InCooldown {
                used,
                limit,
                elapsed_ms,
            } => Self {
                allowed: false,
                rate_limited: true,
                used,
                limit,
                elapsed_ms,
            },
        }
    }
}

/// Record one generation action for a customer.
///
/// Returns 200 when the action was counted, 429 with the current usage and
/// limit when the customer is in cooldown - the storefront shows an
/// accurate "try again later" message from this body.
#[instrument(skip(state), fields(customer = %payload.customer_id))]
pub async fn consume(
    State(state): State<AppState>,
    Json(payload): Json<ConsumeRequest>,
) -> Result<Response> {
    if payload.customer_id.is_blank() {
        return Err(AppError::BadRequest("customerId must not be blank".to_string()));
    }

    let outcome = state
        .limiter()
        .consume(&payload.customer_id, Utc::now())
        .await?;

    let body = UsageResponse::from_consumption(&outcome);
    let status = if body.rate_limited {
        StatusCode::TOO_MANY_REQUESTS
    } else {
        StatusCode::OK
    };

    Ok((status, Json(body)).into_response())
}

/// Current usage and cooldown status for one customer.
///
/// Pure read; unknown customers report 0 of quota used.
#[instrument(skip(state), fields(customer = %customer_id))]
pub async fn status(
    State(state): State<AppState>,
    Path(customer_id): Path<CustomerId>,
) -> Result<Json<UsageResponse>> {
    if customer_id.is_blank() {
        return Err(AppError::BadRequest("customerId must not be blank".to_string()));
    }

    let outcome = state.limiter().status(&customer_id, Utc::now()).await?;
    Ok(Json(UsageResponse::from_consumption(&outcome)))
}
