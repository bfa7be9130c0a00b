//! Bearer-secret authentication for scheduler and admin endpoints.
//!
//! The sweep trigger, queue inspection, and manual reset are called by an
//! external cron and by operators - never by storefront browsers. They
//! share one high-entropy secret, validated at startup.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use secrecy::ExposeSecret;

use crate::error::AppError;
use crate::state::AppState;

/// Middleware that rejects requests without the configured bearer secret.
///
/// Expects `Authorization: Bearer <secret>`; anything else is 401. The
/// secret is high-entropy (enforced by config validation), so an equality
/// comparison does not leak a usable timing signal.
pub async fn require_sweep_secret(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let provided = request
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(AppError::Unauthorized)?;

    if provided != state.config().sweep_secret.expose_secret() {
        tracing::warn!(path = %request.uri().path(), "Rejected request with invalid sweep secret");
        return Err(AppError::Unauthorized);
    }

    Ok(next.run(request).await)
}
