//! HTTP route handlers for the usage-limit service.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                     - Liveness check
//! GET  /health/ready               - Readiness check (store round-trip)
//!
//! # Usage (called by the storefront)
//! POST /api/usage/consume          - Record a generation action
//! GET  /api/usage/{customer_id}    - Current usage and cooldown status
//!
//! # Cooldown queue (scheduler/admin, bearer secret required)
//! POST /api/queue/sweep            - Reset customers whose cooldown elapsed
//! GET  /api/queue                  - Inspect the cooldown queue
//! POST /api/queue/{customer_id}/reset - Manually reset one customer
//! ```

pub mod queue;
pub mod usage;

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::middleware::require_sweep_secret;
use crate::state::AppState;

/// Build the application router.
pub fn routes(state: &AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/api/queue/sweep", post(queue::sweep))
        .route("/api/queue", get(queue::inspect))
        .route("/api/queue/{customer_id}/reset", post(queue::reset))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_sweep_secret,
        ));

    Router::new()
        .route("/api/usage/consume", post(usage::consume))
        .route("/api/usage/{customer_id}", get(usage::status))
        .merge(protected)
}
