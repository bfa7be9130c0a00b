//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers return `Result<T, AppError>`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use lumly_core::{LimitError, StoreError};
use serde_json::json;
use thiserror::Error;

/// Application-level error type for the usage-limit service.
#[derive(Debug, Error)]
pub enum AppError {
    /// Key-value store operation failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Usage-limit operation failed.
    #[error("Limit error: {0}")]
    Limit(#[from] LimitError),

    /// Missing or invalid bearer secret.
    #[error("Unauthorized")]
    Unauthorized,

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether the error is a server-side failure worth a Sentry event.
    const fn is_server_failure(&self) -> bool {
        matches!(
            self,
            Self::Store(_) | Self::Limit(LimitError::Storage(_)) | Self::Internal(_)
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_failure() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = match &self {
            // 503 so the external scheduler knows to retry next cycle
            Self::Store(StoreError::Unavailable(_))
            | Self::Limit(LimitError::Storage(StoreError::Unavailable(_))) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            Self::Store(_) | Self::Limit(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        };

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Store(StoreError::Unavailable(_))
            | Self::Limit(LimitError::Storage(StoreError::Unavailable(_))) => {
                "Storage unavailable".to_string()
            }
            // Data-integrity failures are not an availability problem
            Self::Store(_) | Self::Limit(_) | Self::Internal(_) => {
                "Internal server error".to_string()
            }
            Self::Unauthorized => "Unauthorized".to_string(),
            Self::BadRequest(msg) => msg.clone(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    async fn body_message(err: AppError) -> String {
        let response = err.into_response();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        value["error"].as_str().unwrap().to_string()
    }

    #[test]
    fn test_store_unavailable_is_503() {
        assert_eq!(
            get_status(AppError::Store(StoreError::Unavailable(
                "connection refused".to_string()
            ))),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_invalid_value_is_500() {
        assert_eq!(
            get_status(AppError::Store(StoreError::InvalidValue {
                key: "generations:c1".to_string(),
                reason: "not a number".to_string(),
            })),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_corrupt_value_is_not_reported_as_unavailable() {
        let unavailable = AppError::Store(StoreError::Unavailable("timeout".to_string()));
        assert_eq!(body_message(unavailable).await, "Storage unavailable");

        // A corrupt counter is an integrity problem, not an outage
        let corrupt = AppError::Store(StoreError::InvalidValue {
            key: "generations:c1".to_string(),
            reason: "not a number".to_string(),
        });
        assert_eq!(body_message(corrupt).await, "Internal server error");
    }

    #[test]
    fn test_auth_and_input_statuses() {
        assert_eq!(get_status(AppError::Unauthorized), StatusCode::UNAUTHORIZED);
        assert_eq!(
            get_status(AppError::BadRequest("missing customerId".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Internal("boom".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
