use std::fmt::Display;

use axum::response::IntoResponse;
use reqwest::StatusCode;
use serde::Serialize;
use serde_json::json;

use crate::gateway::error::GatewayError;

pub mod api;
pub mod status;
pub mod transaction;

pub type Result<T> = std::result::Result<T, ApiError>;

pub const CREATE_FAILED: &str = "transaction creation failed";
pub const STATUS_FAILED: &str = "status check failed";
pub const NOTIFICATION_FAILED: &str = "error processing notification";

#[derive(Debug)]
pub enum ApiError {
    /// Required transaction fields are absent or falsy
    InvalidPayload,
    MissingField(&'static str),
    /// Midtrans has no transaction for this order id
    ProviderNotFound { order_id: serde_json::Value },
    ProviderError {
        message: &'static str,
        error: String,
    },
}

impl ApiError {
    pub fn provider(message: &'static str, error: impl Display) -> Self {
        Self::ProviderError {
            message,
            error: error.to_string(),
        }
    }

    /// Map a failed status lookup, keeping "not found" apart from other failures.
    pub fn status_lookup(order_id: serde_json::Value, error: GatewayError) -> Self {
        if error.is_not_found() {
            Self::ProviderNotFound { order_id }
        } else {
            Self::provider(STATUS_FAILED, error)
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidPayload | ApiError::MissingField(_) => StatusCode::BAD_REQUEST,
            ApiError::ProviderNotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::ProviderError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl std::error::Error for ApiError {}

impl Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::InvalidPayload => f.write_str("incomplete payload"),
            ApiError::MissingField(field) => write!(f, "{field} is required"),
            ApiError::ProviderNotFound { .. } => f.write_str("transaction not found"),
            ApiError::ProviderError { message, error } => write!(f, "{message}: {error}"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        let body = match &self {
            ApiError::InvalidPayload | ApiError::MissingField(_) => {
                json!({ "message": self.to_string() })
            }
            ApiError::ProviderNotFound { order_id } => json!({
                "message": "transaction not found",
                "transaction_status": "not_found",
                "order_id": order_id,
            }),
            ApiError::ProviderError { message, error } => json!({
                "message": message,
                "error": error,
            }),
        };
        tracing::debug!(%status, data = %body, "Relay error response payload");
        (status, axum::Json(body)).into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// JavaScript-style truthiness, the presence rule storefront clients are written against.
pub fn is_truthy(value: &serde_json::Value) -> bool {
    use serde_json::Value;

    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// `Some(value)` when the field is present and truthy
pub fn truthy(value: Option<serde_json::Value>) -> Option<serde_json::Value> {
    value.filter(is_truthy)
}
