use std::fmt::Display;

use serde::de::Error;

/// Body-level status code Midtrans uses for an expired transaction. It is a
/// transaction state, not a failed call.
const EXPIRED_STATUS_CODE: u16 = 407;

#[derive(Debug)]
pub enum GatewayError {
    RequestError(reqwest::Error),
    /// Midtrans answered, but with an error status (HTTP or body `status_code`)
    Api { status_code: u16, body: String },
    GatewayDeserialization(serde_json::Error),
}

impl GatewayError {
    pub fn api(status_code: u16, body: &serde_json::Value) -> Self {
        Self::Api {
            status_code,
            body: body.to_string(),
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            GatewayError::Api { status_code, .. } => Some(*status_code),
            GatewayError::RequestError(e) => e.status().map(|s| s.as_u16()),
            GatewayError::GatewayDeserialization(_) => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status_code() == Some(404)
    }
}

/// Extract the failure code Midtrans reports inside a successful HTTP response.
///
/// The Core API returns `status_code` as a string (`"404"`), the Snap API does
/// not return it at all.
pub fn body_status_code(body: &serde_json::Value) -> Option<u16> {
    let code = match body.get("status_code")? {
        serde_json::Value::String(s) => s.trim().parse().ok()?,
        serde_json::Value::Number(n) => u16::try_from(n.as_u64()?).ok()?,
        _ => return None,
    };
    (code >= 400 && code != EXPIRED_STATUS_CODE).then_some(code)
}

impl From<reqwest::Error> for GatewayError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_decode() {
            return Self::GatewayDeserialization(serde_json::Error::custom(
                "failed to decode response body",
            ));
        }
        Self::RequestError(value)
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(value: serde_json::Error) -> Self {
        Self::GatewayDeserialization(value)
    }
}

impl std::error::Error for GatewayError {}

impl Display for GatewayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GatewayError::RequestError(e) => write!(f, "http request error: {e}"),
            GatewayError::Api { status_code, body } => write!(
                f,
                "Midtrans API is returning API error. HTTP status code: {status_code}. API response: {body}"
            ),
            GatewayError::GatewayDeserialization(e) => {
                write!(f, "gateway response deserialization: {e}")
            }
        }
    }
}
