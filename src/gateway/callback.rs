use serde::{Deserialize, Serialize};

/// HTTP notification Midtrans posts on every transaction state change.
///
/// Only the fields the relay reads are kept, and none of them is type-checked:
/// the status is fetched again from the Core API anyway.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct NotificationPayload {
    #[serde(default)]
    pub order_id: Option<serde_json::Value>,
    #[serde(default)]
    pub transaction_status: Option<serde_json::Value>,
    #[serde(default)]
    pub fraud_status: Option<serde_json::Value>,
}
