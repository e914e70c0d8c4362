use serde::Deserialize;

/// Storefront `POST /check-status` body
#[derive(Debug, Default, Deserialize)]
pub struct CheckStatusRequest {
    #[serde(default, rename = "orderId")]
    pub order_id: Option<serde_json::Value>,
}

/// Order id as it goes into the Midtrans URL. Non-string ids are sent in
/// their JSON text form.
pub fn order_id_segment(order_id: &serde_json::Value) -> String {
    match order_id {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
