use crate::gateway::{MidtransGateway, Result};

impl MidtransGateway {
    /// `GET /v2/{order_id}/status` on the Core API. The body is returned as is.
    pub async fn status(&self, order_id: &str) -> Result<serde_json::Value> {
        let url = Self::endpoint(&self.core_base_url, &["v2", order_id, "status"]);
        tracing::debug!(%url, "Core API status request");
        let builder = self.client.get(url.clone());
        self.call("core.transaction_status", builder, &url).await
    }
}
