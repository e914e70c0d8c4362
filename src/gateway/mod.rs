use reqwest::Url;

use crate::{
    config::MidtransConfig,
    gateway::{error::GatewayError, interaction::ProviderCall},
};

mod auth;
/// Midtrans webhook payload
pub mod callback;
pub mod error;
mod interaction;
/// Requisite masking
pub mod mask;
/// Snap (hosted checkout) transaction creation
pub mod snap;
/// Core API transaction status
mod status;

pub type Result<T> = std::result::Result<T, GatewayError>;

/// The two provider capabilities the relay depends on.
#[async_trait::async_trait]
pub trait PaymentProvider: std::fmt::Debug + Send + Sync {
    /// Open a hosted checkout session
    async fn create_transaction(
        &self,
        request: &snap::SnapTransactionRequest,
    ) -> Result<snap::SnapTransaction>;

    /// Fetch the provider's status object for `order_id`.
    ///
    /// A missing transaction is reported as an error for which
    /// [`GatewayError::is_not_found`] holds.
    async fn transaction_status(&self, order_id: &str) -> Result<serde_json::Value>;
}

#[derive(Debug, Clone)]
pub struct MidtransGateway {
    client: reqwest::Client,
    server_key: String,
    snap_base_url: Url,
    core_base_url: Url,
}

impl MidtransGateway {
    const SANDBOX_SNAP_URL: &str = "https://app.sandbox.midtrans.com";
    const SANDBOX_CORE_URL: &str = "https://api.sandbox.midtrans.com";
    const PRODUCTION_SNAP_URL: &str = "https://app.midtrans.com";
    const PRODUCTION_CORE_URL: &str = "https://api.midtrans.com";

    pub fn new(config: &MidtransConfig) -> anyhow::Result<Self> {
        let (snap_default, core_default) = if config.is_production {
            (Self::PRODUCTION_SNAP_URL, Self::PRODUCTION_CORE_URL)
        } else {
            (Self::SANDBOX_SNAP_URL, Self::SANDBOX_CORE_URL)
        };
        let snap_base_url = parse_base_url(config.snap_base_url.as_deref().unwrap_or(snap_default))?;
        let core_base_url = parse_base_url(config.core_base_url.as_deref().unwrap_or(core_default))?;

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        tracing::debug!(%snap_base_url, %core_base_url, production = config.is_production, "Configured Midtrans client");
        Ok(Self {
            client,
            server_key: config.server_key.clone(),
            snap_base_url,
            core_base_url,
        })
    }

    /// Build `{base}/{segments...}`, percent-encoding every segment.
    fn endpoint(base: &Url, segments: &[&str]) -> Url {
        let mut url = base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Send a request to Midtrans and classify the answer.
    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        call: &mut ProviderCall,
    ) -> Result<serde_json::Value> {
        let res = request
            .headers(auth::authenticated_headers(&self.server_key))
            .send()
            .await?;
        let status = res.status();
        call.set_response_status(status.as_u16());
        let text = res.text().await?;

        if !status.is_success() {
            let body = serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text));
            tracing::debug!(data = %mask::secure_value(&body), %status, "Midtrans API error response");
            return Err(GatewayError::api(status.as_u16(), &body));
        }

        let body: serde_json::Value = serde_json::from_str(&text)?;
        tracing::debug!(data = %mask::secure_value(&body), %status, "Midtrans API response");
        if let Some(code) = error::body_status_code(&body) {
            return Err(GatewayError::api(code, &body));
        }
        Ok(body)
    }

    async fn call(
        &self,
        kind: &'static str,
        request: reqwest::RequestBuilder,
        url: &Url,
    ) -> Result<serde_json::Value> {
        let mut call = ProviderCall::enter(kind, url.as_str());
        let result = self.send(request, &mut call).await;
        call.finish();
        result
    }
}

fn parse_base_url(raw: &str) -> anyhow::Result<Url> {
    let url = Url::parse(raw).map_err(|e| anyhow::anyhow!("invalid Midtrans base url {raw:?}: {e}"))?;
    anyhow::ensure!(!url.cannot_be_a_base(), "Midtrans base url {raw:?} cannot be a base");
    Ok(url)
}

#[async_trait::async_trait]
impl PaymentProvider for MidtransGateway {
    async fn create_transaction(
        &self,
        request: &snap::SnapTransactionRequest,
    ) -> Result<snap::SnapTransaction> {
        self.snap_transaction(request).await
    }

    async fn transaction_status(&self, order_id: &str) -> Result<serde_json::Value> {
        self.status(order_id).await
    }
}
