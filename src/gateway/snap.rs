use serde::{Deserialize, Serialize};

use crate::gateway::{MidtransGateway, Result, mask};

/// Snap `POST /snap/v1/transactions` parameter object
#[derive(Debug, Clone, Serialize)]
pub struct SnapTransactionRequest {
    pub transaction_details: TransactionDetails,
    pub customer_details: CustomerDetails,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled_payments: Option<Vec<PaymentChannel>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credit_card: Option<CreditCard>,
}

/// Order reference and amount. Both are forwarded as the caller sent them,
/// Midtrans does the type and range checks.
#[derive(Debug, Clone, Serialize)]
pub struct TransactionDetails {
    pub order_id: serde_json::Value,
    pub gross_amount: serde_json::Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct CustomerDetails {
    pub first_name: serde_json::Value,
    pub email: serde_json::Value,
    pub phone: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentChannel {
    CreditCard,
    BcaVa,
    BniVa,
    BriVa,
    PermataVa,
    OtherVa,
    Gopay,
    Shopeepay,
    Qris,
}

impl PaymentChannel {
    /// Channels offered on the hosted checkout page
    pub const CHECKOUT: [PaymentChannel; 9] = [
        PaymentChannel::CreditCard,
        PaymentChannel::BcaVa,
        PaymentChannel::BniVa,
        PaymentChannel::BriVa,
        PaymentChannel::PermataVa,
        PaymentChannel::OtherVa,
        PaymentChannel::Gopay,
        PaymentChannel::Shopeepay,
        PaymentChannel::Qris,
    ];
}

#[derive(Debug, Clone, Serialize)]
pub struct CreditCard {
    /// Force 3DS
    pub secure: bool,
    /// Acquiring bank
    pub bank: &'static str,
    pub save_card: bool,
}

impl Default for CreditCard {
    fn default() -> Self {
        Self {
            secure: true,
            bank: "bca",
            save_card: false,
        }
    }
}

impl SnapTransactionRequest {
    /// Minimal parameter object: order and customer only
    pub fn new(transaction_details: TransactionDetails, customer_details: CustomerDetails) -> Self {
        Self {
            transaction_details,
            customer_details,
            enabled_payments: None,
            credit_card: None,
        }
    }

    /// Restrict checkout to [`PaymentChannel::CHECKOUT`] and attach the card settings.
    pub fn with_checkout_channels(mut self) -> Self {
        self.enabled_payments = Some(PaymentChannel::CHECKOUT.to_vec());
        self.credit_card = Some(CreditCard::default());
        self
    }
}

/// Hosted checkout session. Midtrans returns more fields, only these are kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapTransaction {
    pub token: String,
    pub redirect_url: String,
}

impl MidtransGateway {
    pub async fn snap_transaction(
        &self,
        request: &SnapTransactionRequest,
    ) -> Result<SnapTransaction> {
        let url = Self::endpoint(&self.snap_base_url, &["snap", "v1", "transactions"]);
        tracing::debug!(%url, data = %mask::secure_serializable(request), "Snap create transaction request");
        let builder = self.client.post(url.clone()).json(request);
        let response = self.call("snap.create_transaction", builder, &url).await?;
        Ok(serde_json::from_value(response)?)
    }
}
