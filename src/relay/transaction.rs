use serde::Deserialize;

use crate::{
    gateway::snap::{CustomerDetails, SnapTransactionRequest, TransactionDetails},
    relay::{ApiError, truthy},
};

const FALLBACK_EMAIL: &str = "customer@example.com";
const FALLBACK_PHONE: &str = "081234567890";

/// Storefront `POST /create-transaction` body.
///
/// Fields stay untyped so whatever the storefront sends reaches Midtrans unchanged.
#[derive(Debug, Default, Deserialize)]
pub struct CreateTransactionRequest {
    #[serde(default)]
    pub order_id: Option<serde_json::Value>,
    #[serde(default)]
    pub gross_amount: Option<serde_json::Value>,
    #[serde(default)]
    pub customer: Option<Customer>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Customer {
    #[serde(default)]
    pub name: Option<serde_json::Value>,
    #[serde(default)]
    pub email: Option<serde_json::Value>,
    #[serde(default)]
    pub phone: Option<serde_json::Value>,
}

impl TryFrom<CreateTransactionRequest> for SnapTransactionRequest {
    type Error = ApiError;

    fn try_from(
        CreateTransactionRequest {
            order_id,
            gross_amount,
            customer,
        }: CreateTransactionRequest,
    ) -> Result<Self, Self::Error> {
        let customer = customer.unwrap_or_default();
        let (Some(order_id), Some(gross_amount), Some(first_name)) = (
            truthy(order_id),
            truthy(gross_amount),
            truthy(customer.name),
        ) else {
            return Err(ApiError::InvalidPayload);
        };

        let transaction_details = TransactionDetails {
            order_id,
            gross_amount,
        };
        let customer_details = CustomerDetails {
            first_name,
            email: truthy(customer.email).unwrap_or_else(|| FALLBACK_EMAIL.into()),
            phone: truthy(customer.phone).unwrap_or_else(|| FALLBACK_PHONE.into()),
        };
        Ok(SnapTransactionRequest::new(transaction_details, customer_details).with_checkout_channels())
    }
}
