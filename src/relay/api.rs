use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::{get, post},
};
use serde::de::DeserializeOwned;
use tracing::instrument;

use crate::{
    gateway::{
        PaymentProvider,
        callback::NotificationPayload,
        mask,
        snap::{SnapTransaction, SnapTransactionRequest},
    },
    relay::{
        ApiError, CREATE_FAILED, MessageResponse, NOTIFICATION_FAILED, Result,
        status::{CheckStatusRequest, order_id_segment},
        transaction::CreateTransactionRequest,
        truthy,
    },
    state::AppState,
};

pub const HEALTH_BODY: &str = "Midtrans Backend OK";

pub async fn health() -> &'static str {
    HEALTH_BODY
}

#[instrument(skip_all)]
pub async fn create_transaction(
    State(gateway): State<Arc<dyn PaymentProvider>>,
    Json(request): Json<CreateTransactionRequest>,
) -> Result<axum::Json<SnapTransaction>> {
    let params = SnapTransactionRequest::try_from(request)?;
    tracing::info!(data = %mask::secure_serializable(&params), "Creating transaction");

    match gateway.create_transaction(&params).await {
        Ok(transaction) => {
            tracing::info!(
                token = %transaction.token,
                redirect_url = %transaction.redirect_url,
                "Transaction created"
            );
            Ok(axum::Json(transaction))
        }
        Err(e) => {
            tracing::error!("Failed to create transaction: {e}");
            Err(ApiError::provider(CREATE_FAILED, e))
        }
    }
}

async fn lookup_status(
    gateway: &dyn PaymentProvider,
    order_id: serde_json::Value,
) -> Result<axum::Json<serde_json::Value>> {
    match gateway.transaction_status(&order_id_segment(&order_id)).await {
        Ok(status) => {
            tracing::debug!(data = %mask::secure_value(&status), "Transaction status");
            Ok(axum::Json(status))
        }
        Err(e) => {
            if e.is_not_found() {
                tracing::info!(%order_id, "Transaction not found");
            } else {
                tracing::error!(%order_id, "Failed to fetch transaction status: {e}");
            }
            Err(ApiError::status_lookup(order_id, e))
        }
    }
}

#[instrument(skip_all)]
pub async fn check_status(
    State(gateway): State<Arc<dyn PaymentProvider>>,
    Json(request): Json<CheckStatusRequest>,
) -> Result<axum::Json<serde_json::Value>> {
    let order_id = truthy(request.order_id).ok_or(ApiError::MissingField("orderId"))?;
    tracing::info!(%order_id, "Checking transaction status");
    lookup_status(gateway.as_ref(), order_id).await
}

#[instrument(skip_all)]
pub async fn status_by_path(
    State(gateway): State<Arc<dyn PaymentProvider>>,
    Path(order_id): Path<String>,
) -> Result<axum::Json<serde_json::Value>> {
    tracing::info!(%order_id, "Manual transaction status check");
    lookup_status(gateway.as_ref(), serde_json::Value::String(order_id)).await
}

/// Midtrans HTTP notification. The payload is not trusted: the status is
/// fetched again from the Core API before the notification is acknowledged.
#[instrument(skip_all)]
pub async fn notification(
    State(gateway): State<Arc<dyn PaymentProvider>>,
    Json(notification): Json<serde_json::Value>,
) -> Result<axum::Json<MessageResponse>> {
    tracing::info!(data = %mask::secure_value(&notification), "Received notification");
    let payload = serde_json::from_value::<NotificationPayload>(notification).map_err(|e| {
        tracing::warn!("Failed to deserialize notification body: {e}");
        ApiError::provider(NOTIFICATION_FAILED, e)
    })?;
    let text = |field: &Option<serde_json::Value>| match field {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    };
    tracing::info!(
        order_id = %text(&payload.order_id),
        transaction_status = %text(&payload.transaction_status),
        fraud_status = %text(&payload.fraud_status),
        "Transaction notification received"
    );

    let Some(order_id) = truthy(payload.order_id) else {
        tracing::warn!("Notification without order_id");
        return Err(ApiError::provider(NOTIFICATION_FAILED, "notification has no order_id"));
    };
    let order_id = order_id_segment(&order_id);

    match gateway.transaction_status(&order_id).await {
        Ok(status) => {
            tracing::info!(
                %order_id,
                verified_status = status.get("transaction_status").and_then(|s| s.as_str()).unwrap_or_default(),
                data = %mask::secure_value(&status),
                "Verified notification status"
            );
            Ok(axum::Json(MessageResponse {
                message: "notification processed",
            }))
        }
        Err(e) => {
            tracing::error!(%order_id, "Failed to verify notification: {e}");
            Err(ApiError::provider(NOTIFICATION_FAILED, e))
        }
    }
}

pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/", get(health))
        .route("/create-transaction", post(create_transaction))
        .route("/check-status", post(check_status))
        .route("/status/{order_id}", get(status_by_path))
        .route("/notification", post(notification))
}

/// Request bodies accepted by [`Json`], each with the error a malformed body maps to.
pub trait JsonPayload: DeserializeOwned {
    fn rejection() -> ApiError;
}

impl JsonPayload for CreateTransactionRequest {
    fn rejection() -> ApiError {
        ApiError::InvalidPayload
    }
}

impl JsonPayload for CheckStatusRequest {
    fn rejection() -> ApiError {
        ApiError::MissingField("orderId")
    }
}

impl JsonPayload for serde_json::Value {
    fn rejection() -> ApiError {
        ApiError::InvalidPayload
    }
}

/// `Json` extractor wrapper that replaces axum's plaintext rejection with the
/// endpoint's JSON error
pub struct Json<T>(pub T);

impl<S, T> axum::extract::FromRequest<S> for Json<T>
where
    T: JsonPayload + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(
        req: axum::extract::Request,
        state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        let value = match axum::Json::<serde_json::Value>::from_request(req, state).await {
            Ok(axum::Json(value)) => value,
            Err(e) => {
                tracing::debug!("Rejected request body: {e}");
                return Err(T::rejection());
            }
        };
        // Derived deserializers also accept sequences, matching fields by position
        if !value.is_object() {
            tracing::debug!("Rejected request body: not a JSON object");
            return Err(T::rejection());
        }
        serde_json::from_value(value).map(Self).map_err(|e| {
            tracing::debug!("Rejected request body: {e}");
            T::rejection()
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    };

    use axum::{
        body::Body,
        http::{Request, StatusCode, header},
    };
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::gateway::{self, error::GatewayError};

    #[derive(Debug)]
    enum StubStatus {
        Found(Value),
        NotFound,
        Unauthorized,
    }

    #[derive(Debug)]
    struct StubProvider {
        transaction: Option<SnapTransaction>,
        status: StubStatus,
        calls: AtomicUsize,
        last_request: Mutex<Option<Value>>,
        last_order_id: Mutex<Option<String>>,
    }

    impl StubProvider {
        fn build(transaction: Option<SnapTransaction>, status: StubStatus) -> Arc<Self> {
            Arc::new(Self {
                transaction,
                status,
                calls: AtomicUsize::new(0),
                last_request: Mutex::new(None),
                last_order_id: Mutex::new(None),
            })
        }

        fn new(status: StubStatus) -> Arc<Self> {
            let transaction = SnapTransaction {
                token: "tok_abc".into(),
                redirect_url: "https://pay.example/tok_abc".into(),
            };
            Self::build(Some(transaction), status)
        }

        fn settled() -> Arc<Self> {
            Self::new(StubStatus::Found(settlement()))
        }

        fn failing_checkout() -> Arc<Self> {
            Self::build(None, StubStatus::Found(settlement()))
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl PaymentProvider for StubProvider {
        async fn create_transaction(
            &self,
            request: &SnapTransactionRequest,
        ) -> gateway::Result<SnapTransaction> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_request.lock().unwrap() = Some(serde_json::to_value(request).unwrap());
            self.transaction.clone().ok_or_else(|| {
                GatewayError::api(
                    401,
                    &json!({"error_messages": ["Access denied due to unauthorized transaction"]}),
                )
            })
        }

        async fn transaction_status(&self, order_id: &str) -> gateway::Result<Value> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_order_id.lock().unwrap() = Some(order_id.to_string());
            match &self.status {
                StubStatus::Found(status) => Ok(status.clone()),
                StubStatus::NotFound => Err(GatewayError::api(
                    404,
                    &json!({"status_code": "404", "status_message": "Transaction doesn't exist."}),
                )),
                StubStatus::Unauthorized => Err(GatewayError::api(
                    401,
                    &json!({"status_code": "401", "status_message": "Unknown Merchant server_key/id"}),
                )),
            }
        }
    }

    fn settlement() -> Value {
        json!({
            "status_code": "200",
            "status_message": "Success, transaction is found",
            "order_id": "ORDER-1",
            "gross_amount": "10000.00",
            "payment_type": "qris",
            "transaction_time": "2026-10-16 10:00:00",
            "transaction_status": "settlement",
            "fraud_status": "accept"
        })
    }

    fn app(stub: &Arc<StubProvider>) -> axum::Router {
        router().with_state(AppState::new(stub.clone()))
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn send(app: axum::Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn health_is_plaintext() {
        let stub = StubProvider::settled();
        let response = app(&stub).oneshot(get_request("/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], HEALTH_BODY.as_bytes());
        assert_eq!(stub.calls(), 0);
    }

    #[tokio::test]
    async fn create_transaction_returns_token_and_redirect() {
        let stub = StubProvider::settled();
        let (status, body) = send(
            app(&stub),
            post_json(
                "/create-transaction",
                json!({"order_id": "ORDER-1", "gross_amount": 10000, "customer": {"name": "Jane"}}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"token": "tok_abc", "redirect_url": "https://pay.example/tok_abc"})
        );

        let sent = stub.last_request.lock().unwrap().clone().unwrap();
        assert_eq!(sent["transaction_details"], json!({"order_id": "ORDER-1", "gross_amount": 10000}));
        assert_eq!(
            sent["customer_details"],
            json!({"first_name": "Jane", "email": "customer@example.com", "phone": "081234567890"})
        );
        assert_eq!(sent["enabled_payments"].as_array().unwrap().len(), 9);
        assert_eq!(sent["credit_card"], json!({"secure": true, "bank": "bca", "save_card": false}));
    }

    #[tokio::test]
    async fn create_transaction_rejects_incomplete_payload() {
        let stub = StubProvider::settled();
        for body in [
            json!({"gross_amount": 10000, "customer": {"name": "Jane"}}),
            json!({"order_id": "ORDER-1", "customer": {"name": "Jane"}}),
            json!({"order_id": "ORDER-1", "gross_amount": 10000, "customer": {"email": "a@b.c"}}),
            json!({"order_id": "ORDER-1", "gross_amount": 10000}),
        ] {
            let (status, response) = send(app(&stub), post_json("/create-transaction", body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert!(response["message"].is_string());
        }
        assert_eq!(stub.calls(), 0);
    }

    #[tokio::test]
    async fn create_transaction_rejects_malformed_body() {
        let stub = StubProvider::settled();
        let request = Request::builder()
            .method("POST")
            .uri("/create-transaction")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, body) = send(app(&stub), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"message": "incomplete payload"}));
        assert_eq!(stub.calls(), 0);
    }

    #[tokio::test]
    async fn create_transaction_surfaces_provider_error() {
        let stub = StubProvider::failing_checkout();
        let (status, body) = send(
            app(&stub),
            post_json(
                "/create-transaction",
                json!({"order_id": "ORDER-1", "gross_amount": 10000, "customer": {"name": "Jane"}}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "transaction creation failed");
        assert!(
            body["error"]
                .as_str()
                .unwrap()
                .contains("HTTP status code: 401")
        );
    }

    #[tokio::test]
    async fn check_status_passes_provider_object_through() {
        let stub = StubProvider::settled();
        let (status, body) =
            send(app(&stub), post_json("/check-status", json!({"orderId": "ORDER-1"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, settlement());
        assert_eq!(stub.last_order_id.lock().unwrap().as_deref(), Some("ORDER-1"));
    }

    #[tokio::test]
    async fn check_status_requires_order_id() {
        let stub = StubProvider::settled();
        for body in [json!({}), json!({"orderId": ""}), json!({"order_id": "ORDER-1"})] {
            let (status, response) = send(app(&stub), post_json("/check-status", body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(response, json!({"message": "orderId is required"}));
        }
        assert_eq!(stub.calls(), 0);
    }

    #[tokio::test]
    async fn check_status_not_found() {
        let stub = StubProvider::new(StubStatus::NotFound);
        let (status, body) =
            send(app(&stub), post_json("/check-status", json!({"orderId": "ORDER-1"}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(
            body,
            json!({
                "message": "transaction not found",
                "transaction_status": "not_found",
                "order_id": "ORDER-1"
            })
        );
    }

    #[tokio::test]
    async fn check_status_other_failure() {
        let stub = StubProvider::new(StubStatus::Unauthorized);
        let (status, body) =
            send(app(&stub), post_json("/check-status", json!({"orderId": "ORDER-1"}))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "status check failed");
        assert!(body["error"].as_str().unwrap().contains("Unknown Merchant server_key/id"));
    }

    #[tokio::test]
    async fn path_and_body_status_match() {
        for status in [StubStatus::Found(settlement()), StubStatus::NotFound, StubStatus::Unauthorized] {
            let stub = StubProvider::new(status);
            let by_body =
                send(app(&stub), post_json("/check-status", json!({"orderId": "ORDER-1"}))).await;
            let by_path = send(app(&stub), get_request("/status/ORDER-1")).await;
            assert_eq!(by_body, by_path);
        }
    }

    #[tokio::test]
    async fn path_order_id_is_decoded() {
        let stub = StubProvider::settled();
        let (status, _) = send(app(&stub), get_request("/status/ORDER%201")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(stub.last_order_id.lock().unwrap().as_deref(), Some("ORDER 1"));
    }

    #[tokio::test]
    async fn notification_is_acknowledged_after_verification() {
        let stub = StubProvider::settled();
        for transaction_status in ["settlement", "pending", "deny", "settlement"] {
            let (status, body) = send(
                app(&stub),
                post_json(
                    "/notification",
                    json!({
                        "order_id": "ORDER-1",
                        "transaction_status": transaction_status,
                        "fraud_status": "accept",
                        "signature_key": "deadbeef"
                    }),
                ),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body, json!({"message": "notification processed"}));
        }
        assert_eq!(stub.calls(), 4);
        assert_eq!(stub.last_order_id.lock().unwrap().as_deref(), Some("ORDER-1"));
    }

    #[tokio::test]
    async fn notification_fails_when_verification_fails() {
        let stub = StubProvider::new(StubStatus::NotFound);
        let (status, body) = send(
            app(&stub),
            post_json("/notification", json!({"order_id": "ORDER-1", "transaction_status": "settlement"})),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "error processing notification");
        assert!(body["error"].as_str().unwrap().contains("HTTP status code: 404"));
    }

    #[tokio::test]
    async fn notification_without_order_id_fails() {
        let stub = StubProvider::settled();
        let (status, body) =
            send(app(&stub), post_json("/notification", json!({"transaction_status": "settlement"}))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "error processing notification");
        assert_eq!(stub.calls(), 0);
    }

    fn post_raw(uri: &str, body: &'static str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn array_bodies_are_rejected() {
        let stub = StubProvider::settled();
        let cases = [
            ("/create-transaction", json!(["ORDER-1", 10000, ["Jane"]]), "incomplete payload"),
            ("/check-status", json!(["ORDER-1"]), "orderId is required"),
            ("/notification", json!(["ORDER-1", "settlement", "accept"]), "incomplete payload"),
        ];
        for (uri, body, message) in cases {
            let (status, response) = send(app(&stub), post_json(uri, body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(response, json!({ "message": message }), "{uri}");
        }
        assert_eq!(stub.calls(), 0);
    }

    #[tokio::test]
    async fn scalar_bodies_are_rejected() {
        let stub = StubProvider::settled();
        for uri in ["/create-transaction", "/check-status", "/notification"] {
            let (status, _) = send(app(&stub), post_raw(uri, "\"ORDER-1\"")).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        }
        assert_eq!(stub.calls(), 0);
    }

    #[tokio::test]
    async fn check_status_rejects_malformed_body() {
        let stub = StubProvider::settled();
        let (status, body) = send(app(&stub), post_raw("/check-status", "{\"orderId\":")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"message": "orderId is required"}));
        assert_eq!(stub.calls(), 0);
    }

    #[tokio::test]
    async fn notification_rejects_malformed_body() {
        let stub = StubProvider::settled();
        let (status, body) = send(app(&stub), post_raw("/notification", "order_id=ORDER-1")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"message": "incomplete payload"}));
        assert_eq!(stub.calls(), 0);
    }

    #[tokio::test]
    async fn notification_ignores_types_of_logged_fields() {
        let stub = StubProvider::settled();
        let (status, body) = send(
            app(&stub),
            post_json(
                "/notification",
                json!({
                    "order_id": "ORDER-1",
                    "transaction_status": "settlement",
                    "fraud_status": {"x": 1}
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"message": "notification processed"}));
        assert_eq!(stub.calls(), 1);
        assert_eq!(stub.last_order_id.lock().unwrap().as_deref(), Some("ORDER-1"));
    }

    #[tokio::test]
    async fn notification_numeric_order_id_is_verified() {
        let stub = StubProvider::settled();
        let (status, _) = send(
            app(&stub),
            post_json("/notification", json!({"order_id": 1234, "transaction_status": 5})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(stub.last_order_id.lock().unwrap().as_deref(), Some("1234"));
    }
}
