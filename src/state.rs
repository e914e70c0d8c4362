use std::sync::Arc;

use crate::gateway::PaymentProvider;

#[derive(Debug, Clone, axum::extract::FromRef)]
pub struct AppState {
    pub gateway: Arc<dyn PaymentProvider>,
}

impl AppState {
    pub fn new(gateway: Arc<dyn PaymentProvider>) -> Self {
        Self { gateway }
    }
}
