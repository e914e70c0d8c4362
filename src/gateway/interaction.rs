use std::time::Instant;

/// Timing and outcome of a single round trip to Midtrans.
#[derive(Debug)]
pub struct ProviderCall {
    kind: &'static str,
    url: String,
    created: Instant,
    response_status: Option<u16>,
}

impl ProviderCall {
    pub fn enter(kind: &'static str, url: impl Into<String>) -> Self {
        Self {
            kind,
            url: url.into(),
            created: Instant::now(),
            response_status: None,
        }
    }

    pub fn set_response_status(&mut self, status: u16) {
        self.response_status = Some(status);
    }

    pub fn finish(self) {
        let duration_ms = u64::try_from(self.created.elapsed().as_millis()).unwrap_or(u64::MAX);
        match self.response_status {
            Some(status) => tracing::info!(
                kind = self.kind,
                url = %self.url,
                status,
                duration_ms,
                "Midtrans call finished"
            ),
            None => tracing::warn!(
                kind = self.kind,
                url = %self.url,
                duration_ms,
                "Midtrans call finished without a response"
            ),
        }
    }
}
