//! Single-shot JSON webhook delivery.
//!
//! [`WebhookDelivery`] POSTs a JSON payload to an external URL. There is no
//! retry: a failed attempt is reported to the caller, who decides whether
//! anything beyond logging is worth doing.

use std::time::Duration;

/// HTTP request timeout for a single delivery attempt.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for webhook delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The remote server returned a non-2xx status code.
    #[error("Webhook returned HTTP {0}")]
    HttpStatus(u16),
}

// ---------------------------------------------------------------------------
// WebhookDelivery
// ---------------------------------------------------------------------------

/// Posts JSON payloads to webhook endpoints.
#[derive(Clone)]
pub struct WebhookDelivery {
    client: reqwest::Client,
}

impl WebhookDelivery {
    /// Create a delivery service whose client enforces [`REQUEST_TIMEOUT`].
    pub fn new() -> Result<Self, WebhookError> {
        Self::with_timeout(REQUEST_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, WebhookError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    /// Submit an email address as `{"email": "..."}`.
    pub async fn deliver_email(&self, url: &str, email: &str) -> Result<(), WebhookError> {
        self.deliver(url, &serde_json::json!({ "email": email }))
            .await
    }

    /// Execute a single POST request and check the response status. The
    /// response body is not read.
    pub async fn deliver(&self, url: &str, payload: &serde_json::Value) -> Result<(), WebhookError> {
        let response = self.client.post(url).json(payload).send().await?;
        if !response.status().is_success() {
            return Err(WebhookError::HttpStatus(response.status().as_u16()));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
