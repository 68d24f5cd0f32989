//! Fire-and-forget email notification.

use std::sync::Arc;

use crate::delivery::webhook::{WebhookDelivery, WebhookError};

/// Records a user's email somewhere outside the service.
///
/// `notify` must return immediately and never fail: delivery happens in the
/// background and its outcome is only logged.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, email: &str);
}

/// Sends emails to the configured webhook, or does nothing when no endpoint
/// is configured.
#[derive(Clone)]
pub struct EmailNotifier {
    endpoint: Option<Arc<str>>,
    delivery: WebhookDelivery,
}

impl EmailNotifier {
    pub fn new(endpoint: Option<String>, delivery: WebhookDelivery) -> Self {
        let endpoint = endpoint
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .map(Arc::from);
        Self { endpoint, delivery }
    }

    /// A notifier with no endpoint.
    pub fn disabled(delivery: WebhookDelivery) -> Self {
        Self::new(None, delivery)
    }

    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    /// Deliver and wait for the outcome. Returns `Ok(())` without sending
    /// anything when disabled.
    pub async fn submit(&self, email: &str) -> Result<(), WebhookError> {
        match &self.endpoint {
            Some(url) => self.delivery.deliver_email(url, email).await,
            None => Ok(()),
        }
    }
}

impl NotificationSink for EmailNotifier {
    fn notify(&self, email: &str) {
        let Some(url) = self.endpoint.clone() else {
            tracing::warn!("NOTIFY_WEBHOOK_URL not set, email not recorded");
            return;
        };

        let delivery = self.delivery.clone();
        let email = email.to_string();
        tokio::spawn(async move {
            match delivery.deliver_email(&url, &email).await {
                Ok(()) => tracing::debug!("Email recorded"),
                Err(e) => tracing::warn!(error = %e, "Email notification failed"),
            }
        });
    }
}
