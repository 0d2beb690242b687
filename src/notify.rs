//! Fire-and-forget alert webhook.
//!
//! Posts a Slack-style payload for outcomes worth waking someone up for.
//! Delivery failure is logged and dropped; alerting must never change a
//! search outcome.

use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};

const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(5);

pub struct Notifier {
    webhook_url: Option<String>,
    client: reqwest::Client,
}

impl Notifier {
    pub fn new(webhook_url: Option<String>) -> Self {
        Notifier {
            webhook_url,
            client: reqwest::Client::new(),
        }
    }

    /// Send an alert if a webhook is configured; swallow every failure.
    pub async fn alert(&self, message: &str) {
        let Some(url) = &self.webhook_url else {
            debug!("No alert webhook configured, dropping: {}", message);
            return;
        };

        let payload = json!({
            "text": message,
            "username": "lensprobe",
        });

        let result = self
            .client
            .post(url)
            .timeout(WEBHOOK_TIMEOUT)
            .json(&payload)
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                debug!("Alert delivered");
            }
            Ok(response) => {
                warn!("Alert webhook returned status {}", response.status());
            }
            Err(e) => {
                warn!("Alert webhook failed: {}", e);
            }
        }
    }
}
