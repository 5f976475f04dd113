//! End-of-run alerting over a Slack-style incoming webhook.
//!
//! Delivery is fire-and-forget: an unset webhook or a failed send is logged
//! at warn and never fails the pipeline.

use async_trait::async_trait;
use serde_json::json;
use tracing::{info, warn};

/// Severity of an end-of-run notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Error,
}

/// Alerting channel seam. One notification per pipeline run.
#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn notify(&self, message: &str, severity: Severity);
}

pub struct WebhookNotifier {
    http: reqwest::Client,
    webhook_url: Option<String>,
}

impl WebhookNotifier {
    pub fn new(http: reqwest::Client, webhook_url: Option<String>) -> Self {
        let webhook_url = webhook_url.filter(|raw| match url::Url::parse(raw) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => true,
            _ => {
                warn!("alert webhook url is not a valid http(s) url; alerts disabled");
                false
            }
        });
        Self { http, webhook_url }
    }
}

#[async_trait]
impl AlertSink for WebhookNotifier {
    async fn notify(&self, message: &str, severity: Severity) {
        let Some(url) = &self.webhook_url else {
            warn!("alert webhook not configured; skipping notification");
            return;
        };

        let (emoji, color) = match severity {
            Severity::Info => (":white_check_mark:", "#36A64F"),
            Severity::Error => (":x:", "#E01E5A"),
        };
        let payload = json!({
            "attachments": [{
                "color": color,
                "blocks": [{
                    "type": "section",
                    "text": {
                        "type": "mrkdwn",
                        "text": format!("{emoji} *Ad Performance Weekly Report*\n{message}"),
                    }
                }]
            }]
        });

        match self.http.post(url).json(&payload).send().await {
            Ok(response) if response.status().is_success() => {
                info!("alert notification delivered");
            }
            Ok(response) => {
                warn!(status = %response.status(), "alert notification rejected");
            }
            Err(e) => {
                warn!(error = %e, "alert notification failed");
            }
        }
    }
}
