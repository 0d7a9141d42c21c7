use crate::constants::http;
use crate::scheduler::NotificationSink;
use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Serialize;
use tokio::time::timeout;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Serialize)]
pub enum AlertType {
    Automation,
    Analysis,
    Sync,
    System,
}

#[derive(Debug, Clone, Serialize)]
pub enum AlertSeverity {
    Critical,
    Warning,
    Info,
}

#[derive(Debug, Clone, Serialize)]
pub struct AlertPayload {
    pub timestamp: DateTime<Utc>,
    pub alert_type: AlertType,
    pub severity: AlertSeverity,
    pub source: String,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

/// Posts alert payloads to a configured webhook. An empty webhook URL
/// disables delivery; callers still get `Ok` so alerting can never take an
/// operation down with it.
#[derive(Clone)]
pub struct AlertService {
    webhook_url: String,
    client: Client,
}

impl AlertService {
    pub fn new(webhook_url: String) -> Self {
        let client = Client::builder()
            .timeout(http::ALERT_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client for AlertService");

        Self {
            webhook_url,
            client,
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.webhook_url.is_empty()
    }

    pub fn get_webhook_url(&self) -> &str {
        &self.webhook_url
    }

    /// Deliver a test payload so a misconfigured webhook shows up at startup
    /// instead of on the first real alert.
    pub async fn test_webhook(&self) -> Result<()> {
        if !self.is_enabled() {
            debug!("No webhook URL configured, skipping webhook test");
            return Ok(());
        }

        let payload = AlertPayload {
            timestamp: Utc::now(),
            alert_type: AlertType::System,
            severity: AlertSeverity::Info,
            source: "monitor".to_string(),
            message: "Monitor started - webhook connectivity test".to_string(),
            details: None,
        };

        self.send_webhook(&payload).await
    }

    pub async fn send_immediate_alert(
        &self,
        alert_type: AlertType,
        severity: AlertSeverity,
        source: &str,
        message: String,
        details: Option<serde_json::Value>,
    ) -> Result<()> {
        let payload = AlertPayload {
            timestamp: Utc::now(),
            alert_type,
            severity,
            source: source.to_string(),
            message,
            details,
        };

        self.send_webhook(&payload).await
    }

    async fn send_webhook(&self, payload: &AlertPayload) -> Result<()> {
        if !self.is_enabled() {
            debug!("No webhook URL configured, skipping alert");
            return Ok(());
        }

        match timeout(
            http::ALERT_TIMEOUT,
            self.client.post(&self.webhook_url).json(payload).send(),
        )
        .await
        {
            Ok(Ok(response)) => {
                if response.status().is_success() {
                    info!(
                        "Alert sent for {}: {:?}",
                        payload.source, payload.alert_type
                    );
                    Ok(())
                } else {
                    warn!(
                        "Alert webhook returned status {} for {}",
                        response.status(),
                        payload.source
                    );
                    Err(anyhow!(
                        "webhook returned status {}",
                        response.status()
                    ))
                }
            }
            Ok(Err(e)) => {
                warn!("Failed to send alert for {}: {}", payload.source, e);
                Err(anyhow!("webhook request failed: {}", e))
            }
            Err(_) => {
                warn!("Alert webhook timeout for {}", payload.source);
                Err(anyhow!("webhook request timed out"))
            }
        }
    }
}

// Scheduler notifications are fire-and-forget: delivery happens on a spawned
// task and failures are only logged.
impl NotificationSink for AlertService {
    fn notify_success(&self, source: &str, message: &str) {
        let service = self.clone();
        let source = source.to_string();
        let message = message.to_string();
        tokio::spawn(async move {
            if let Err(e) = service
                .send_immediate_alert(
                    AlertType::Automation,
                    AlertSeverity::Info,
                    &source,
                    message,
                    None,
                )
                .await
            {
                debug!("Success notification for {} not delivered: {}", source, e);
            }
        });
    }

    fn notify_failure(&self, source: &str, message: &str) {
        let service = self.clone();
        let source = source.to_string();
        let message = message.to_string();
        tokio::spawn(async move {
            if let Err(e) = service
                .send_immediate_alert(
                    AlertType::Automation,
                    AlertSeverity::Critical,
                    &source,
                    message,
                    None,
                )
                .await
            {
                warn!("Failure notification for {} not delivered: {}", source, e);
            }
        });
    }
}
