//! Outbound alert dispatch over a webhook
//!
//! Alerts fire for failed critical-priority tasks and for critical system
//! health. Delivery problems are logged and swallowed; an unreachable
//! webhook must never fail the run that triggered the alert. A per-key
//! cooldown keeps a flapping task or health state from flooding the
//! receiver.

use crate::catalog::{TaskDefinition, TaskPriority};
use crate::constants::alerts::WEBHOOK_TIMEOUT_SECONDS;
use crate::health::SystemHealthSnapshot;
use anyhow::{anyhow, Result};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    TaskFailure,
    HealthCritical,
    WebhookTest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
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
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

pub struct AlertDispatcher {
    webhook_url: String,
    client: reqwest::Client,
    cooldown_minutes: i64,
    recent_alerts: Arc<Mutex<HashMap<String, DateTime<Utc>>>>,
}

impl AlertDispatcher {
    pub fn new(webhook_url: String, cooldown_minutes: i64) -> Self {
        Self {
            webhook_url,
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(WEBHOOK_TIMEOUT_SECONDS))
                .build()
                .expect("Failed to create HTTP client"),
            cooldown_minutes,
            recent_alerts: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.webhook_url.is_empty()
    }

    pub fn webhook_url(&self) -> &str {
        &self.webhook_url
    }

    /// Startup connectivity check; unlike alert delivery this propagates
    /// failures so the caller can log the misconfiguration
    pub async fn test_webhook(&self) -> Result<()> {
        if !self.is_enabled() {
            return Err(anyhow!("No webhook URL configured"));
        }

        let payload = AlertPayload {
            timestamp: Utc::now(),
            alert_type: AlertType::WebhookTest,
            severity: AlertSeverity::Info,
            task_id: None,
            message: "Maintenance engine webhook test".to_string(),
            details: None,
        };

        let response = self
            .client
            .post(&self.webhook_url)
            .json(&payload)
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(anyhow!("Webhook returned status {}", response.status()))
        }
    }

    /// Alert on a failed run of a critical-priority task
    pub async fn alert_task_failure(&self, task: &TaskDefinition, message: &str) -> Result<()> {
        if !self.is_enabled() {
            return Ok(());
        }
        if task.priority != TaskPriority::Critical {
            return Ok(());
        }

        let key = format!("task:{}", task.id);
        if !self.should_send(&key).await {
            info!(
                "Suppressing repeat failure alert for task '{}' (cooldown)",
                task.id
            );
            return Ok(());
        }

        let payload = AlertPayload {
            timestamp: Utc::now(),
            alert_type: AlertType::TaskFailure,
            severity: AlertSeverity::Critical,
            task_id: Some(task.id.clone()),
            message: format!("Critical task '{}' failed: {}", task.name, message),
            details: Some(serde_json::json!({
                "task_name": task.name,
                "category": task.category,
                "priority": task.priority,
            })),
        };

        self.send_webhook(payload).await
    }

    /// Alert when aggregated system health drops to the critical tier
    pub async fn alert_health_critical(&self, snapshot: &SystemHealthSnapshot) -> Result<()> {
        if !self.is_enabled() {
            return Ok(());
        }

        let key = "health:critical".to_string();
        if !self.should_send(&key).await {
            info!("Suppressing repeat critical health alert (cooldown)");
            return Ok(());
        }

        let payload = AlertPayload {
            timestamp: Utc::now(),
            alert_type: AlertType::HealthCritical,
            severity: AlertSeverity::Critical,
            task_id: None,
            message: format!(
                "System health is critical (score {}): {}",
                snapshot.score,
                snapshot.issues.join("; ")
            ),
            details: serde_json::to_value(snapshot).ok(),
        };

        self.send_webhook(payload).await
    }

    /// Cooldown gate; a zero cooldown always sends
    async fn should_send(&self, key: &str) -> bool {
        if self.cooldown_minutes <= 0 {
            return true;
        }

        let mut recent = self.recent_alerts.lock().await;
        let now = Utc::now();
        if let Some(last) = recent.get(key) {
            if now - *last < ChronoDuration::minutes(self.cooldown_minutes) {
                return false;
            }
        }
        recent.insert(key.to_string(), now);
        true
    }

    async fn send_webhook(&self, payload: AlertPayload) -> Result<()> {
        let request = self.client.post(&self.webhook_url).json(&payload).send();

        match timeout(Duration::from_secs(WEBHOOK_TIMEOUT_SECONDS), request).await {
            Ok(Ok(response)) => {
                if response.status().is_success() {
                    info!("Alert webhook delivered ({:?})", payload.alert_type);
                } else {
                    warn!(
                        "Alert webhook returned status {} ({:?})",
                        response.status(),
                        payload.alert_type
                    );
                }
            }
            Ok(Err(e)) => {
                warn!("Alert webhook delivery failed: {}", e);
            }
            Err(_) => {
                warn!("Alert webhook request timed out");
            }
        }

        // Delivery problems never propagate to the triggering run
        Ok(())
    }
}
