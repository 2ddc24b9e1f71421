//! Mock webhook server for testing alert delivery
//!
//! Simulates the alert receiver, capturing every payload so tests can
//! verify what was sent (or that nothing was).

use serde_json::Value;
use std::sync::{Arc, Mutex};
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, Request, ResponseTemplate,
};

pub struct MockWebhookServer {
    server: MockServer,
    captured: Arc<Mutex<Vec<Value>>>,
}

impl MockWebhookServer {
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        Self {
            server,
            captured: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Accept deliveries with 200 and capture each body
    pub async fn mock_success(&self) {
        let captured = self.captured.clone();

        Mock::given(method("POST"))
            .and(path("/webhook"))
            .respond_with(move |req: &Request| {
                if let Ok(body) = req.body_json::<Value>() {
                    captured.lock().unwrap().push(body);
                }
                ResponseTemplate::new(200)
            })
            .mount(&self.server)
            .await;
    }

    /// Reject every delivery with the given status
    pub async fn mock_failure(&self, status_code: u16) {
        let captured = self.captured.clone();

        Mock::given(method("POST"))
            .and(path("/webhook"))
            .respond_with(move |req: &Request| {
                if let Ok(body) = req.body_json::<Value>() {
                    captured.lock().unwrap().push(body);
                }
                ResponseTemplate::new(status_code)
            })
            .mount(&self.server)
            .await;
    }

    pub fn webhook_url(&self) -> String {
        format!("{}/webhook", self.server.uri())
    }

    pub fn captured_bodies(&self) -> Vec<Value> {
        self.captured.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.captured.lock().unwrap().len()
    }

    /// True when some captured alert names this task
    pub fn alert_sent_for_task(&self, task_id: &str) -> bool {
        self.captured_bodies().iter().any(|body| {
            body.get("task_id").and_then(|v| v.as_str()) == Some(task_id)
        })
    }

    /// True when some captured alert has this alert_type
    pub fn alert_of_type(&self, alert_type: &str) -> bool {
        self.captured_bodies().iter().any(|body| {
            body.get("alert_type").and_then(|v| v.as_str()) == Some(alert_type)
        })
    }
}
