//! In-memory run history with a bounded window per task
//!
//! The ledger keeps the most recent results for each task and evicts the
//! oldest entry once the window is full. An optional sink receives every
//! result for durable storage; sink failures are logged and never block
//! the in-memory record.

use crate::constants::history::MAX_RESULTS_PER_TASK;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::warn;

/// Outcome of a single task run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResult {
    pub run_id: String,
    pub task_id: String,
    pub success: bool,
    pub message: String,
    pub duration_ms: u64,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub logs: Vec<String>,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
    /// Structured output from built-in operations (e.g. a health snapshot)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

/// Durable destination for task results
#[async_trait]
pub trait ResultSink: Send + Sync {
    async fn record(&self, result: &TaskResult) -> anyhow::Result<()>;
}

pub struct HistoryLedger {
    results: Arc<RwLock<HashMap<String, VecDeque<TaskResult>>>>,
    sink: Option<Arc<dyn ResultSink>>,
}

impl HistoryLedger {
    pub fn new() -> Self {
        Self {
            results: Arc::new(RwLock::new(HashMap::new())),
            sink: None,
        }
    }

    pub fn with_sink(sink: Arc<dyn ResultSink>) -> Self {
        Self {
            results: Arc::new(RwLock::new(HashMap::new())),
            sink: Some(sink),
        }
    }

    /// Append a result, evicting the oldest entries past the window cap
    pub async fn add_result(&self, result: TaskResult) {
        {
            let mut results = self.results.write().await;
            let window = results.entry(result.task_id.clone()).or_default();
            window.push_back(result.clone());
            while window.len() > MAX_RESULTS_PER_TASK {
                window.pop_front();
            }
        }

        if let Some(sink) = &self.sink {
            if let Err(e) = sink.record(&result).await {
                warn!(
                    "Failed to persist result {} for task '{}': {}",
                    result.run_id, result.task_id, e
                );
            }
        }
    }

    /// Results for one task, oldest first
    pub async fn get_results(&self, task_id: &str) -> Vec<TaskResult> {
        let results = self.results.read().await;
        results
            .get(task_id)
            .map(|window| window.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Every task's retained results, keyed by task id, oldest first per task
    pub async fn get_all_results(&self) -> HashMap<String, Vec<TaskResult>> {
        let results = self.results.read().await;
        results
            .iter()
            .map(|(task_id, window)| (task_id.clone(), window.iter().cloned().collect()))
            .collect()
    }
}

impl Default for HistoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for HistoryLedger {
    fn clone(&self) -> Self {
        Self {
            results: self.results.clone(),
            sink: self.sink.clone(),
        }
    }
}
