//! Per-task run guard enforcing mutual exclusion
//!
//! Each task may have at most one run in flight. The guard tracks active
//! runs keyed by task id and flags runs that exceed their expected
//! duration by a wide margin.

use crate::constants::runs::OVERDUE_MULTIPLIER;
use crate::errors::EngineError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunTrigger {
    Schedule,
    Manual,
    Sweep,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActiveRun {
    pub task_id: String,
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub estimated_minutes: u32,
    pub trigger: RunTrigger,
}

impl ActiveRun {
    pub fn running_for_minutes(&self) -> i64 {
        (Utc::now() - self.started_at).num_minutes()
    }

    /// A run is overdue once it exceeds a multiple of its estimate
    pub fn is_overdue(&self) -> bool {
        let limit = (self.estimated_minutes * OVERDUE_MULTIPLIER) as i64;
        self.running_for_minutes() > limit
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunGuardStatus {
    pub active: Vec<ActiveRun>,
    pub overdue: Vec<ActiveRun>,
    pub total_active: usize,
}

#[derive(Clone)]
pub struct RunGuard {
    active: Arc<RwLock<HashMap<String, ActiveRun>>>,
}

impl RunGuard {
    pub fn new() -> Self {
        Self {
            active: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Claim the run slot for a task, rejecting if one is already held
    pub async fn try_begin(
        &self,
        task_id: &str,
        run_id: &str,
        estimated_minutes: u32,
        trigger: RunTrigger,
    ) -> Result<(), EngineError> {
        let mut active = self.active.write().await;

        if let Some(existing) = active.get(task_id) {
            return Err(EngineError::TaskAlreadyRunning {
                task_id: task_id.to_string(),
                running_for_minutes: existing.running_for_minutes(),
            });
        }

        active.insert(
            task_id.to_string(),
            ActiveRun {
                task_id: task_id.to_string(),
                run_id: run_id.to_string(),
                started_at: Utc::now(),
                estimated_minutes,
                trigger,
            },
        );

        info!("Started run {} for task '{}'", run_id, task_id);
        Ok(())
    }

    /// Release the run slot; safe to call for a task with no active run
    pub async fn finish(&self, task_id: &str) {
        let mut active = self.active.write().await;
        if let Some(run) = active.remove(task_id) {
            info!(
                "Finished run {} for task '{}' after {}m",
                run.run_id,
                task_id,
                run.running_for_minutes()
            );
        }
    }

    pub async fn is_running(&self, task_id: &str) -> bool {
        let active = self.active.read().await;
        active.contains_key(task_id)
    }

    pub async fn active_runs(&self) -> Vec<ActiveRun> {
        let active = self.active.read().await;
        active.values().cloned().collect()
    }

    pub async fn overdue_runs(&self) -> Vec<ActiveRun> {
        let active = self.active.read().await;
        active.values().filter(|r| r.is_overdue()).cloned().collect()
    }

    pub async fn snapshot(&self) -> RunGuardStatus {
        let active = self.active_runs().await;
        let overdue = active.iter().filter(|r| r.is_overdue()).cloned().collect();
        let total_active = active.len();
        RunGuardStatus {
            active,
            overdue,
            total_active,
        }
    }
}

impl Default for RunGuard {
    fn default() -> Self {
        Self::new()
    }
}
