//! Full-catalog sweep
//!
//! Runs every enabled task once, sequentially in catalog order. Disabled
//! tasks are counted as skipped, as are tasks whose run slot is taken.
//! At most one sweep may be in flight at a time.

use crate::catalog::TaskCatalog;
use crate::errors::EngineError;
use crate::executor::TaskExecutor;
use crate::run_guard::RunTrigger;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SweepStatus {
    Succeeded,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, Serialize)]
pub struct SweepOutcome {
    pub task_id: String,
    pub status: SweepStatus,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SweepReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub outcomes: Vec<SweepOutcome>,
}

pub struct SweepCoordinator {
    catalog: TaskCatalog,
    executor: Arc<TaskExecutor>,
    running: AtomicBool,
}

impl SweepCoordinator {
    pub fn new(catalog: TaskCatalog, executor: Arc<TaskExecutor>) -> Self {
        Self {
            catalog,
            executor,
            running: AtomicBool::new(false),
        }
    }

    /// Run the whole catalog once; a second sweep while one is active is
    /// rejected
    pub async fn run_all(&self) -> Result<SweepReport, EngineError> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(EngineError::SweepAlreadyRunning);
        }

        let report = self.execute_sweep().await;
        self.running.store(false, Ordering::SeqCst);

        info!(
            "Sweep finished: {} succeeded, {} failed, {} skipped",
            report.succeeded, report.failed, report.skipped
        );
        Ok(report)
    }

    async fn execute_sweep(&self) -> SweepReport {
        let started_at = Utc::now();
        let tasks = self.catalog.list_tasks().await;
        let mut outcomes = Vec::with_capacity(tasks.len());

        info!("Starting full sweep of {} tasks", tasks.len());

        for task in &tasks {
            if !task.enabled {
                outcomes.push(SweepOutcome {
                    task_id: task.id.clone(),
                    status: SweepStatus::Skipped,
                    message: "Task is disabled".to_string(),
                });
                continue;
            }

            match self.executor.run_task(&task.id, RunTrigger::Sweep).await {
                Ok(result) if result.success => outcomes.push(SweepOutcome {
                    task_id: task.id.clone(),
                    status: SweepStatus::Succeeded,
                    message: result.message,
                }),
                Ok(result) => outcomes.push(SweepOutcome {
                    task_id: task.id.clone(),
                    status: SweepStatus::Failed,
                    message: result.message,
                }),
                Err(e @ EngineError::TaskAlreadyRunning { .. })
                | Err(e @ EngineError::TaskDisabled { .. }) => {
                    outcomes.push(SweepOutcome {
                        task_id: task.id.clone(),
                        status: SweepStatus::Skipped,
                        message: e.to_string(),
                    });
                }
                Err(e) => {
                    warn!("Sweep could not run task '{}': {}", task.id, e);
                    outcomes.push(SweepOutcome {
                        task_id: task.id.clone(),
                        status: SweepStatus::Failed,
                        message: e.to_string(),
                    });
                }
            }
        }

        let succeeded = outcomes
            .iter()
            .filter(|o| o.status == SweepStatus::Succeeded)
            .count();
        let failed = outcomes
            .iter()
            .filter(|o| o.status == SweepStatus::Failed)
            .count();
        let skipped = outcomes
            .iter()
            .filter(|o| o.status == SweepStatus::Skipped)
            .count();

        SweepReport {
            started_at,
            finished_at: Utc::now(),
            total: outcomes.len(),
            succeeded,
            failed,
            skipped,
            outcomes,
        }
    }
}
