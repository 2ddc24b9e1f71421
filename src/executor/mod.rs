//! Task execution pipeline
//!
//! `run_task` is the single entry point for every trigger (schedule,
//! manual, sweep). Pre-flight rejections (unknown, disabled, already
//! running) return an error and leave no trace in history. Once a run is
//! admitted it always produces exactly one recorded result, whatever
//! happens inside the operation, including panics and timeouts.

pub mod operations;

use crate::alerts::AlertDispatcher;
use crate::catalog::{TaskCatalog, TaskDefinition};
use crate::errors::EngineError;
use crate::history::{HistoryLedger, TaskResult};
use crate::run_guard::{RunGuard, RunTrigger};
use chrono::Utc;
use operations::{OpContext, OperationRegistry, TaskOperation};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{info, warn};
use uuid::Uuid;

pub struct TaskExecutor {
    catalog: TaskCatalog,
    history: HistoryLedger,
    run_guard: RunGuard,
    registry: Arc<OperationRegistry>,
    alerts: Arc<AlertDispatcher>,
}

impl TaskExecutor {
    pub fn new(
        catalog: TaskCatalog,
        history: HistoryLedger,
        run_guard: RunGuard,
        registry: Arc<OperationRegistry>,
        alerts: Arc<AlertDispatcher>,
    ) -> Self {
        Self {
            catalog,
            history,
            run_guard,
            registry,
            alerts,
        }
    }

    /// Execute one task to completion and record the outcome.
    ///
    /// Err means the run was rejected before starting; Ok carries the
    /// recorded result, failed runs included.
    pub async fn run_task(
        &self,
        task_id: &str,
        trigger: RunTrigger,
    ) -> Result<TaskResult, EngineError> {
        let task = self.catalog.get_task(task_id).await?;

        if !task.enabled {
            return Err(EngineError::TaskDisabled { task_id: task.id });
        }

        let run_id = Uuid::new_v4().to_string();
        self.run_guard
            .try_begin(&task.id, &run_id, task.estimated_minutes, trigger)
            .await?;

        info!("Executing task '{}' ({:?}, run {})", task.id, trigger, run_id);
        self.catalog.mark_running(&task.id).await;
        let started = Instant::now();

        let mut ctx = OpContext::new();
        let mut op_result: Result<(), String> = Ok(());

        let mut unmet = None;
        for dependency in &task.depends_on {
            if !self.catalog.dependency_satisfied(dependency).await {
                unmet = Some(dependency.clone());
                break;
            }
        }

        if let Some(dependency) = unmet {
            // Unmet dependencies fail the run without invoking the operation
            let error = EngineError::DependencyUnmet {
                task_id: task.id.clone(),
                dependency,
            };
            ctx.error_line(error.to_string());
            op_result = Err(error.to_string());
        } else {
            match self.registry.resolve(&task) {
                Ok(op) => {
                    let (attempt_ctx, attempt_result) = run_attempt(&task, op.clone()).await;
                    let attempt_failed =
                        attempt_result.is_err() || !attempt_ctx.errors.is_empty();

                    if attempt_failed && task.auto_fix {
                        let reason = attempt_result
                            .clone()
                            .err()
                            .or_else(|| attempt_ctx.errors.first().cloned())
                            .unwrap_or_else(|| "unknown error".to_string());
                        warn!(
                            "Task '{}' failed, retrying automatically: {}",
                            task.id, reason
                        );

                        let (retry_ctx, retry_result) = run_attempt(&task, op).await;
                        ctx = retry_ctx;
                        ctx.warn_line(format!("First attempt failed: {}", reason));
                        if retry_result.is_ok() && ctx.errors.is_empty() {
                            ctx.log("Recovered after automatic retry");
                        }
                        op_result = retry_result;
                    } else {
                        ctx = attempt_ctx;
                        op_result = attempt_result;
                    }
                }
                Err(e) => {
                    let error = EngineError::ExecutionFailure {
                        task_id: task.id.clone(),
                        reason: e.to_string(),
                    };
                    ctx.error_line(error.to_string());
                    op_result = Err(error.to_string());
                }
            }
        }

        let success = op_result.is_ok() && ctx.errors.is_empty();
        let message = if success {
            "Completed successfully".to_string()
        } else {
            match &op_result {
                Err(reason) => reason.clone(),
                Ok(()) => ctx
                    .errors
                    .first()
                    .cloned()
                    .unwrap_or_else(|| "Task reported errors".to_string()),
            }
        };
        if !success && ctx.errors.is_empty() {
            ctx.errors.push(message.clone());
        }

        let finished_at = Utc::now();
        let result = TaskResult {
            run_id,
            task_id: task.id.clone(),
            success,
            message,
            duration_ms: started.elapsed().as_millis() as u64,
            timestamp: finished_at,
            logs: ctx.logs,
            errors: ctx.errors,
            warnings: ctx.warnings,
            payload: ctx.payload,
        };

        self.catalog
            .complete_run(&task.id, success, finished_at)
            .await;
        self.history.add_result(result.clone()).await;
        self.run_guard.finish(&task.id).await;

        if success {
            info!(
                "Task '{}' completed in {}ms",
                task.id, result.duration_ms
            );
        } else {
            warn!("Task '{}' failed: {}", task.id, result.message);
            if let Err(e) = self.alerts.alert_task_failure(&task, &result.message).await {
                warn!("Failed to dispatch task failure alert: {}", e);
            }
        }

        Ok(result)
    }
}

/// Run one operation attempt inside its own task so a panic or timeout
/// cannot take the engine down with it
async fn run_attempt(
    task: &TaskDefinition,
    op: Arc<dyn TaskOperation>,
) -> (OpContext, Result<(), String>) {
    let task_clone = task.clone();
    let handle = tokio::spawn(async move {
        let mut ctx = OpContext::new();
        let result = op.run(&task_clone, &mut ctx).await;
        (ctx, result.map_err(|e| e.to_string()))
    });

    let joined = match task.timeout_minutes {
        Some(minutes) => {
            let abort = handle.abort_handle();
            match timeout(Duration::from_secs(minutes * 60), handle).await {
                Ok(joined) => joined,
                Err(_) => {
                    abort.abort();
                    let reason = format!("Task exceeded its {}m time limit", minutes);
                    let mut ctx = OpContext::new();
                    ctx.error_line(reason.clone());
                    return (ctx, Err(reason));
                }
            }
        }
        None => handle.await,
    };

    match joined {
        Ok((ctx, result)) => (ctx, result),
        Err(e) => {
            let reason = if e.is_panic() {
                "Task panicked during execution".to_string()
            } else {
                format!("Task was aborted: {}", e)
            };
            let mut ctx = OpContext::new();
            ctx.error_line(reason.clone());
            (ctx, Err(reason))
        }
    }
}
