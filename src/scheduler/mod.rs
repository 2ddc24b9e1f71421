//! Cron-driven task scheduling
//!
//! Registers one scheduler job per task that carries a schedule, pinned
//! to the engine timezone. The enabled flag is checked at firing time by
//! the executor, so toggling a task never requires re-registering jobs.
//! An invalid schedule on any task aborts startup.

pub mod cron;
pub mod sweep;

pub use sweep::{SweepCoordinator, SweepOutcome, SweepReport, SweepStatus};

use crate::catalog::TaskCatalog;
use crate::errors::EngineError;
use crate::executor::TaskExecutor;
use crate::run_guard::RunTrigger;
use anyhow::{Context, Result};
use chrono::Utc;
use chrono_tz::Tz;
use std::sync::Arc;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info, warn};

pub struct MaintenanceScheduler {
    catalog: TaskCatalog,
    executor: Arc<TaskExecutor>,
    timezone: Tz,
    scheduler: JobScheduler,
}

impl MaintenanceScheduler {
    pub async fn new(
        catalog: TaskCatalog,
        executor: Arc<TaskExecutor>,
        timezone: Tz,
    ) -> Result<Self> {
        let scheduler = JobScheduler::new()
            .await
            .context("Failed to create job scheduler")?;

        Ok(Self {
            catalog,
            executor,
            timezone,
            scheduler,
        })
    }

    /// Register every scheduled task and start the scheduler
    pub async fn start(&self) -> Result<()> {
        let tasks = self.catalog.list_tasks().await;
        let mut scheduled = 0;

        for task in tasks {
            let Some(expression) = task.schedule.clone() else {
                continue;
            };

            let normalized = cron::validate_schedule(&expression)
                .with_context(|| format!("Task '{}' has an invalid schedule", task.id))?;

            let task_id = task.id.clone();
            let catalog = self.catalog.clone();
            let executor = self.executor.clone();
            let timezone = self.timezone;
            let job_expression = normalized.clone();

            let job = Job::new_async_tz(normalized.as_str(), timezone, move |_uuid, _scheduler| {
                let task_id = task_id.clone();
                let catalog = catalog.clone();
                let executor = executor.clone();
                let expression = job_expression.clone();
                Box::pin(async move {
                    match executor.run_task(&task_id, RunTrigger::Schedule).await {
                        Ok(result) if result.success => {
                            info!("Scheduled run of '{}' completed", task_id);
                        }
                        Ok(result) => {
                            warn!(
                                "Scheduled run of '{}' failed: {}",
                                task_id, result.message
                            );
                        }
                        Err(EngineError::TaskDisabled { .. }) => {
                            info!("Skipping scheduled run of '{}': task is disabled", task_id);
                        }
                        Err(EngineError::TaskAlreadyRunning { .. }) => {
                            warn!(
                                "Skipping scheduled run of '{}': previous run still active",
                                task_id
                            );
                        }
                        Err(e) => {
                            error!("Scheduled run of '{}' was rejected: {}", task_id, e);
                        }
                    }

                    match cron::next_occurrence(&expression, timezone, Utc::now()) {
                        Ok(next) => catalog.set_next_run(&task_id, next).await,
                        Err(e) => {
                            warn!("Could not compute next run for '{}': {}", task_id, e)
                        }
                    }
                })
            })
            .with_context(|| format!("Failed to create job for task '{}'", task.id))?;

            self.scheduler
                .add(job)
                .await
                .with_context(|| format!("Failed to register job for task '{}'", task.id))?;

            if let Ok(next) = cron::next_occurrence(&normalized, self.timezone, Utc::now()) {
                self.catalog.set_next_run(&task.id, next).await;
            }

            info!(
                "Scheduled task '{}' with '{}' in {}",
                task.id, expression, self.timezone
            );
            scheduled += 1;
        }

        if scheduled > 0 {
            self.scheduler
                .start()
                .await
                .context("Failed to start job scheduler")?;
            info!("Scheduler started with {} jobs", scheduled);
        } else {
            warn!("No scheduled tasks configured, scheduler not started");
        }

        Ok(())
    }
}
