//! Task catalog: the fixed registry of maintenance task definitions
//!
//! Definitions are seeded once at startup from the task configuration files.
//! The only runtime mutation is the enable/disable toggle; tasks are never
//! created or deleted while the engine is running. The catalog also owns the
//! per-task runtime state (status, last run, next scheduled run).

use crate::errors::EngineError;
use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskCategory {
    Cleanup,
    Update,
    Optimization,
    Security,
    Backup,
    Monitoring,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Disabled,
}

/// A maintenance task definition as loaded from `config/tasks.d/*.toml`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskDefinition {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category: TaskCategory,
    pub priority: TaskPriority,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Cron expression (5 or 6 fields); tasks without one only run manually
    pub schedule: Option<String>,
    #[serde(default = "default_estimated_minutes")]
    pub estimated_minutes: u32,
    #[serde(default)]
    pub depends_on: Vec<String>,
    /// Retry the operation once automatically when the first attempt fails
    #[serde(default)]
    pub auto_fix: bool,
    #[serde(default)]
    pub rollback_supported: bool,
    /// Shell command executed by the generic runner
    pub command: Option<String>,
    /// Name of a built-in operation (e.g. "health-check")
    pub builtin: Option<String>,
    /// Hard wall-clock limit; expiry records the run as failed
    pub timeout_minutes: Option<u64>,
}

fn default_enabled() -> bool {
    true
}

fn default_estimated_minutes() -> u32 {
    10
}

#[derive(Debug, Clone, Serialize)]
pub struct TaskRuntimeState {
    pub status: TaskStatus,
    pub last_run: Option<DateTime<Utc>>,
    pub next_run: Option<DateTime<Utc>>,
}

/// Definition plus runtime state, the shape served over the API
#[derive(Debug, Clone, Serialize)]
pub struct TaskOverview {
    #[serde(flatten)]
    pub definition: TaskDefinition,
    pub status: TaskStatus,
    pub last_run: Option<DateTime<Utc>>,
    pub next_run: Option<DateTime<Utc>>,
}

#[derive(Debug)]
pub struct TaskCatalog {
    // Seed order is preserved; list_tasks and sweeps iterate in this order
    tasks: Arc<RwLock<Vec<TaskDefinition>>>,
    runtime: Arc<RwLock<HashMap<String, TaskRuntimeState>>>,
}

impl TaskCatalog {
    /// Build the catalog from validated definitions.
    ///
    /// Duplicate ids, missing operation bodies and dangling dependency
    /// references are startup errors.
    pub fn new(definitions: Vec<TaskDefinition>) -> Result<Self> {
        let ids: HashSet<&str> = definitions.iter().map(|t| t.id.as_str()).collect();
        if ids.len() != definitions.len() {
            let mut seen = HashSet::new();
            for task in &definitions {
                if !seen.insert(task.id.as_str()) {
                    return Err(anyhow!("Duplicate task id '{}'", task.id));
                }
            }
        }

        for task in &definitions {
            if task.id.trim().is_empty() {
                return Err(anyhow!("Task with empty id in catalog"));
            }
            match (&task.command, &task.builtin) {
                (None, None) => {
                    return Err(anyhow!(
                        "Task '{}' has neither a command nor a builtin operation",
                        task.id
                    ));
                }
                (Some(_), Some(_)) => {
                    return Err(anyhow!(
                        "Task '{}' declares both a command and a builtin operation",
                        task.id
                    ));
                }
                _ => {}
            }
            for dep in &task.depends_on {
                if dep == &task.id {
                    return Err(anyhow!("Task '{}' depends on itself", task.id));
                }
                if !ids.contains(dep.as_str()) {
                    return Err(anyhow!(
                        "Task '{}' depends on unknown task '{}'",
                        task.id,
                        dep
                    ));
                }
            }
        }

        let runtime = definitions
            .iter()
            .map(|task| {
                let status = if task.enabled {
                    TaskStatus::Pending
                } else {
                    TaskStatus::Disabled
                };
                (
                    task.id.clone(),
                    TaskRuntimeState {
                        status,
                        last_run: None,
                        next_run: None,
                    },
                )
            })
            .collect();

        Ok(Self {
            tasks: Arc::new(RwLock::new(definitions)),
            runtime: Arc::new(RwLock::new(runtime)),
        })
    }

    pub async fn list_tasks(&self) -> Vec<TaskDefinition> {
        let tasks = self.tasks.read().await;
        tasks.clone()
    }

    pub async fn get_task(&self, task_id: &str) -> Result<TaskDefinition, EngineError> {
        let tasks = self.tasks.read().await;
        tasks
            .iter()
            .find(|t| t.id == task_id)
            .cloned()
            .ok_or_else(|| EngineError::TaskNotFound {
                task_id: task_id.to_string(),
            })
    }

    pub async fn contains(&self, task_id: &str) -> bool {
        let tasks = self.tasks.read().await;
        tasks.iter().any(|t| t.id == task_id)
    }

    /// Flip the enabled flag and synchronize runtime status.
    ///
    /// Toggling to the current value is a no-op. Disabling does not interrupt
    /// an in-flight run; the status becomes Disabled immediately and future
    /// firings are skipped.
    pub async fn toggle_task(
        &self,
        task_id: &str,
        enabled: bool,
    ) -> Result<TaskDefinition, EngineError> {
        let mut tasks = self.tasks.write().await;
        let task = tasks
            .iter_mut()
            .find(|t| t.id == task_id)
            .ok_or_else(|| EngineError::TaskNotFound {
                task_id: task_id.to_string(),
            })?;

        if task.enabled == enabled {
            return Ok(task.clone());
        }

        task.enabled = enabled;
        let updated = task.clone();
        drop(tasks);

        let mut runtime = self.runtime.write().await;
        if let Some(state) = runtime.get_mut(task_id) {
            state.status = if enabled {
                TaskStatus::Pending
            } else {
                TaskStatus::Disabled
            };
        }

        info!(
            "Task '{}' {}",
            task_id,
            if enabled { "enabled" } else { "disabled" }
        );
        Ok(updated)
    }

    pub async fn runtime_state(&self, task_id: &str) -> Option<TaskRuntimeState> {
        let runtime = self.runtime.read().await;
        runtime.get(task_id).cloned()
    }

    /// True when the dependency's current status is Completed
    pub async fn dependency_satisfied(&self, dependency_id: &str) -> bool {
        let runtime = self.runtime.read().await;
        runtime
            .get(dependency_id)
            .map(|state| state.status == TaskStatus::Completed)
            .unwrap_or(false)
    }

    pub async fn mark_running(&self, task_id: &str) {
        let mut runtime = self.runtime.write().await;
        if let Some(state) = runtime.get_mut(task_id) {
            state.status = TaskStatus::Running;
        }
    }

    /// Record the outcome of a finished run.
    ///
    /// `last_run` is always set to the completion timestamp. A task disabled
    /// while it was running keeps the Disabled status; the enabled flag is
    /// authoritative for the status invariant.
    pub async fn complete_run(&self, task_id: &str, success: bool, finished_at: DateTime<Utc>) {
        let still_enabled = {
            let tasks = self.tasks.read().await;
            tasks
                .iter()
                .find(|t| t.id == task_id)
                .map(|t| t.enabled)
                .unwrap_or(false)
        };

        let mut runtime = self.runtime.write().await;
        if let Some(state) = runtime.get_mut(task_id) {
            state.last_run = Some(finished_at);
            state.status = if !still_enabled {
                TaskStatus::Disabled
            } else if success {
                TaskStatus::Completed
            } else {
                TaskStatus::Failed
            };
        }
    }

    pub async fn set_next_run(&self, task_id: &str, next_run: Option<DateTime<Utc>>) {
        let mut runtime = self.runtime.write().await;
        if let Some(state) = runtime.get_mut(task_id) {
            state.next_run = next_run;
        }
    }

    pub async fn overview(&self) -> Vec<TaskOverview> {
        let tasks = self.tasks.read().await;
        let runtime = self.runtime.read().await;

        tasks
            .iter()
            .map(|task| {
                let state = runtime.get(&task.id);
                TaskOverview {
                    definition: task.clone(),
                    status: state.map(|s| s.status).unwrap_or(TaskStatus::Pending),
                    last_run: state.and_then(|s| s.last_run),
                    next_run: state.and_then(|s| s.next_run),
                }
            })
            .collect()
    }

    pub async fn get_overview(&self, task_id: &str) -> Result<TaskOverview, EngineError> {
        let definition = self.get_task(task_id).await?;
        let state = self.runtime_state(task_id).await;
        Ok(TaskOverview {
            definition,
            status: state
                .as_ref()
                .map(|s| s.status)
                .unwrap_or(TaskStatus::Pending),
            last_run: state.as_ref().and_then(|s| s.last_run),
            next_run: state.and_then(|s| s.next_run),
        })
    }
}

impl Clone for TaskCatalog {
    fn clone(&self) -> Self {
        Self {
            tasks: self.tasks.clone(),
            runtime: self.runtime.clone(),
        }
    }
}
