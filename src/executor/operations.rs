//! Task operation bodies and the registry binding them to definitions
//!
//! A task definition carries either a shell command, executed by the
//! generic `ShellOperation`, or the name of a built-in operation. Built-ins
//! run inside the engine process; the only one shipped today is the
//! system health check.

use crate::alerts::AlertDispatcher;
use crate::catalog::TaskDefinition;
use crate::health::{HealthAggregator, HealthTier};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::process::Command;
use tracing::warn;

/// Collected output of a single operation attempt
#[derive(Debug, Default)]
pub struct OpContext {
    pub logs: Vec<String>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
    pub payload: Option<serde_json::Value>,
}

impl OpContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&mut self, line: impl Into<String>) {
        self.logs.push(line.into());
    }

    pub fn warn_line(&mut self, line: impl Into<String>) {
        self.warnings.push(line.into());
    }

    pub fn error_line(&mut self, line: impl Into<String>) {
        self.errors.push(line.into());
    }
}

/// The body of a maintenance task.
///
/// Returning Err or recording any error line marks the run as failed;
/// both outcomes still produce a history entry.
#[async_trait]
pub trait TaskOperation: Send + Sync {
    async fn run(&self, task: &TaskDefinition, ctx: &mut OpContext) -> Result<()>;
}

impl std::fmt::Debug for dyn TaskOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("TaskOperation")
    }
}

/// Runs the task's configured shell command via `sh -c`
pub struct ShellOperation;

#[async_trait]
impl TaskOperation for ShellOperation {
    async fn run(&self, task: &TaskDefinition, ctx: &mut OpContext) -> Result<()> {
        let command = task
            .command
            .as_deref()
            .ok_or_else(|| anyhow!("Task '{}' has no command", task.id))?;

        ctx.log(format!("Running: {}", command));

        let output = Command::new("sh")
            .arg("-c")
            .arg(command)
            .output()
            .await
            .context("Failed to spawn shell")?;

        for line in String::from_utf8_lossy(&output.stdout).lines() {
            ctx.log(line.to_string());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        if output.status.success() {
            // stderr chatter from a successful command is kept as warnings
            for line in stderr.lines() {
                ctx.warn_line(line.to_string());
            }
            Ok(())
        } else {
            for line in stderr.lines() {
                ctx.error_line(line.to_string());
            }
            Err(anyhow!("Command exited with {}", output.status))
        }
    }
}

/// Built-in system health check.
///
/// The run itself succeeds whatever the health verdict; findings land in
/// the result as warnings and the full snapshot as the payload. A critical
/// tier additionally raises a health alert.
pub struct HealthCheckOperation {
    aggregator: Arc<HealthAggregator>,
    alerts: Arc<AlertDispatcher>,
}

impl HealthCheckOperation {
    pub fn new(aggregator: Arc<HealthAggregator>, alerts: Arc<AlertDispatcher>) -> Self {
        Self { aggregator, alerts }
    }
}

#[async_trait]
impl TaskOperation for HealthCheckOperation {
    async fn run(&self, _task: &TaskDefinition, ctx: &mut OpContext) -> Result<()> {
        let snapshot = self.aggregator.check_system().await;

        ctx.log(format!(
            "System health score {} ({:?})",
            snapshot.score, snapshot.tier
        ));
        for issue in &snapshot.issues {
            ctx.warn_line(issue.clone());
        }
        for recommendation in &snapshot.recommendations {
            ctx.log(format!("Recommended: {}", recommendation));
        }
        ctx.payload = serde_json::to_value(&snapshot).ok();

        if snapshot.tier == HealthTier::Critical {
            if let Err(e) = self.alerts.alert_health_critical(&snapshot).await {
                warn!("Failed to dispatch critical health alert: {}", e);
            }
        }

        Ok(())
    }
}

/// Maps task definitions to their operation implementations
pub struct OperationRegistry {
    shell: Arc<ShellOperation>,
    builtins: HashMap<String, Arc<dyn TaskOperation>>,
}

impl OperationRegistry {
    /// Registry with the standard built-ins wired up
    pub fn standard(aggregator: Arc<HealthAggregator>, alerts: Arc<AlertDispatcher>) -> Self {
        let mut registry = Self::empty();
        registry.register(
            "health-check",
            Arc::new(HealthCheckOperation::new(aggregator, alerts)),
        );
        registry
    }

    pub fn empty() -> Self {
        Self {
            shell: Arc::new(ShellOperation),
            builtins: HashMap::new(),
        }
    }

    pub fn register(&mut self, name: &str, operation: Arc<dyn TaskOperation>) {
        self.builtins.insert(name.to_string(), operation);
    }

    pub fn resolve(&self, task: &TaskDefinition) -> Result<Arc<dyn TaskOperation>> {
        if let Some(builtin) = &task.builtin {
            self.builtins
                .get(builtin)
                .cloned()
                .ok_or_else(|| anyhow!("Unknown builtin operation '{}'", builtin))
        } else if task.command.is_some() {
            Ok(self.shell.clone())
        } else {
            Err(anyhow!("Task '{}' has no operation body", task.id))
        }
    }

    /// Startup check that every builtin reference resolves
    pub fn validate(&self, task: &TaskDefinition) -> Result<()> {
        self.resolve(task).map(|_| ())
    }
}
